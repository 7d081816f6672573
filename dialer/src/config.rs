//! Dialer-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Dialer ohne Konfigurationsdatei
//! lauffaehig ist.

use fernruf_audio::{BrueckenConfig, PufferConfig};
use fernruf_session::SupervisorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vollstaendige Dialer-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DialerConfig {
    /// Serielle Verbindung zum Modem
    pub seriell: SerielleEinstellungen,
    /// Host-Audio und Wiedergabepuffer
    pub audio: AudioEinstellungen,
    /// Anruf-Parameter (Daempfung, Ruhezeiten)
    pub anruf: AnrufEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Serielle Verbindung zum Modem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerielleEinstellungen {
    /// Baudrate beider Leitungen
    pub baud: u32,
    /// Expliziter Kommando-Port (None = USB-Suche nach dem Modem)
    pub kommando_port: Option<String>,
    /// Expliziter Audio-Port (None = USB-Suche nach dem Modem)
    pub audio_port: Option<String>,
}

impl Default for SerielleEinstellungen {
    fn default() -> Self {
        Self {
            baud: 115_200,
            kommando_port: None,
            audio_port: None,
        }
    }
}

/// Host-Audio und Wiedergabepuffer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEinstellungen {
    /// Abtastrate des Modem-PCM in Hz
    pub sample_rate: u32,
    /// Stueckgroesse der Senderichtung in Millisekunden
    pub chunk_ms: u32,
    /// Maximale Kapazitaet des Wiedergabepuffers in Bytes
    pub puffer_max_bytes: usize,
    /// Maximale gepufferte Dauer in Millisekunden
    pub puffer_max_ms: u32,
    /// Eingabegeraet (None = Standard)
    pub eingabe_geraet: Option<String>,
    /// Ausgabegeraet (None = Standard)
    pub ausgabe_geraet: Option<String>,
}

impl Default for AudioEinstellungen {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            chunk_ms: 30,
            puffer_max_bytes: 4096,
            puffer_max_ms: 100,
            eingabe_geraet: None,
            ausgabe_geraet: None,
        }
    }
}

/// Anruf-Parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnrufEinstellungen {
    /// Mikrofon-Daempfungsfaktor waehrend der Lautsprecher spielt
    pub echo_daempfung: f32,
    /// Ruhezeit nach jedem AT-Kommando in Millisekunden
    pub kommando_pause_ms: u64,
    /// Ruhezeit nach dem Leeren der Portpuffer in Millisekunden
    pub port_ruhe_ms: u64,
}

impl Default for AnrufEinstellungen {
    fn default() -> Self {
        Self {
            echo_daempfung: 0.5,
            kommando_pause_ms: 60,
            port_ruhe_ms: 300,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl DialerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Uebersetzt die Konfiguration fuer den Sitzungs-Supervisor
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            baud: self.seriell.baud,
            kommando_port: self.seriell.kommando_port.clone(),
            audio_port: self.seriell.audio_port.clone(),
            kommando_pause: Duration::from_millis(self.anruf.kommando_pause_ms),
            port_ruhe: Duration::from_millis(self.anruf.port_ruhe_ms),
            bruecke: BrueckenConfig {
                sample_rate: self.audio.sample_rate,
                chunk_ms: self.audio.chunk_ms,
                eingabe_geraet: self.audio.eingabe_geraet.clone(),
                ausgabe_geraet: self.audio.ausgabe_geraet.clone(),
                puffer: PufferConfig {
                    sample_rate: self.audio.sample_rate,
                    max_dauer_ms: self.audio.puffer_max_ms,
                    max_bytes: self.audio.puffer_max_bytes,
                },
            },
        }
    }

    /// Ruhezeit des Kommandokanals
    pub fn kommando_pause(&self) -> Duration {
        Duration::from_millis(self.anruf.kommando_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = DialerConfig::default();
        assert_eq!(cfg.seriell.baud, 115_200);
        assert_eq!(cfg.audio.sample_rate, 8000);
        assert_eq!(cfg.audio.puffer_max_bytes, 4096);
        assert_eq!(cfg.anruf.kommando_pause_ms, 60);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [seriell]
            baud = 9600
            kommando_port = "/dev/ttyUSB2"

            [anruf]
            echo_daempfung = 0.25
        "#;
        let cfg: DialerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.seriell.baud, 9600);
        assert_eq!(cfg.seriell.kommando_port.as_deref(), Some("/dev/ttyUSB2"));
        assert_eq!(cfg.anruf.echo_daempfung, 0.25);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.audio.chunk_ms, 30);
        assert_eq!(cfg.anruf.port_ruhe_ms, 300);
    }

    #[test]
    fn supervisor_config_uebernimmt_werte() {
        let mut cfg = DialerConfig::default();
        cfg.anruf.kommando_pause_ms = 10;
        cfg.audio.puffer_max_ms = 50;
        let sup = cfg.supervisor_config();
        assert_eq!(sup.kommando_pause, Duration::from_millis(10));
        assert_eq!(sup.bruecke.puffer.max_dauer_ms, 50);
        assert_eq!(sup.bruecke.chunk_samples(), 240);
    }
}
