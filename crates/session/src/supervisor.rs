//! Sitzungs-Supervisor
//!
//! Fuehrt einen kompletten Anrufversuch durch: Ports aufloesen, beide
//! Leitungen oeffnen, Aufbau, Audio-Bruecke, Ueberwachung, Abbau. Der
//! Abbau-Block liegt hinter dem fehlbaren Teil und laeuft auf JEDEM
//! Ausstiegspfad genau einmal; das eine Stop-Signal der Sitzung ist
//! das einzige Abbruchmittel fuer alle Arbeiter.

use crossbeam_channel::{unbounded, Receiver};
use fernruf_audio::{AudioBruecke, BrueckenConfig};
use fernruf_core::SerielleLeitung;
use fernruf_modem::{EchteLeitung, KommandoKanal, PortFinder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::eingabe::LokaleEingabe;
use crate::error::SessionResult;
use crate::session::AnrufSession;
use crate::steuerung::{AnrufSteuerung, PORT_RUHEZEIT};

/// Konfiguration des Supervisors
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Baudrate beider Leitungen
    pub baud: u32,
    /// Expliziter Kommando-Port (None = USB-Suche)
    pub kommando_port: Option<String>,
    /// Expliziter Audio-Port (None = USB-Suche)
    pub audio_port: Option<String>,
    /// Ruhezeit des Kommandokanals nach jedem Kommando
    pub kommando_pause: Duration,
    /// Ruhezeit nach dem Leeren der Portpuffer
    pub port_ruhe: Duration,
    /// Konfiguration der Audio-Bruecke
    pub bruecke: BrueckenConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            baud: 115_200,
            kommando_port: None,
            audio_port: None,
            kommando_pause: fernruf_modem::KOMMANDO_RUHEZEIT,
            port_ruhe: PORT_RUHEZEIT,
            bruecke: BrueckenConfig::default(),
        }
    }
}

/// Fuehrt Anrufsitzungen durch und gibt deren Ressourcen frei
pub struct SessionSupervisor {
    config: SupervisorConfig,
}

impl SessionSupervisor {
    pub fn neu(config: SupervisorConfig) -> Self {
        Self { config }
    }

    /// Loest die Modem-Ports auf, oeffnet beide Leitungen und fuehrt
    /// die Sitzung bis zu ihrem Ende.
    pub fn anruf_fuehren(
        &self,
        session: AnrufSession,
        eingaben: Receiver<LokaleEingabe>,
    ) -> SessionResult<()> {
        let finder = PortFinder {
            kommando_port: self.config.kommando_port.clone(),
            audio_port: self.config.audio_port.clone(),
        };
        let rollen = finder.aufloesen()?;
        let kommando = EchteLeitung::oeffnen(&rollen.kommando, self.config.baud)?;
        let audio = EchteLeitung::oeffnen(&rollen.audio, self.config.baud)?;
        self.fahren(session, Box::new(kommando), Box::new(audio), eingaben)
    }

    /// Fuehrt die Sitzung auf bereits geoeffneten Leitungen.
    ///
    /// Ablauf: Aufbau, Bruecke starten, Ueberwachung bis zum ersten
    /// Abbruchausloeser. Die anschliessende Abschlussfolge baut die
    /// Verbindung ab, haelt erst danach die Bruecke an und schliesst
    /// den Kommandokanal auch dann, wenn der Aufbau fehlgeschlagen ist.
    pub fn fahren(
        &self,
        session: AnrufSession,
        kommando_leitung: Box<dyn SerielleLeitung>,
        mut audio_leitung: Box<dyn SerielleLeitung>,
        eingaben: Receiver<LokaleEingabe>,
    ) -> SessionResult<()> {
        let stop = Arc::new(AtomicBool::new(false));
        let daempfung = Arc::clone(&session.daempfung);
        let id = session.id;
        info!(session = %id, richtung = ?session.richtung, "Sitzung gestartet");

        let mut kanal = KommandoKanal::mit_ruhezeit(kommando_leitung, self.config.kommando_pause);
        let (ereignis_tx, ereignis_rx) = unbounded();
        let lauscher = kanal.lauscher_starten(ereignis_tx, Arc::clone(&stop));

        let mut steuerung = AnrufSteuerung::mit_port_ruhe(
            session,
            kanal,
            ereignis_rx,
            eingaben,
            Arc::clone(&stop),
            self.config.port_ruhe,
        );

        let mut bruecke: Option<AudioBruecke> = None;
        let bruecke_config = self.config.bruecke.clone();
        let ergebnis = (|| -> SessionResult<()> {
            lauscher?;
            steuerung.aufbauen(audio_leitung.as_mut())?;
            bruecke = Some(AudioBruecke::starten(
                bruecke_config,
                audio_leitung,
                daempfung,
                Arc::clone(&stop),
            )?);
            let grund = steuerung.ueberwachen();
            info!(session = %id, %grund, "Gespraech laeuft aus");
            Ok(())
        })();

        // Freigabe auf jedem Ausstiegspfad, jede Ressource genau einmal
        abschliessen(&stop, &mut steuerung, || {
            if let Some(mut bruecke) = bruecke.take() {
                bruecke.stoppen();
            }
        });

        if let Err(e) = &ergebnis {
            warn!(session = %id, fehler = %e, "Sitzung mit Fehler beendet");
        } else {
            info!(session = %id, "Sitzung beendet");
        }
        ergebnis
    }
}

/// Abschlussfolge jeder Sitzung.
///
/// Erst das Stop-Signal fuer die Arbeiter, dann die Abbau-Kommandos
/// zum Modem (`AT+CHUP`, `AT+CPCMREG=0,1`), erst danach der
/// Audio-Halt, zuletzt der Kommandokanal.
fn abschliessen(stop: &AtomicBool, steuerung: &mut AnrufSteuerung, audio_halt: impl FnOnce()) {
    stop.store(true, Ordering::SeqCst);
    steuerung.abbauen();
    audio_halt();
    steuerung.kanal_schliessen();
}

#[cfg(test)]
mod tests {
    use super::*;
    use fernruf_core::{AnrufZustand, Rufnummer, SpeicherLeitung};

    fn test_config() -> SupervisorConfig {
        SupervisorConfig {
            kommando_pause: Duration::from_millis(1),
            port_ruhe: Duration::from_millis(1),
            ..SupervisorConfig::default()
        }
    }

    #[test]
    fn aufbaufehler_raeumt_auf_und_beendet() {
        // Kommandoleitung faellt sofort aus: der Aufbau scheitert vor
        // dem Brueckenstart, der Abbau muss trotzdem durchlaufen.
        let (host, _modem) = SpeicherLeitung::paar();
        let kanal_ende = host.klonen().unwrap();
        let (audio_host, _audio_modem) = SpeicherLeitung::paar();
        host.fehler_ausloesen();

        let session = AnrufSession::ausgehend(Rufnummer::neu("5551234").unwrap(), 0.5);
        let ansicht = session.clone();
        let (_tx, rx) = unbounded();

        let supervisor = SessionSupervisor::neu(test_config());
        let ergebnis = supervisor.fahren(session, kanal_ende, Box::new(audio_host), rx);

        assert!(ergebnis.is_err());
        assert_eq!(ansicht.zustand(), AnrufZustand::Beendet);
    }

    #[test]
    fn abbau_kommandos_gehen_vor_dem_audio_halt_raus() {
        let (host, mut modem) = SpeicherLeitung::paar();
        let (mut audio_host, _audio_modem) = SpeicherLeitung::paar();
        let kanal = KommandoKanal::mit_ruhezeit(Box::new(host), Duration::from_millis(1));
        let (_etx, erx) = unbounded();
        let (_itx, irx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let mut steuerung = AnrufSteuerung::mit_port_ruhe(
            AnrufSession::ausgehend(Rufnummer::neu("5551234").unwrap(), 0.5),
            kanal,
            erx,
            irx,
            Arc::clone(&stop),
            Duration::from_millis(1),
        );
        steuerung.aufbauen(&mut audio_host).unwrap();

        // Aufbau-Kommandos abraeumen
        let mut puffer = [0u8; 1024];
        modem.lesen(&mut puffer).unwrap();

        let mut chup_vor_halt = false;
        abschliessen(&stop, &mut steuerung, || {
            let n = modem.lesen(&mut puffer).unwrap();
            chup_vor_halt = String::from_utf8_lossy(&puffer[..n]).contains("AT+CHUP");
        });

        assert!(
            chup_vor_halt,
            "Auflegen muss beim Modem sein, bevor das Audio anhaelt"
        );
        assert!(stop.load(Ordering::SeqCst));
        assert_eq!(steuerung.zustand(), AnrufZustand::Beendet);
    }

    #[test]
    #[ignore = "Benoetigt Audio-Hardware"]
    fn voller_durchlauf_mit_lokalem_auflegen() {
        let (host, mut modem) = SpeicherLeitung::paar();
        let (audio_host, _audio_modem) = SpeicherLeitung::paar();

        let session = AnrufSession::ausgehend(Rufnummer::neu("5551234").unwrap(), 0.5);
        let ansicht = session.clone();
        let (tx, rx) = unbounded();
        tx.send(LokaleEingabe::Auflegen).unwrap();

        let supervisor = SessionSupervisor::neu(test_config());
        supervisor
            .fahren(session, Box::new(host), Box::new(audio_host), rx)
            .unwrap();

        assert_eq!(ansicht.zustand(), AnrufZustand::Beendet);
        let mut puffer = [0u8; 2048];
        let n = modem.lesen(&mut puffer).unwrap();
        let gesendet = String::from_utf8_lossy(&puffer[..n]);
        assert!(gesendet.contains("ATD5551234;\r"));
        assert!(gesendet.contains("AT+CHUP\r"));
        assert!(gesendet.contains("AT+CPCMREG=0,1\r"));
    }
}
