//! Audio-Bruecke – verbindet Host-Audio und Modem-Audioleitung
//!
//! Zwei Richtungen laufen gleichzeitig, jede in einem eigenen Arbeiter:
//! - **Senden**: Mikrofon-Ring-Buffer -> 30-ms-Stuecke -> Echodaempfung
//!   -> Audioleitung zum Modem
//! - **Empfang**: Audioleitung vom Modem -> Wiedergabepuffer -> cpal
//!
//! Zwischen den Richtungen gibt es keine Ordnungsgarantie; beide
//! beobachten das geteilte Stop-Signal an jeder Schleifengrenze.

use fernruf_core::SerielleLeitung;
use ringbuf::traits::Consumer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

use crate::aufnahme::{aufnahme_stream_oeffnen, AufnahmeConfig, AufnahmeKonsument, AufnahmeStream};
use crate::error::AudioResult;
use crate::geraet;
use crate::pegel::{daempfen, EchoDaempfung};
use crate::puffer::{PufferConfig, WiedergabePuffer};
use crate::wiedergabe::{wiedergabe_stream_oeffnen, WiedergabeConfig, WiedergabeStream};

/// Wartezeit der Arbeiter wenn keine Daten anliegen
const ARBEITER_PAUSE: Duration = Duration::from_millis(5);

/// Konfiguration der Audio-Bruecke
#[derive(Debug, Clone)]
pub struct BrueckenConfig {
    /// Abtastrate in Hz (Modem-PCM: 8000, mono)
    pub sample_rate: u32,
    /// Stueckgroesse der Senderichtung in Millisekunden
    pub chunk_ms: u32,
    /// Eingabegeraet (None = Standard)
    pub eingabe_geraet: Option<String>,
    /// Ausgabegeraet (None = Standard)
    pub ausgabe_geraet: Option<String>,
    /// Wiedergabepuffer-Grenzen
    pub puffer: PufferConfig,
}

impl Default for BrueckenConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            chunk_ms: 30,
            eingabe_geraet: None,
            ausgabe_geraet: None,
            puffer: PufferConfig::default(),
        }
    }
}

impl BrueckenConfig {
    /// Stueckgroesse der Senderichtung in Samples
    pub fn chunk_samples(&self) -> usize {
        (self.sample_rate as usize * self.chunk_ms as usize) / 1000
    }
}

/// Laufende Audio-Bruecke
///
/// Haelt die cpal-Streams und die beiden Arbeiter-Threads. cpal-Streams
/// sind nicht `Send`; die Bruecke bleibt deshalb auf dem Thread, der sie
/// gestartet hat – die Arbeiter bekommen nur `Send`-faehige Haelften.
pub struct AudioBruecke {
    streams: Option<(AufnahmeStream, WiedergabeStream)>,
    arbeiter: Vec<JoinHandle<()>>,
    halt: Arc<AtomicBool>,
}

impl AudioBruecke {
    /// Startet beide Richtungen.
    ///
    /// Schlaegt fehl wenn eines der Host-Audiogeraete nicht geoeffnet
    /// werden kann. `stop` ist das sitzungsweite Abbruchsignal; die
    /// Bruecke fuehrt zusaetzlich ihr eigenes Halt-Flag fuer `stoppen`.
    pub fn starten(
        config: BrueckenConfig,
        leitung: Box<dyn SerielleLeitung>,
        daempfung: Arc<EchoDaempfung>,
        stop: Arc<AtomicBool>,
    ) -> AudioResult<Self> {
        let eingabe = geraet::eingabegeraet_laden(config.eingabe_geraet.as_deref())?;
        let ausgabe = geraet::ausgabegeraet_laden(config.ausgabe_geraet.as_deref())?;

        let puffer = Arc::new(WiedergabePuffer::neu(config.puffer.clone()));

        let (aufnahme_stream, konsument) = aufnahme_stream_oeffnen(
            &eingabe,
            AufnahmeConfig {
                sample_rate: config.sample_rate,
                kanaele: 1,
                puffer_samples: config.sample_rate as usize,
            },
        )?;
        let wiedergabe_stream = wiedergabe_stream_oeffnen(
            &ausgabe,
            WiedergabeConfig {
                sample_rate: config.sample_rate,
                kanaele: 1,
            },
            Arc::clone(&puffer),
        )?;

        let lese_leitung = leitung.klonen()?;
        let halt = Arc::new(AtomicBool::new(false));
        let chunk_samples = config.chunk_samples();

        let sende_puffer = Arc::clone(&puffer);
        let sende_stop = Arc::clone(&stop);
        let sende_halt = Arc::clone(&halt);
        let sende = std::thread::Builder::new()
            .name("fernruf-audio-sende".to_string())
            .spawn(move || {
                sende_schleife(
                    konsument,
                    leitung,
                    daempfung,
                    sende_puffer,
                    chunk_samples,
                    sende_stop,
                    sende_halt,
                );
            })?;

        let empfang_halt = Arc::clone(&halt);
        let empfang = std::thread::Builder::new()
            .name("fernruf-audio-empfang".to_string())
            .spawn(move || {
                empfangs_schleife(lese_leitung, puffer, stop, empfang_halt);
            })?;

        debug!(chunk_samples, "Audio-Bruecke gestartet");

        Ok(Self {
            streams: Some((aufnahme_stream, wiedergabe_stream)),
            arbeiter: vec![sende, empfang],
            halt,
        })
    }

    /// Haelt beide Richtungen an. Idempotent.
    pub fn stoppen(&mut self) {
        self.halt.store(true, Ordering::SeqCst);
        for handle in self.arbeiter.drain(..) {
            let _ = handle.join();
        }
        if self.streams.take().is_some() {
            debug!("Audio-Bruecke gestoppt");
        }
    }
}

impl Drop for AudioBruecke {
    fn drop(&mut self) {
        self.stoppen();
    }
}

/// Senderichtung: Mikrofon-Samples in Stuecken zum Modem schreiben.
///
/// Die Daempfung greift nur solange die Wiedergabe gerade Ton
/// produziert; sonst volle Lautstaerke.
fn sende_schleife(
    mut konsument: AufnahmeKonsument,
    mut leitung: Box<dyn SerielleLeitung>,
    daempfung: Arc<EchoDaempfung>,
    puffer: Arc<WiedergabePuffer>,
    chunk_samples: usize,
    stop: Arc<AtomicBool>,
    halt: Arc<AtomicBool>,
) {
    let mut chunk = vec![0i16; chunk_samples];
    let mut gefuellt = 0usize;

    while !stop.load(Ordering::SeqCst) && !halt.load(Ordering::SeqCst) {
        gefuellt += konsument.pop_slice(&mut chunk[gefuellt..]);
        if gefuellt < chunk_samples {
            std::thread::sleep(ARBEITER_PAUSE);
            continue;
        }
        gefuellt = 0;

        let faktor = if puffer.spielt() {
            daempfung.faktor()
        } else {
            1.0
        };
        let mut bytes: Vec<u8> = chunk.iter().flat_map(|s| s.to_le_bytes()).collect();
        daempfen(&mut bytes, faktor);

        if let Err(e) = leitung.schreiben(&bytes) {
            warn!(fehler = %e, "Audioleitung nicht beschreibbar");
            std::thread::sleep(ARBEITER_PAUSE);
        }
    }
}

/// Empfangsrichtung: alles Verfuegbare vom Modem in den Wiedergabepuffer.
///
/// Ein Lesefehler auf der Leitung setzt das sitzungsweite Stop-Signal;
/// die Ueberwachung beendet das Gespraech daraufhin lokal.
fn empfangs_schleife(
    mut leitung: Box<dyn SerielleLeitung>,
    puffer: Arc<WiedergabePuffer>,
    stop: Arc<AtomicBool>,
    halt: Arc<AtomicBool>,
) {
    let mut lese = [0u8; 1024];
    while !stop.load(Ordering::SeqCst) && !halt.load(Ordering::SeqCst) {
        match leitung.lesen(&mut lese) {
            Ok(0) => std::thread::sleep(ARBEITER_PAUSE),
            Ok(n) => puffer.anhaengen(&lese[..n]),
            Err(e) => {
                warn!(fehler = %e, "Audioleitung nicht lesbar, Gespraech wird beendet");
                stop.store(true, Ordering::SeqCst);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fernruf_core::SpeicherLeitung;
    use ringbuf::traits::{Producer, Split};
    use ringbuf::HeapRb;

    fn bytes_als_samples(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|p| i16::from_le_bytes([p[0], p[1]]))
            .collect()
    }

    #[test]
    fn chunk_samples_rechnung() {
        let config = BrueckenConfig::default();
        // 30 ms bei 8000 Hz
        assert_eq!(config.chunk_samples(), 240);
    }

    #[test]
    fn sende_schleife_volle_lautstaerke_bei_stiller_wiedergabe() {
        let (host, mut modem) = SpeicherLeitung::paar();
        let rb = HeapRb::<i16>::new(64);
        let (mut produzent, konsument) = rb.split();
        produzent.push_slice(&[1000, -2000, 30, 4]);

        let stop = Arc::new(AtomicBool::new(false));
        let halt = Arc::new(AtomicBool::new(false));
        let puffer = Arc::new(WiedergabePuffer::neu(PufferConfig::default()));
        let daempfung = Arc::new(EchoDaempfung::neu(0.5));

        let stop_t = Arc::clone(&stop);
        let halt_t = Arc::clone(&halt);
        let handle = std::thread::spawn(move || {
            sende_schleife(konsument, Box::new(host), daempfung, puffer, 4, stop_t, halt_t);
        });
        std::thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::SeqCst);
        handle.join().unwrap();

        let mut empfangen = [0u8; 64];
        let n = modem.lesen(&mut empfangen).unwrap();
        // Wiedergabe still -> Samples unveraendert
        assert_eq!(bytes_als_samples(&empfangen[..n]), vec![1000, -2000, 30, 4]);
    }

    #[test]
    fn sende_schleife_daempft_bei_aktiver_wiedergabe() {
        let (host, mut modem) = SpeicherLeitung::paar();
        let rb = HeapRb::<i16>::new(64);
        let (mut produzent, konsument) = rb.split();
        produzent.push_slice(&[1000, -2000, 31, 5]);

        let stop = Arc::new(AtomicBool::new(false));
        let halt = Arc::new(AtomicBool::new(false));
        let puffer = Arc::new(WiedergabePuffer::neu(PufferConfig::default()));
        let daempfung = Arc::new(EchoDaempfung::neu(0.5));

        // Wiedergabe aktiv stellen: anhaengen und entnehmen setzt das Flag
        puffer.anhaengen(&[1, 0]);
        let mut ziel = [0i16; 1];
        puffer.entnehmen(&mut ziel);
        assert!(puffer.spielt());

        let stop_t = Arc::clone(&stop);
        let halt_t = Arc::clone(&halt);
        let handle = std::thread::spawn(move || {
            sende_schleife(konsument, Box::new(host), daempfung, puffer, 4, stop_t, halt_t);
        });
        std::thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::SeqCst);
        handle.join().unwrap();

        let mut empfangen = [0u8; 64];
        let n = modem.lesen(&mut empfangen).unwrap();
        // Faktor 0.5, Nachkommastellen abgeschnitten
        assert_eq!(bytes_als_samples(&empfangen[..n]), vec![500, -1000, 15, 2]);
    }

    #[test]
    fn sende_schleife_wartet_auf_volles_stueck() {
        let (host, mut modem) = SpeicherLeitung::paar();
        let rb = HeapRb::<i16>::new(64);
        let (mut produzent, konsument) = rb.split();
        // Nur 2 von 4 Samples: kein vollstaendiges Stueck
        produzent.push_slice(&[7, 8]);

        let stop = Arc::new(AtomicBool::new(false));
        let halt = Arc::new(AtomicBool::new(false));
        let puffer = Arc::new(WiedergabePuffer::neu(PufferConfig::default()));
        let daempfung = Arc::new(EchoDaempfung::default());

        let stop_t = Arc::clone(&stop);
        let halt_t = Arc::clone(&halt);
        let handle = std::thread::spawn(move || {
            sende_schleife(konsument, Box::new(host), daempfung, puffer, 4, stop_t, halt_t);
        });
        std::thread::sleep(Duration::from_millis(40));
        stop.store(true, Ordering::SeqCst);
        handle.join().unwrap();

        assert_eq!(modem.verfuegbar().unwrap(), 0, "Teilstuecke gehen nicht raus");
    }

    #[test]
    fn empfangs_schleife_fuellt_wiedergabepuffer() {
        let (host, mut modem) = SpeicherLeitung::paar();
        let stop = Arc::new(AtomicBool::new(false));
        let halt = Arc::new(AtomicBool::new(false));
        let puffer = Arc::new(WiedergabePuffer::neu(PufferConfig::default()));

        modem.schreiben(&[10, 0, 20, 0]).unwrap();

        let puffer_t = Arc::clone(&puffer);
        let stop_t = Arc::clone(&stop);
        let halt_t = Arc::clone(&halt);
        let handle = std::thread::spawn(move || {
            empfangs_schleife(Box::new(host), puffer_t, stop_t, halt_t);
        });
        std::thread::sleep(Duration::from_millis(40));
        stop.store(true, Ordering::SeqCst);
        handle.join().unwrap();

        assert_eq!(puffer.laenge_bytes(), 4);
    }

    #[test]
    fn leitungsfehler_setzt_stop_signal_und_beendet() {
        let (host, _modem) = SpeicherLeitung::paar();
        host.fehler_ausloesen();
        let stop = Arc::new(AtomicBool::new(false));
        let halt = Arc::new(AtomicBool::new(false));
        let puffer = Arc::new(WiedergabePuffer::neu(PufferConfig::default()));

        let stop_t = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            empfangs_schleife(Box::new(host), puffer, stop_t, halt);
        });
        // Muss von selbst enden und das Gespraechsende anstossen
        handle.join().unwrap();
        assert!(
            stop.load(Ordering::SeqCst),
            "Ein Lesefehler muss das Stop-Signal der Sitzung setzen"
        );
    }

    #[test]
    #[ignore = "Benoetigt Audio-Hardware"]
    fn bruecke_start_und_stopp() {
        let (host, _modem) = SpeicherLeitung::paar();
        let stop = Arc::new(AtomicBool::new(false));
        let daempfung = Arc::new(EchoDaempfung::default());
        let bruecke = AudioBruecke::starten(
            BrueckenConfig::default(),
            Box::new(host),
            daempfung,
            stop,
        );
        if let Ok(mut bruecke) = bruecke {
            bruecke.stoppen();
            bruecke.stoppen(); // idempotent
        }
    }
}
