//! Kommandokanal zum Modem
//!
//! Serialisiert AT-Kommandos auf die serielle Leitung und haelt nach
//! jedem Kommando die Ruhezeit ein, die der Kommandoprozessor des Modems
//! verlangt. Alles, was ausserhalb eines Kommando/Antwort-Austauschs
//! eintrifft, schiebt ein Lausch-Thread als `ModemEvent` in eine Queue.

use crossbeam_channel::Sender;
use fernruf_core::{ModemEvent, SerielleLeitung};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::error::{ModemError, ModemResult};

/// Ruhezeit nach einem Kommando (Protokollanforderung des Modems)
pub const KOMMANDO_RUHEZEIT: Duration = Duration::from_millis(60);

/// Abfrage-Intervall des Lausch-Threads
const LAUSCH_INTERVALL: Duration = Duration::from_millis(10);

/// Kommandokanal: exklusiver Besitzer einer seriellen Leitung
///
/// Kein zweites Kommando geht auf die Leitung bevor die Ruhezeit des
/// vorherigen abgelaufen ist; `senden` blockiert den Aufrufer fuer die
/// volle Ruhezeit. Gleichzeitige Aufrufer werden vom Besitzer des Kanals
/// serialisiert (der Kanal wird hinter `&mut` bzw. einem Lock gefuehrt).
pub struct KommandoKanal {
    leitung: Option<Box<dyn SerielleLeitung>>,
    ruhezeit: Duration,
    /// Fruehester Zeitpunkt fuer das naechste Kommando
    bereit_ab: Instant,
    lauscher: Option<JoinHandle<()>>,
    lauscher_stop: Arc<AtomicBool>,
}

impl KommandoKanal {
    /// Uebernimmt eine geoeffnete Leitung mit der Standard-Ruhezeit
    pub fn neu(leitung: Box<dyn SerielleLeitung>) -> Self {
        Self::mit_ruhezeit(leitung, KOMMANDO_RUHEZEIT)
    }

    /// Uebernimmt eine geoeffnete Leitung mit eigener Ruhezeit
    pub fn mit_ruhezeit(leitung: Box<dyn SerielleLeitung>, ruhezeit: Duration) -> Self {
        Self {
            leitung: Some(leitung),
            ruhezeit,
            bereit_ab: Instant::now(),
            lauscher: None,
            lauscher_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Gibt true zurueck solange der Kanal offen ist
    pub fn ist_offen(&self) -> bool {
        self.leitung.is_some()
    }

    /// Sendet ein AT-Kommando (haengt `\r` an) und blockiert den
    /// Aufrufer fuer die Ruhezeit.
    ///
    /// Schreibfehler gehen an den Aufrufer zurueck und schliessen den
    /// Kanal NICHT; Lesefehler meldet der Lausch-Thread als
    /// `ModemEvent::KanalFehler`.
    pub fn senden(&mut self, kommando: &str) -> ModemResult<()> {
        let ruhezeit = self.ruhezeit;
        let bereit_ab = self.bereit_ab;
        let leitung = self.leitung.as_mut().ok_or(ModemError::KanalGeschlossen)?;

        // Wartepflicht des vorherigen Kommandos einhalten
        let jetzt = Instant::now();
        if jetzt < bereit_ab {
            std::thread::sleep(bereit_ab - jetzt);
        }

        leitung.schreiben(format!("{kommando}\r").as_bytes())?;
        debug!(kommando, "Kommando gesendet");

        self.bereit_ab = Instant::now() + ruhezeit;
        std::thread::sleep(ruhezeit);
        Ok(())
    }

    /// Sendet ein Kommando und verschluckt dessen Fehler (Abbau-Pfad).
    ///
    /// Der Abbau muss so weit wie moeglich durchlaufen, auch wenn die
    /// Leitung bereits tot ist.
    pub fn senden_stumm(&mut self, kommando: &str) {
        if let Err(e) = self.senden(kommando) {
            warn!(kommando, fehler = %e, "Kommando im Abbau fehlgeschlagen");
        }
    }

    /// Schreibt Bytes unveraendert: kein Terminator, keine Ruhezeit.
    ///
    /// Fuer Steuerbytes ausserhalb des AT-Modus, z.B. Ctrl+Z als
    /// SMS-Nachrichtenende.
    pub fn roh_schreiben(&mut self, daten: &[u8]) -> ModemResult<()> {
        let leitung = self.leitung.as_mut().ok_or(ModemError::KanalGeschlossen)?;
        leitung.schreiben(daten)?;
        trace!(daten = %sichtbar(daten), "Rohdaten gesendet");
        Ok(())
    }

    /// Verwirft Ein- und Ausgabepuffer der Leitung
    pub fn puffer_leeren(&mut self) -> ModemResult<()> {
        let leitung = self.leitung.as_mut().ok_or(ModemError::KanalGeschlossen)?;
        leitung.puffer_leeren()?;
        Ok(())
    }

    /// Startet den Lausch-Thread fuer asynchrone Modem-Notifikationen.
    ///
    /// Der Thread liest ueber ein geklontes Leitungs-Handle alle ~10 ms
    /// was vorhanden ist und leitet es unparsiert als Text-Fragmente
    /// weiter. Ein Lesefehler wird als ein `KanalFehler` gemeldet und
    /// beendet den Thread. Der Thread beobachtet zusaetzlich das
    /// uebergebene Stop-Signal an jeder Schleifengrenze.
    pub fn lauscher_starten(
        &mut self,
        ereignisse: Sender<ModemEvent>,
        stop: Arc<AtomicBool>,
    ) -> ModemResult<()> {
        if self.lauscher.is_some() {
            return Err(ModemError::LauscherAktiv);
        }
        let leitung = self.leitung.as_ref().ok_or(ModemError::KanalGeschlossen)?;
        let mut lese_leitung = leitung.klonen()?;

        self.lauscher_stop.store(false, Ordering::SeqCst);
        let eigenes_stop = Arc::clone(&self.lauscher_stop);

        let handle = std::thread::Builder::new()
            .name("fernruf-modem-lauscher".to_string())
            .spawn(move || {
                lausch_schleife(lese_leitung.as_mut(), &ereignisse, &stop, &eigenes_stop);
            })
            .map_err(ModemError::Io)?;

        self.lauscher = Some(handle);
        Ok(())
    }

    /// Schliesst den Kanal: Lauscher stoppen, Puffer verwerfen,
    /// Geraet freigeben. Idempotent.
    pub fn schliessen(&mut self) {
        self.lauscher_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.lauscher.take() {
            let _ = handle.join();
        }
        if let Some(mut leitung) = self.leitung.take() {
            let _ = leitung.puffer_leeren();
            debug!("Kommandokanal geschlossen");
        }
    }
}

impl Drop for KommandoKanal {
    fn drop(&mut self) {
        self.schliessen();
    }
}

/// Schleifenkoerper des Lausch-Threads
fn lausch_schleife(
    leitung: &mut dyn SerielleLeitung,
    ereignisse: &Sender<ModemEvent>,
    stop: &AtomicBool,
    eigenes_stop: &AtomicBool,
) {
    let mut puffer = [0u8; 512];
    loop {
        if stop.load(Ordering::SeqCst) || eigenes_stop.load(Ordering::SeqCst) {
            break;
        }
        match leitung.lesen(&mut puffer) {
            Ok(0) => std::thread::sleep(LAUSCH_INTERVALL),
            Ok(n) => {
                let fragment = String::from_utf8_lossy(&puffer[..n]).into_owned();
                trace!(fragment = %sichtbar(fragment.as_bytes()), "Modem-Notifikation");
                if ereignisse.send(ModemEvent::Notifikation(fragment)).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(fehler = %e, "Lesefehler auf dem Kommandokanal");
                let _ = ereignisse.send(ModemEvent::KanalFehler(e.to_string()));
                break;
            }
        }
    }
    trace!("Modem-Lauscher beendet");
}

/// Macht Steuerzeichen in Logausgaben sichtbar
fn sichtbar(daten: &[u8]) -> String {
    String::from_utf8_lossy(daten)
        .replace('\u{1A}', "<CTRL+Z>")
        .replace('\r', "<CR>")
        .replace('\n', "<LF>")
}
