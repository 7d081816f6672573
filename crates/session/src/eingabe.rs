//! Lokale Eingabe waehrend eines Gespraechs
//!
//! Ein Lese-Thread nimmt Zeilen von einer `BufRead`-Quelle entgegen
//! und uebersetzt sie in `LokaleEingabe`. Das Menue haelt den Sender,
//! die Zustandsmaschine den Empfaenger.

use crossbeam_channel::Sender;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::trace;

/// Eingabe der lokalen Seite waehrend eines aktiven Anrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LokaleEingabe {
    /// Ein Zeichen, das als DTMF-Ton gesendet werden soll
    Ton(char),
    /// Gespraech lokal beenden ("h" auf der Konsole)
    Auflegen,
}

/// Startet den Lese-Thread auf einer beliebigen Quelle.
///
/// Jede Zeile wird zeichenweise als `Ton` weitergereicht; Buchstaben
/// werden auf die DTMF-Symbole A-D normalisiert. Die Zeile `h` legt
/// auf und beendet den Thread. Das Lesen selbst blockiert; das
/// Stop-Signal wird an jeder Zeilengrenze geprueft.
pub fn eingabe_lauscher_starten<R>(
    quelle: R,
    sender: Sender<LokaleEingabe>,
    stop: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("fernruf-eingabe".to_string())
        .spawn(move || eingabe_schleife(quelle, &sender, &stop))
}

/// Uebersetzt eine Eingabezeile in lokale Ereignisse.
///
/// `h` legt auf, alle anderen Zeichen gehen als Toene raus
/// (Buchstaben normalisiert auf A-D), leere Zeilen ergeben nichts.
pub fn zeile_uebersetzen(zeile: &str) -> Vec<LokaleEingabe> {
    let zeile = zeile.trim();
    if zeile.is_empty() {
        return Vec::new();
    }
    if zeile.eq_ignore_ascii_case("h") {
        return vec![LokaleEingabe::Auflegen];
    }
    zeile
        .chars()
        .map(|z| LokaleEingabe::Ton(z.to_ascii_uppercase()))
        .collect()
}

fn eingabe_schleife<R: BufRead>(quelle: R, sender: &Sender<LokaleEingabe>, stop: &AtomicBool) {
    'zeilen: for zeile in quelle.lines() {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let zeile = match zeile {
            Ok(z) => z,
            Err(_) => break,
        };
        for eingabe in zeile_uebersetzen(&zeile) {
            trace!(?eingabe, "Lokale Eingabe");
            if sender.send(eingabe).is_err() {
                return;
            }
            if eingabe == LokaleEingabe::Auflegen {
                break 'zeilen;
            }
        }
    }
    trace!("Eingabe-Lauscher beendet");
}
