//! Modem-Ereignisse
//!
//! Der Kommandokanal schiebt alles, was ausserhalb eines direkten
//! Kommando/Antwort-Austauschs eintrifft, als Ereignisse in eine Queue.
//! Konsumiert wird die Queue ausschliesslich von der Anrufsteuerung –
//! keine Subscriber-Callbacks aus dem I/O-Thread heraus.

use serde::{Deserialize, Serialize};

/// Asynchrone Ereignisse des Kommandokanals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModemEvent {
    /// Unaufgefordertes Text-Fragment vom Modem.
    ///
    /// Fragmente koennen ueber mehrere Reads verteilt eintreffen und
    /// werden vom Empfaenger durch einfache Konkatenation wieder
    /// zusammengesetzt. Der Kanal parst nichts.
    Notifikation(String),

    /// Lesefehler auf dem Kommandokanal.
    ///
    /// Synthetisches Ereignis, damit die Anrufsteuerung den Abbau
    /// erzwingen kann.
    KanalFehler(String),
}
