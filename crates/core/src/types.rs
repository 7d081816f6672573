//! Gemeinsame Typen fuer Fernruf
//!
//! Der Anrufzustand sowie validierende Newtypes fuer Rufnummern und
//! DTMF-Toene. Die Newtypes schliessen ungueltige Werte bereits zur
//! Konstruktionszeit aus.

use crate::error::{FernrufError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Sitzungs-ID (ein Anrufversuch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Erstellt eine neue zufaellige SessionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Richtung eines Anrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnrufRichtung {
    /// Wir rufen an (ATD)
    Ausgehend,
    /// Wir nehmen ab (ATA)
    Eingehend,
}

/// Zustand eines Anrufs
///
/// Die Uebergaenge sind einbahnig:
/// `Leerlauf -> Aufbau -> Aktiv -> Abbau -> Beendet`.
/// Einzige Ausnahme: jeder Zustand darf bei einem Fehler direkt
/// nach `Abbau` springen. Kein Zustand wird erneut betreten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnrufZustand {
    /// Kein Anruf aktiv
    Leerlauf,
    /// Kommandosequenz laeuft, Verbindung wird aufgebaut
    Aufbau,
    /// Gespraech laeuft, Audio fliesst in beide Richtungen
    Aktiv,
    /// Verbindung wird abgebaut (Hangup + Audio-Modus aus)
    Abbau,
    /// Endzustand, Ressourcen werden freigegeben
    Beendet,
}

impl AnrufZustand {
    /// Prueft ob der Uebergang in den Zielzustand erlaubt ist
    pub fn darf_wechseln(&self, nach: AnrufZustand) -> bool {
        use AnrufZustand::*;
        match (self, nach) {
            (Leerlauf, Aufbau) => true,
            (Aufbau, Aktiv) => true,
            (Aktiv, Abbau) => true,
            (Abbau, Beendet) => true,
            // Fehlerpfad: von ueberall direkt in den Abbau
            (Leerlauf, Abbau) | (Aufbau, Abbau) => true,
            _ => false,
        }
    }

    /// Gibt true zurueck wenn dies der Endzustand ist
    pub fn ist_beendet(&self) -> bool {
        matches!(self, AnrufZustand::Beendet)
    }
}

impl std::fmt::Display for AnrufZustand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnrufZustand::Leerlauf => "leerlauf",
            AnrufZustand::Aufbau => "aufbau",
            AnrufZustand::Aktiv => "aktiv",
            AnrufZustand::Abbau => "abbau",
            AnrufZustand::Beendet => "beendet",
        };
        f.write_str(s)
    }
}

/// Validierte Rufnummer
///
/// Erlaubt sind Ziffern sowie `+`, `*` und `#`. Leere Eingaben und
/// Whitespace werden abgelehnt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rufnummer(String);

impl Rufnummer {
    /// Erstellt eine Rufnummer, lehnt ungueltige Eingaben ab
    pub fn neu(nummer: impl Into<String>) -> Result<Self> {
        let nummer = nummer.into();
        let gueltig = !nummer.is_empty()
            && nummer
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '*' | '#'));
        if gueltig {
            Ok(Self(nummer))
        } else {
            Err(FernrufError::UngueltigeRufnummer(nummer))
        }
    }

    /// Gibt die Nummer als String-Slice zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Rufnummer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validierter DTMF-Ton
///
/// Akzeptiert genau die Symbole `0-9`, `*`, `#`, `A`-`D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtmfTon(char);

impl DtmfTon {
    /// Erstellt einen DTMF-Ton, lehnt ungueltige Symbole ab
    pub fn neu(symbol: char) -> Result<Self> {
        if "0123456789*#ABCD".contains(symbol) {
            Ok(Self(symbol))
        } else {
            Err(FernrufError::UngueltigerTon(symbol))
        }
    }

    /// Gibt das Symbol zurueck
    pub fn symbol(&self) -> char {
        self.0
    }
}

impl std::fmt::Display for DtmfTon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
