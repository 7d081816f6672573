//! Fehlertypen fuer Fernruf
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Fernruf
pub type Result<T> = std::result::Result<T, FernrufError>;

/// Alle moeglichen Fehler im Fernruf-System
#[derive(Debug, Error)]
pub enum FernrufError {
    // --- Serielle Ports ---
    #[error("Serieller Port nicht verfuegbar: {0}")]
    PortNichtVerfuegbar(String),

    #[error("Erforderliche serielle Ports nicht gefunden")]
    PortsNichtGefunden,

    #[error("Kanal ist geschlossen")]
    KanalGeschlossen,

    // --- Audio ---
    #[error("Audio-Geraet nicht verfuegbar: {0}")]
    GeraetNichtVerfuegbar(String),

    // --- Eingabe-Validierung ---
    #[error("Ungueltiger DTMF-Ton: '{0}'")]
    UngueltigerTon(char),

    #[error("Ungueltige Rufnummer: {0}")]
    UngueltigeRufnummer(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl FernrufError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler den Sitzungsstart verhindert
    /// (Ressource konnte nicht belegt werden)
    pub fn ist_startfehler(&self) -> bool {
        matches!(
            self,
            Self::PortNichtVerfuegbar(_) | Self::PortsNichtGefunden | Self::GeraetNichtVerfuegbar(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = FernrufError::PortNichtVerfuegbar("/dev/ttyUSB2".into());
        assert_eq!(
            e.to_string(),
            "Serieller Port nicht verfuegbar: /dev/ttyUSB2"
        );
    }

    #[test]
    fn startfehler_erkennung() {
        assert!(FernrufError::PortsNichtGefunden.ist_startfehler());
        assert!(FernrufError::GeraetNichtVerfuegbar("mic".into()).ist_startfehler());
        assert!(!FernrufError::UngueltigerTon('x').ist_startfehler());
        assert!(!FernrufError::KanalGeschlossen.ist_startfehler());
    }

    #[test]
    fn ton_fehler_nennt_zeichen() {
        let e = FernrufError::UngueltigerTon('z');
        assert!(e.to_string().contains('z'));
    }
}
