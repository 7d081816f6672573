//! Fehlertypen fuer den Modem-Zugriff

use thiserror::Error;

/// Alle moeglichen Fehler des Modem-Crates
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("Serieller Port nicht verfuegbar: {0}")]
    PortNichtVerfuegbar(String),

    #[error("Erforderliche serielle Ports nicht gefunden")]
    PortsNichtGefunden,

    #[error("Kommandokanal ist geschlossen")]
    KanalGeschlossen,

    #[error("Lauscher laeuft bereits")]
    LauscherAktiv,

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type ModemResult<T> = Result<T, ModemError>;

impl From<ModemError> for fernruf_core::FernrufError {
    fn from(e: ModemError) -> Self {
        use fernruf_core::FernrufError;
        match e {
            ModemError::PortNichtVerfuegbar(p) => FernrufError::PortNichtVerfuegbar(p),
            ModemError::PortsNichtGefunden => FernrufError::PortsNichtGefunden,
            ModemError::KanalGeschlossen => FernrufError::KanalGeschlossen,
            ModemError::LauscherAktiv => FernrufError::intern("Lauscher laeuft bereits"),
            ModemError::Io(e) => FernrufError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = ModemError::PortNichtVerfuegbar("/dev/ttyUSB2".into());
        assert!(e.to_string().contains("/dev/ttyUSB2"));
    }

    #[test]
    fn konvertierung_in_kernfehler() {
        let e: fernruf_core::FernrufError = ModemError::PortsNichtGefunden.into();
        assert!(e.ist_startfehler());
    }
}
