//! Fehlertypen fuer die Audio-Bruecke

use thiserror::Error;

/// Alle moeglichen Fehler der Audio-Bruecke
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio-Geraet nicht verfuegbar: {0}")]
    GeraetNichtVerfuegbar(String),

    #[error("Kein Standard-Eingabegeraet verfuegbar")]
    KeinStandardEingabegeraet,

    #[error("Kein Standard-Ausgabegeraet verfuegbar")]
    KeinStandardAusgabegeraet,

    #[error("Stream-Fehler: {0}")]
    StreamFehler(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type AudioResult<T> = Result<T, AudioError>;

impl From<AudioError> for fernruf_core::FernrufError {
    fn from(e: AudioError) -> Self {
        use fernruf_core::FernrufError;
        match e {
            AudioError::Io(e) => FernrufError::Io(e),
            andere => FernrufError::GeraetNichtVerfuegbar(andere.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = AudioError::GeraetNichtVerfuegbar("Mikrofon".into());
        assert!(e.to_string().contains("Mikrofon"));
    }

    #[test]
    fn konvertierung_in_kernfehler() {
        let e: fernruf_core::FernrufError = AudioError::KeinStandardEingabegeraet.into();
        assert!(e.ist_startfehler());
    }
}
