//! Fehlertypen der Sitzungsschicht

use fernruf_core::AnrufZustand;
use thiserror::Error;

/// Alle moeglichen Fehler einer Anrufsitzung
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Aktion im Zustand '{0}' nicht erlaubt")]
    UngueltigerZustand(AnrufZustand),

    #[error("Zustandswechsel '{von}' -> '{nach}' nicht erlaubt")]
    UngueltigerWechsel {
        von: AnrufZustand,
        nach: AnrufZustand,
    },

    #[error(transparent)]
    Modem(#[from] fernruf_modem::ModemError),

    #[error(transparent)]
    Audio(#[from] fernruf_audio::AudioError),

    #[error(transparent)]
    Kern(#[from] fernruf_core::FernrufError),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
