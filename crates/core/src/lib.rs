//! fernruf-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Fernruf-Crates gemeinsam genutzt werden: Anrufzustand,
//! Rufnummern- und DTMF-Validierung, Modem-Ereignisse sowie die
//! Abstraktion der seriellen Leitung.

pub mod error;
pub mod event;
pub mod leitung;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{FernrufError, Result};
pub use event::ModemEvent;
pub use leitung::{SerielleLeitung, SpeicherLeitung};
pub use types::{AnrufRichtung, AnrufZustand, DtmfTon, Rufnummer, SessionId};
