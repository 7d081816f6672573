//! fernruf-audio – Audio-Bruecke zwischen Host und Modem
//!
//! Bewegt PCM-Samples in beide Richtungen:
//! - Mikrofon-Capture via cpal -> Echodaempfung -> Audioleitung zum Modem
//! - Audioleitung vom Modem -> Wiedergabepuffer -> Lautsprecher via cpal
//!
//! Die Echo-Behandlung ist bewusst primitiv: eine halbduplexartige
//! Absenkung des Mikrofonpegels solange der Lautsprecher spielt, kein
//! echtes AEC.

pub mod aufnahme;
pub mod bruecke;
pub mod error;
pub mod geraet;
pub mod pegel;
pub mod puffer;
pub mod wiedergabe;

// Bequeme Re-Exporte der wichtigsten Typen
pub use aufnahme::{AufnahmeConfig, AufnahmeKonsument};
pub use bruecke::{AudioBruecke, BrueckenConfig};
pub use error::{AudioError, AudioResult};
pub use pegel::{daempfen, EchoDaempfung};
pub use puffer::{PufferConfig, WiedergabePuffer};
