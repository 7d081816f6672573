//! fernruf-modem – Kommandokanal und Modem-Dienste
//!
//! Spricht das AT-Kommandoprotokoll des Modems ueber die serielle
//! Leitung: Kommandoversand mit Ruhezeit, asynchrone Notifikationen,
//! Port-Suche per USB-Kennung sowie die einfachen Einmal-Dienste
//! (SMS, Rufumleitung, Anklopfen).

pub mod dienste;
pub mod error;
pub mod finder;
pub mod kommando;
pub mod leitung;
pub mod sms;

pub use error::{ModemError, ModemResult};
pub use finder::{PortFinder, PortRollen};
pub use kommando::{KommandoKanal, KOMMANDO_RUHEZEIT};
pub use leitung::EchteLeitung;
