//! fernruf-session – Anruf-Zustandsmaschine und Sitzungs-Supervisor
//!
//! Eine Sitzung ist genau ein Anrufversuch: Aufbau der Kommandosequenz,
//! Audio-Bruecke waehrend des Gespraechs, Ueberwachung auf Abbruch von
//! beiden Seiten, garantierter Abbau. Die Zustandsmaschine
//! (`AnrufSteuerung`) ist die einzige Stelle, die Zustaende wechselt;
//! der Supervisor (`SessionSupervisor`) besorgt Ports, Leitungen und
//! die Freigabe aller Ressourcen auf jedem Ausstiegspfad.

pub mod eingabe;
pub mod error;
pub mod session;
pub mod steuerung;
pub mod supervisor;

pub use eingabe::{eingabe_lauscher_starten, zeile_uebersetzen, LokaleEingabe};
pub use error::{SessionError, SessionResult};
pub use session::AnrufSession;
pub use steuerung::{AbbruchGrund, AnrufSteuerung};
pub use supervisor::{SessionSupervisor, SupervisorConfig};
