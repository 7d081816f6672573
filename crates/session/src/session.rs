//! Sitzungsbeschreibung eines Anrufversuchs

use fernruf_audio::EchoDaempfung;
use fernruf_core::{AnrufRichtung, AnrufZustand, Rufnummer, SessionId};
use parking_lot::RwLock;
use std::sync::Arc;

/// Beschreibt genau einen Anrufversuch.
///
/// Der Zustand liegt hinter einem geteilten Handle: die
/// Zustandsmaschine schreibt, alle anderen (Menue, Logs, Tests) lesen
/// nur Momentaufnahmen.
#[derive(Debug, Clone)]
pub struct AnrufSession {
    pub id: SessionId,
    pub richtung: AnrufRichtung,
    /// Zielrufnummer; bei eingehenden Anrufen unbekannt
    pub nummer: Option<Rufnummer>,
    pub daempfung: Arc<EchoDaempfung>,
    zustand: Arc<RwLock<AnrufZustand>>,
}

impl AnrufSession {
    /// Neue ausgehende Sitzung (ATD)
    pub fn ausgehend(nummer: Rufnummer, daempfung_faktor: f32) -> Self {
        Self::neu(AnrufRichtung::Ausgehend, Some(nummer), daempfung_faktor)
    }

    /// Neue eingehende Sitzung (ATA)
    pub fn eingehend(daempfung_faktor: f32) -> Self {
        Self::neu(AnrufRichtung::Eingehend, None, daempfung_faktor)
    }

    fn neu(richtung: AnrufRichtung, nummer: Option<Rufnummer>, daempfung_faktor: f32) -> Self {
        Self {
            id: SessionId::new(),
            richtung,
            nummer,
            daempfung: Arc::new(EchoDaempfung::neu(daempfung_faktor)),
            zustand: Arc::new(RwLock::new(AnrufZustand::Leerlauf)),
        }
    }

    /// Momentaufnahme des Zustands
    pub fn zustand(&self) -> AnrufZustand {
        *self.zustand.read()
    }

    /// Schreib-Handle fuer die Zustandsmaschine
    pub(crate) fn zustand_handle(&self) -> Arc<RwLock<AnrufZustand>> {
        Arc::clone(&self.zustand)
    }
}
