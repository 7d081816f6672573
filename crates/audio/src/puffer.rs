//! Wiedergabepuffer fuer Modem-Audio
//!
//! Begrenzter Byte-Ring zwischen dem Modem-Lese-Arbeiter (einziger
//! Schreiber) und dem cpal-Ausgabe-Callback (einziger Leser). Begrenzt
//! wird doppelt: maximale gepufferte Dauer und maximale Kapazitaet in
//! Bytes. Wuerde ein Schreibvorgang eine Grenze reissen, wird der
//! Puffer komplett geleert und erst dann angehaengt – ein voller Clear
//! statt eines Teil-Trims (bewusster Latenz/Qualitaets-Kompromiss).

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Konfiguration des Wiedergabepuffers
#[derive(Debug, Clone)]
pub struct PufferConfig {
    /// Abtastrate in Hz (bestimmt die Dauer-Rechnung)
    pub sample_rate: u32,
    /// Maximale gepufferte Dauer in Millisekunden
    pub max_dauer_ms: u32,
    /// Maximale Kapazitaet in Bytes
    pub max_bytes: usize,
}

impl Default for PufferConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            max_dauer_ms: 100,
            max_bytes: 4096,
        }
    }
}

impl PufferConfig {
    /// Dauer-Grenze umgerechnet in Bytes (16-bit mono)
    fn dauer_grenze_bytes(&self) -> usize {
        (self.sample_rate as usize * 2 * self.max_dauer_ms as usize) / 1000
    }
}

/// Begrenzter Wiedergabepuffer
///
/// Der Lock wird nur fuer die jeweilige Operation gehalten, nie ueber
/// einen Wartepunkt hinweg.
pub struct WiedergabePuffer {
    daten: Mutex<VecDeque<u8>>,
    config: PufferConfig,
    /// True solange der Leser zuletzt tatsaechlich Samples entnommen hat
    spielt: AtomicBool,
}

impl WiedergabePuffer {
    /// Erstellt einen leeren Puffer
    pub fn neu(config: PufferConfig) -> Self {
        Self {
            daten: Mutex::new(VecDeque::with_capacity(config.max_bytes)),
            config,
            spielt: AtomicBool::new(false),
        }
    }

    /// Haengt Modem-Audio an.
    ///
    /// Reisst der Schreibvorgang die Dauer- oder Byte-Grenze, wird der
    /// Puffer vorher geleert. Ist das neue Stueck selbst groesser als
    /// die Kapazitaet, bleiben nur die neuesten Bytes erhalten.
    pub fn anhaengen(&self, bytes: &[u8]) {
        let grenze = self
            .config
            .dauer_grenze_bytes()
            .min(self.config.max_bytes);
        let mut daten = self.daten.lock();
        if daten.len() + bytes.len() > grenze {
            tracing::trace!(
                vorhanden = daten.len(),
                neu = bytes.len(),
                "Wiedergabepuffer voll, alte Samples verworfen"
            );
            daten.clear();
        }
        daten.extend(bytes.iter().copied());
        while daten.len() > self.config.max_bytes {
            daten.pop_front();
        }
    }

    /// Entnimmt Samples fuer den Ausgabe-Callback.
    ///
    /// Gibt die Anzahl geschriebener Samples zurueck; der Aufrufer
    /// fuellt den Rest mit Stille. Pflegt das `spielt`-Flag.
    pub fn entnehmen(&self, ziel: &mut [i16]) -> usize {
        let mut daten = self.daten.lock();
        let mut n = 0;
        while n < ziel.len() && daten.len() >= 2 {
            let lo = daten.pop_front().unwrap_or(0);
            let hi = daten.pop_front().unwrap_or(0);
            ziel[n] = i16::from_le_bytes([lo, hi]);
            n += 1;
        }
        drop(daten);
        self.spielt.store(n > 0, Ordering::Relaxed);
        n
    }

    /// Gibt true zurueck solange die Wiedergabe gerade Ton produziert
    pub fn spielt(&self) -> bool {
        self.spielt.load(Ordering::Relaxed)
    }

    /// Anzahl aktuell gepufferter Bytes
    pub fn laenge_bytes(&self) -> usize {
        self.daten.lock().len()
    }

    /// Aktuell gepufferte Dauer in Millisekunden
    pub fn dauer_ms(&self) -> u32 {
        let bytes = self.laenge_bytes() as u64;
        ((bytes * 1000) / (self.config.sample_rate as u64 * 2)) as u32
    }

    /// Leert den Puffer vollstaendig
    pub fn leeren(&self) {
        self.daten.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puffer() -> WiedergabePuffer {
        WiedergabePuffer::neu(PufferConfig::default())
    }

    #[test]
    fn anhaengen_und_entnehmen() {
        let p = puffer();
        p.anhaengen(&[0x34, 0x12, 0xCD, 0xAB]);
        let mut ziel = [0i16; 4];
        let n = p.entnehmen(&mut ziel);
        assert_eq!(n, 2);
        assert_eq!(ziel[0], 0x1234);
        assert_eq!(ziel[1], i16::from_le_bytes([0xCD, 0xAB]));
    }

    #[test]
    fn dauer_rechnung() {
        let p = puffer();
        // 8000 Hz * 2 Bytes = 16 Bytes pro Millisekunde
        p.anhaengen(&vec![0u8; 160]);
        assert_eq!(p.dauer_ms(), 10);
    }

    #[test]
    fn ueberlauf_leert_komplett_statt_teiltrim() {
        let p = puffer();
        // Dauer-Grenze: 100 ms = 1600 Bytes
        p.anhaengen(&vec![1u8; 1600]);
        assert_eq!(p.laenge_bytes(), 1600);

        p.anhaengen(&vec![2u8; 160]);
        // Kein Teil-Trim: nur die neuen 160 Bytes bleiben
        assert_eq!(p.laenge_bytes(), 160);
        let mut ziel = [0i16; 1];
        p.entnehmen(&mut ziel);
        assert_eq!(ziel[0], i16::from_le_bytes([2, 2]));
    }

    #[test]
    fn grosser_schub_auf_vollen_puffer() {
        let p = puffer();
        p.anhaengen(&vec![1u8; 1600]); // 100 ms, Puffer "voll"
        p.anhaengen(&vec![2u8; 4200]); // ein grosser Read vom Modem
        // Geleert, dann angehaengt; Kapazitaet nie ueberschritten
        assert!(p.laenge_bytes() <= 4096);
        assert_eq!(p.laenge_bytes(), 4096);
        let mut ziel = [0i16; 1];
        p.entnehmen(&mut ziel);
        assert_eq!(ziel[0], i16::from_le_bytes([2, 2]));
    }

    #[test]
    fn dauer_grenze_wird_nie_ueberschritten() {
        let p = puffer();
        for _ in 0..50 {
            p.anhaengen(&vec![0u8; 320]);
            assert!(p.dauer_ms() <= 100, "Dauergrenze verletzt: {} ms", p.dauer_ms());
        }
    }

    #[test]
    fn spielt_flag_folgt_entnahme() {
        let p = puffer();
        assert!(!p.spielt());

        p.anhaengen(&[1, 2, 3, 4]);
        let mut ziel = [0i16; 2];
        p.entnehmen(&mut ziel);
        assert!(p.spielt(), "Nach erfolgreicher Entnahme spielt die Wiedergabe");

        // Puffer leer: naechste Entnahme liefert nichts
        let n = p.entnehmen(&mut ziel);
        assert_eq!(n, 0);
        assert!(!p.spielt(), "Ohne Samples ist die Wiedergabe still");
    }

    #[test]
    fn leeren_verwirft_alles() {
        let p = puffer();
        p.anhaengen(&[1, 2, 3, 4]);
        p.leeren();
        assert_eq!(p.laenge_bytes(), 0);
    }

    #[test]
    fn ungerades_byte_bleibt_liegen() {
        let p = puffer();
        p.anhaengen(&[1, 2, 3]);
        let mut ziel = [0i16; 4];
        let n = p.entnehmen(&mut ziel);
        assert_eq!(n, 1, "Nur vollstaendige Sample-Paare werden entnommen");
        assert_eq!(p.laenge_bytes(), 1);
    }
}
