//! Pegel-Anpassung fuer die Echodaempfung
//!
//! Die einzige Echo-Strategie des Systems: der Mikrofonpfad wird
//! abgesenkt solange der Lautsprecherpfad Ton produziert. Kein echtes
//! AEC – eine bewusst grobe Halbduplex-Naeherung.

use std::sync::atomic::{AtomicU32, Ordering};

/// Skaliert 16-bit-signed-little-endian-Samples in place.
///
/// Multipliziert jeden Sample-Wert in f32 mit dem Faktor und schneidet
/// zurueck auf i16: Nachkommastellen werden verworfen, kein Runden.
/// Faktoren ueber 1.0 koennen den Wertebereich verlassen und wrappen –
/// der beobachtete Bereich ist 0..=1, die Invariante wird nicht geprueft.
pub fn daempfen(daten: &mut [u8], faktor: f32) {
    for paar in daten.chunks_exact_mut(2) {
        let sample = i16::from_le_bytes([paar[0], paar[1]]);
        let skaliert = ((sample as f32 * faktor) as i32) as i16;
        paar.copy_from_slice(&skaliert.to_le_bytes());
    }
}

/// Geteilte Echodaempfungs-Stellgroesse
///
/// Der Faktor liegt als f32-Bitmuster in einem `AtomicU32`, damit der
/// Sende-Arbeiter ihn ohne Lock lesen kann. `setzen` wirkt sofort, ohne
/// Neustart der Bruecke.
#[derive(Debug)]
pub struct EchoDaempfung {
    faktor_bits: AtomicU32,
}

impl EchoDaempfung {
    /// Erstellt die Stellgroesse mit dem gegebenen Startfaktor (0.0–1.0)
    pub fn neu(faktor: f32) -> Self {
        Self {
            faktor_bits: AtomicU32::new(faktor.to_bits()),
        }
    }

    /// Setzt den Daempfungsfaktor
    pub fn setzen(&self, faktor: f32) {
        self.faktor_bits.store(faktor.to_bits(), Ordering::Relaxed);
    }

    /// Gibt den aktuellen Daempfungsfaktor zurueck
    pub fn faktor(&self) -> f32 {
        f32::from_bits(self.faktor_bits.load(Ordering::Relaxed))
    }
}

impl Default for EchoDaempfung {
    fn default() -> Self {
        Self::neu(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn als_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn als_samples(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|p| i16::from_le_bytes([p[0], p[1]]))
            .collect()
    }

    #[test]
    fn halber_pegel() {
        let mut daten = als_bytes(&[1000, -2000, 5]);
        daempfen(&mut daten, 0.5);
        assert_eq!(als_samples(&daten), vec![500, -1000, 2]);
    }

    #[test]
    fn faktor_eins_ist_identitaet() {
        let original = [i16::MAX, i16::MIN, 0, -1, 12345];
        let mut daten = als_bytes(&original);
        daempfen(&mut daten, 1.0);
        assert_eq!(als_samples(&daten), original.to_vec());
    }

    #[test]
    fn nachkommastellen_werden_abgeschnitten() {
        // 3 * 0.5 = 1.5 -> 1 (kein Runden auf 2)
        let mut daten = als_bytes(&[3, -3]);
        daempfen(&mut daten, 0.5);
        assert_eq!(als_samples(&daten), vec![1, -1]);
    }

    #[test]
    fn nullsamples_bleiben_null() {
        let mut daten = als_bytes(&[0, 0, 0, 0]);
        daempfen(&mut daten, 0.5);
        assert_eq!(als_samples(&daten), vec![0, 0, 0, 0]);
    }

    #[test]
    fn faktor_null_ist_stille() {
        let mut daten = als_bytes(&[i16::MAX, -1234]);
        daempfen(&mut daten, 0.0);
        assert_eq!(als_samples(&daten), vec![0, 0]);
    }

    #[test]
    fn stellgroesse_setzen_und_lesen() {
        let d = EchoDaempfung::neu(0.5);
        assert!((d.faktor() - 0.5).abs() < f32::EPSILON);
        d.setzen(0.25);
        assert!((d.faktor() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn standardfaktor() {
        let d = EchoDaempfung::default();
        assert!((d.faktor() - 0.5).abs() < f32::EPSILON);
    }
}
