//! Abstraktion der seriellen Leitung
//!
//! Kommandokanal und Audio-Bruecke arbeiten gegen diesen Trait statt
//! direkt gegen das Betriebssystem. Die echte Implementierung (serialport)
//! liegt in fernruf-modem; die `SpeicherLeitung` hier dient Tests und
//! Loopback-Betrieb ohne Hardware.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Eine bidirektionale serielle Leitung
///
/// `lesen` blockiert nie: sind keine Bytes vorhanden, gibt es 0 zurueck.
/// `klonen` liefert ein zweites Handle auf dieselbe Leitung, damit ein
/// Lese-Thread unabhaengig vom Schreibpfad arbeiten kann.
pub trait SerielleLeitung: Send {
    /// Schreibt alle Bytes auf die Leitung
    fn schreiben(&mut self, daten: &[u8]) -> io::Result<()>;

    /// Liest verfuegbare Bytes, ohne zu blockieren. 0 = nichts da.
    fn lesen(&mut self, puffer: &mut [u8]) -> io::Result<usize>;

    /// Anzahl der aktuell lesbaren Bytes
    fn verfuegbar(&self) -> io::Result<usize>;

    /// Verwirft Ein- und Ausgabepuffer der Leitung
    fn puffer_leeren(&mut self) -> io::Result<()>;

    /// Zweites Handle auf dieselbe Leitung
    fn klonen(&self) -> io::Result<Box<dyn SerielleLeitung>>;
}

/// Eine Richtung der Speicher-Pipe
#[derive(Default)]
struct Ader {
    daten: Mutex<VecDeque<u8>>,
}

/// In-Memory-Leitung fuer Tests und Loopback
///
/// `SpeicherLeitung::paar()` liefert zwei Enden: was das eine Ende
/// schreibt, liest das andere. Ueber `fehler_ausloesen` laesst sich ein
/// I/O-Fehler auf diesem Ende simulieren (alle folgenden Operationen
/// schlagen fehl).
pub struct SpeicherLeitung {
    eingang: Arc<Ader>,
    ausgang: Arc<Ader>,
    fehler: Arc<AtomicBool>,
}

impl SpeicherLeitung {
    /// Erstellt ein verbundenes Leitungspaar
    pub fn paar() -> (SpeicherLeitung, SpeicherLeitung) {
        let hin = Arc::new(Ader::default());
        let rueck = Arc::new(Ader::default());
        let a = SpeicherLeitung {
            eingang: Arc::clone(&rueck),
            ausgang: Arc::clone(&hin),
            fehler: Arc::new(AtomicBool::new(false)),
        };
        let b = SpeicherLeitung {
            eingang: hin,
            ausgang: rueck,
            fehler: Arc::new(AtomicBool::new(false)),
        };
        (a, b)
    }

    /// Simuliert einen Leitungsfehler auf diesem Ende
    pub fn fehler_ausloesen(&self) {
        self.fehler.store(true, Ordering::SeqCst);
    }

    fn pruefen(&self) -> io::Result<()> {
        if self.fehler.load(Ordering::SeqCst) {
            Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "Leitung unterbrochen",
            ))
        } else {
            Ok(())
        }
    }
}

impl SerielleLeitung for SpeicherLeitung {
    fn schreiben(&mut self, daten: &[u8]) -> io::Result<()> {
        self.pruefen()?;
        self.ausgang.daten.lock().extend(daten.iter().copied());
        Ok(())
    }

    fn lesen(&mut self, puffer: &mut [u8]) -> io::Result<usize> {
        self.pruefen()?;
        let mut eingang = self.eingang.daten.lock();
        let n = puffer.len().min(eingang.len());
        for ziel in puffer.iter_mut().take(n) {
            // n <= eingang.len(), pop_front kann nicht leerlaufen
            *ziel = eingang.pop_front().unwrap_or(0);
        }
        Ok(n)
    }

    fn verfuegbar(&self) -> io::Result<usize> {
        self.pruefen()?;
        Ok(self.eingang.daten.lock().len())
    }

    fn puffer_leeren(&mut self) -> io::Result<()> {
        self.pruefen()?;
        self.eingang.daten.lock().clear();
        self.ausgang.daten.lock().clear();
        Ok(())
    }

    fn klonen(&self) -> io::Result<Box<dyn SerielleLeitung>> {
        self.pruefen()?;
        Ok(Box::new(SpeicherLeitung {
            eingang: Arc::clone(&self.eingang),
            ausgang: Arc::clone(&self.ausgang),
            fehler: Arc::clone(&self.fehler),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paar_uebertraegt_in_beide_richtungen() {
        let (mut a, mut b) = SpeicherLeitung::paar();
        a.schreiben(b"ATD5551234;\r").unwrap();
        let mut puffer = [0u8; 32];
        let n = b.lesen(&mut puffer).unwrap();
        assert_eq!(&puffer[..n], b"ATD5551234;\r");

        b.schreiben(b"OK\r\n").unwrap();
        let n = a.lesen(&mut puffer).unwrap();
        assert_eq!(&puffer[..n], b"OK\r\n");
    }

    #[test]
    fn lesen_ohne_daten_gibt_null() {
        let (mut a, _b) = SpeicherLeitung::paar();
        let mut puffer = [0u8; 8];
        assert_eq!(a.lesen(&mut puffer).unwrap(), 0);
    }

    #[test]
    fn verfuegbar_zaehlt_bytes() {
        let (mut a, b) = SpeicherLeitung::paar();
        assert_eq!(b.verfuegbar().unwrap(), 0);
        a.schreiben(&[1, 2, 3]).unwrap();
        assert_eq!(b.verfuegbar().unwrap(), 3);
    }

    #[test]
    fn puffer_leeren_verwirft_beide_seiten() {
        let (mut a, mut b) = SpeicherLeitung::paar();
        a.schreiben(&[1, 2, 3]).unwrap();
        b.schreiben(&[4, 5]).unwrap();
        a.puffer_leeren().unwrap();
        assert_eq!(a.verfuegbar().unwrap(), 0);
        assert_eq!(b.verfuegbar().unwrap(), 0);
    }

    #[test]
    fn klon_liest_dieselbe_leitung() {
        let (mut a, b) = SpeicherLeitung::paar();
        let mut klon = b.klonen().unwrap();
        a.schreiben(b"RING").unwrap();
        let mut puffer = [0u8; 8];
        let n = klon.lesen(&mut puffer).unwrap();
        assert_eq!(&puffer[..n], b"RING");
    }

    #[test]
    fn fehler_macht_alle_operationen_kaputt() {
        let (mut a, _b) = SpeicherLeitung::paar();
        a.fehler_ausloesen();
        assert!(a.schreiben(&[0]).is_err());
        assert!(a.verfuegbar().is_err());
        assert!(a.lesen(&mut [0u8; 1]).is_err());
    }

    #[test]
    fn fehler_wirkt_auch_auf_klone() {
        let (a, _b) = SpeicherLeitung::paar();
        let klon = a.klonen().unwrap();
        a.fehler_ausloesen();
        assert!(klon.verfuegbar().is_err());
    }
}
