//! Netzdienste: Rufumleitung und Anklopfen
//!
//! Einfache Einmal-Austausche ohne eigene Zustandslogik. Antworten
//! kommen ueber den Notifikationsstrom.

use fernruf_core::Rufnummer;

use crate::error::ModemResult;
use crate::kommando::KommandoKanal;

/// Grund fuer eine Rufumleitung (AT+CCFC Reason-Code)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UmleitungsGrund {
    /// Immer umleiten
    Unbedingt = 0,
    /// Nur bei besetzt umleiten
    Besetzt = 1,
}

/// Aktiviert eine Rufumleitung auf die Zielnummer
pub fn rufumleitung_aktivieren(
    kanal: &mut KommandoKanal,
    grund: UmleitungsGrund,
    ziel: &Rufnummer,
) -> ModemResult<()> {
    // Mode 3 = registrieren und aktivieren
    kanal.senden(&format!(
        "AT+CCFC={},3,\"{}\"",
        grund as u8,
        ziel.als_str()
    ))?;
    Ok(())
}

/// Deaktiviert eine Rufumleitung
pub fn rufumleitung_deaktivieren(
    kanal: &mut KommandoKanal,
    grund: UmleitungsGrund,
) -> ModemResult<()> {
    kanal.senden(&format!("AT+CCFC={},0", grund as u8))?;
    Ok(())
}

/// Schaltet Anklopfen ein oder aus (inklusive Netz-Notifikation)
pub fn anklopfen_setzen(kanal: &mut KommandoKanal, aktiv: bool) -> ModemResult<()> {
    let modus = if aktiv { 1 } else { 0 };
    kanal.senden(&format!("AT+CCWA=1,{modus},1"))?;
    Ok(())
}

/// Fragt den Anklopfen-Status ab (Antwort via Notifikationsstrom)
pub fn anklopfen_abfragen(kanal: &mut KommandoKanal) -> ModemResult<()> {
    kanal.senden("AT+CCWA=1,2")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fernruf_core::{SerielleLeitung, SpeicherLeitung};
    use std::time::Duration;

    fn aufbau() -> (KommandoKanal, SpeicherLeitung) {
        let (host, modem) = SpeicherLeitung::paar();
        let kanal = KommandoKanal::mit_ruhezeit(Box::new(host), Duration::from_millis(1));
        (kanal, modem)
    }

    fn empfangen(modem: &mut SpeicherLeitung) -> String {
        let mut puffer = [0u8; 256];
        let n = modem.lesen(&mut puffer).unwrap();
        String::from_utf8_lossy(&puffer[..n]).into_owned()
    }

    #[test]
    fn umleitung_unbedingt_aktivieren() {
        let (mut kanal, mut modem) = aufbau();
        let ziel = Rufnummer::neu("5550000").unwrap();
        rufumleitung_aktivieren(&mut kanal, UmleitungsGrund::Unbedingt, &ziel).unwrap();
        assert_eq!(empfangen(&mut modem), "AT+CCFC=0,3,\"5550000\"\r");
    }

    #[test]
    fn umleitung_besetzt_deaktivieren() {
        let (mut kanal, mut modem) = aufbau();
        rufumleitung_deaktivieren(&mut kanal, UmleitungsGrund::Besetzt).unwrap();
        assert_eq!(empfangen(&mut modem), "AT+CCFC=1,0\r");
    }

    #[test]
    fn anklopfen_ein_und_aus() {
        let (mut kanal, mut modem) = aufbau();
        anklopfen_setzen(&mut kanal, true).unwrap();
        assert_eq!(empfangen(&mut modem), "AT+CCWA=1,1,1\r");
        anklopfen_setzen(&mut kanal, false).unwrap();
        assert_eq!(empfangen(&mut modem), "AT+CCWA=1,0,1\r");
    }

    #[test]
    fn anklopfen_statusabfrage() {
        let (mut kanal, mut modem) = aufbau();
        anklopfen_abfragen(&mut kanal).unwrap();
        assert_eq!(empfangen(&mut modem), "AT+CCWA=1,2\r");
    }
}
