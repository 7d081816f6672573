//! SMS-Versand und -Abruf im Textmodus
//!
//! Einfache Einmal-Austausche auf dem Kommandokanal. Die Antworten des
//! Modems (gespeicherte Nachrichten, Sendebestaetigung) kommen wie alle
//! Antworten ueber den Notifikationsstrom und werden dort angezeigt.

use fernruf_core::Rufnummer;

use crate::error::ModemResult;
use crate::kommando::KommandoKanal;

/// SMS-Nachrichtenende im Textmodus (Ctrl+Z)
const NACHRICHTEN_ENDE: u8 = 0x1A;

/// Sendet eine SMS im Textmodus.
///
/// `AT+CMGF=1` schaltet den Textmodus ein, `AT+CMGS` oeffnet den
/// Eingabemodus; der Nachrichtentext selbst und das abschliessende
/// Ctrl+Z gehen als Rohbytes auf die Leitung (kein AT-Terminator,
/// keine Ruhezeit).
pub fn sms_senden(kanal: &mut KommandoKanal, empfaenger: &Rufnummer, text: &str) -> ModemResult<()> {
    kanal.senden("AT+CMGF=1")?;
    kanal.senden(&format!("AT+CMGS=\"{}\"", empfaenger.als_str()))?;
    kanal.roh_schreiben(text.as_bytes())?;
    kanal.roh_schreiben(&[NACHRICHTEN_ENDE])?;
    Ok(())
}

/// Fragt alle gespeicherten SMS ab (Ausgabe via Notifikationsstrom)
pub fn alle_sms_lesen(kanal: &mut KommandoKanal) -> ModemResult<()> {
    kanal.senden("AT+CMGF=1")?;
    kanal.senden("AT+CMGL=\"ALL\"")?;
    Ok(())
}

/// Loescht eine gespeicherte SMS anhand ihres Speicherindex
pub fn sms_loeschen(kanal: &mut KommandoKanal, index: u32) -> ModemResult<()> {
    kanal.senden(&format!("AT+CMGD={index}"))?;
    Ok(())
}
