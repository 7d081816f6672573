//! Konsolen-Menue des Dialers
//!
//! Einfache zeilenbasierte Bedienung: Anruf fuehren, SMS, Rufumleitung
//! und Anklopfen. Waehrend eines Gespraechs liest dieselbe Konsole
//! DTMF-Eingaben und das Auflege-Kommando; der eigentliche Anruf laeuft
//! auf einem Arbeiter-Thread, damit die Eingabe fluessig bleibt.

use anyhow::Result;
use crossbeam_channel::unbounded;
use fernruf_core::{ModemEvent, Rufnummer};
use fernruf_modem::dienste::{self, UmleitungsGrund};
use fernruf_modem::{sms, EchteLeitung, KommandoKanal, PortFinder};
use fernruf_session::{zeile_uebersetzen, AnrufSession, LokaleEingabe, SessionSupervisor};
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::DialerConfig;

/// Wartezeit auf Modem-Antworten bei Einmal-Diensten
const ANTWORT_WARTEZEIT: Duration = Duration::from_millis(500);

type Zeilen = std::io::Lines<std::io::StdinLock<'static>>;

pub struct Menue {
    config: DialerConfig,
}

impl Menue {
    pub fn neu(config: DialerConfig) -> Self {
        Self { config }
    }

    /// Hauptschleife: liest Menuewahlen bis `q` oder Konsolenende
    pub fn ausfuehren(&self) -> Result<()> {
        let mut zeilen = std::io::stdin().lock().lines();
        loop {
            println!();
            println!("--- Fernruf ---");
            println!(" 1  Anrufen");
            println!(" 2  Eingehenden Anruf annehmen");
            println!(" 3  SMS senden");
            println!(" 4  SMS lesen");
            println!(" 5  Rufumleitung");
            println!(" 6  Anklopfen");
            println!(" q  Beenden");

            let Some(wahl) = frage("> ", &mut zeilen)? else {
                break;
            };
            let ergebnis = match wahl.trim() {
                "1" => self.anrufen(&mut zeilen),
                "2" => self.annehmen(&mut zeilen),
                "3" => self.sms_senden(&mut zeilen),
                "4" => self.sms_lesen(),
                "5" => self.rufumleitung(&mut zeilen),
                "6" => self.anklopfen(&mut zeilen),
                "q" | "Q" => break,
                "" => continue,
                sonst => {
                    println!("Unbekannte Auswahl: {sonst}");
                    Ok(())
                }
            };
            // Fehler einzelner Aktionen beenden das Menue nicht
            if let Err(e) = ergebnis {
                println!("Fehler: {e}");
            }
        }
        info!("Dialer beendet");
        Ok(())
    }

    fn anrufen(&self, zeilen: &mut Zeilen) -> Result<()> {
        let Some(eingabe) = frage("Rufnummer: ", zeilen)? else {
            return Ok(());
        };
        let nummer = match Rufnummer::neu(eingabe.trim()) {
            Ok(n) => n,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };
        let session = AnrufSession::ausgehend(nummer, self.config.anruf.echo_daempfung);
        self.gespraech_fuehren(session, zeilen)
    }

    fn annehmen(&self, zeilen: &mut Zeilen) -> Result<()> {
        let session = AnrufSession::eingehend(self.config.anruf.echo_daempfung);
        self.gespraech_fuehren(session, zeilen)
    }

    /// Fuehrt den Anruf auf einem Arbeiter-Thread und speist waehrend
    /// des Gespraechs die Konsoleneingabe in den Eingabekanal.
    fn gespraech_fuehren(&self, session: AnrufSession, zeilen: &mut Zeilen) -> Result<()> {
        let (eingabe_tx, eingabe_rx) = unbounded();
        let ansicht = session.clone();
        let supervisor_config = self.config.supervisor_config();

        let arbeiter = std::thread::Builder::new()
            .name("fernruf-sitzung".to_string())
            .spawn(move || {
                SessionSupervisor::neu(supervisor_config).anruf_fuehren(session, eingabe_rx)
            })?;

        println!("Im Gespraech: Zeichen senden DTMF, 'h' legt auf, Enter prueft den Status");
        while !arbeiter.is_finished() {
            let Some(zeile) = zeilen.next().transpose()? else {
                let _ = eingabe_tx.send(LokaleEingabe::Auflegen);
                break;
            };
            let mut aufgelegt = false;
            for eingabe in zeile_uebersetzen(&zeile) {
                aufgelegt = eingabe == LokaleEingabe::Auflegen;
                let _ = eingabe_tx.send(eingabe);
            }
            if aufgelegt {
                break;
            }
        }

        match arbeiter.join() {
            Ok(Ok(())) => println!("Gespraech beendet ({})", ansicht.zustand()),
            Ok(Err(e)) => println!("Anruf fehlgeschlagen: {e}"),
            Err(_) => println!("Sitzung unerwartet abgebrochen"),
        }
        Ok(())
    }

    fn sms_senden(&self, zeilen: &mut Zeilen) -> Result<()> {
        let Some(eingabe) = frage("Empfaenger: ", zeilen)? else {
            return Ok(());
        };
        let nummer = match Rufnummer::neu(eingabe.trim()) {
            Ok(n) => n,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };
        let Some(text) = frage("Nachricht: ", zeilen)? else {
            return Ok(());
        };

        let mut kanal = self.kommando_kanal()?;
        sms::sms_senden(&mut kanal, &nummer, &text)?;
        println!("SMS an {nummer} uebergeben");
        Ok(())
    }

    fn sms_lesen(&self) -> Result<()> {
        let mut kanal = self.kommando_kanal()?;
        antworten_zeigen(&mut kanal, |k| sms::alle_sms_lesen(k))
    }

    fn rufumleitung(&self, zeilen: &mut Zeilen) -> Result<()> {
        println!(" 1  Immer umleiten");
        println!(" 2  Bei besetzt umleiten");
        println!(" 3  Umleitung aufheben");
        let Some(wahl) = frage("> ", zeilen)? else {
            return Ok(());
        };

        let mut kanal = self.kommando_kanal()?;
        match wahl.trim() {
            "1" | "2" => {
                let grund = if wahl.trim() == "1" {
                    UmleitungsGrund::Unbedingt
                } else {
                    UmleitungsGrund::Besetzt
                };
                let Some(eingabe) = frage("Zielnummer: ", zeilen)? else {
                    return Ok(());
                };
                let nummer = match Rufnummer::neu(eingabe.trim()) {
                    Ok(n) => n,
                    Err(e) => {
                        println!("{e}");
                        return Ok(());
                    }
                };
                dienste::rufumleitung_aktivieren(&mut kanal, grund, &nummer)?;
                println!("Umleitung nach {nummer} aktiviert");
            }
            "3" => {
                dienste::rufumleitung_deaktivieren(&mut kanal, UmleitungsGrund::Unbedingt)?;
                dienste::rufumleitung_deaktivieren(&mut kanal, UmleitungsGrund::Besetzt)?;
                println!("Umleitungen aufgehoben");
            }
            sonst => println!("Unbekannte Auswahl: {sonst}"),
        }
        Ok(())
    }

    fn anklopfen(&self, zeilen: &mut Zeilen) -> Result<()> {
        println!(" 1  Einschalten");
        println!(" 2  Ausschalten");
        println!(" 3  Status abfragen");
        let Some(wahl) = frage("> ", zeilen)? else {
            return Ok(());
        };

        let mut kanal = self.kommando_kanal()?;
        match wahl.trim() {
            "1" => dienste::anklopfen_setzen(&mut kanal, true)?,
            "2" => dienste::anklopfen_setzen(&mut kanal, false)?,
            "3" => return antworten_zeigen(&mut kanal, |k| dienste::anklopfen_abfragen(k)),
            sonst => println!("Unbekannte Auswahl: {sonst}"),
        }
        Ok(())
    }

    /// Oeffnet den Kommando-Port fuer Einmal-Dienste ausserhalb eines
    /// Gespraechs
    fn kommando_kanal(&self) -> Result<KommandoKanal> {
        let finder = PortFinder {
            kommando_port: self.config.seriell.kommando_port.clone(),
            audio_port: self.config.seriell.audio_port.clone(),
        };
        let rollen = finder.aufloesen()?;
        let leitung = EchteLeitung::oeffnen(&rollen.kommando, self.config.seriell.baud)?;
        Ok(KommandoKanal::mit_ruhezeit(
            Box::new(leitung),
            self.config.kommando_pause(),
        ))
    }
}

/// Gibt einen Prompt aus und liest die naechste Zeile.
/// `None` bedeutet Konsolenende.
fn frage(prompt: &str, zeilen: &mut Zeilen) -> Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(zeilen.next().transpose()?)
}

/// Fuehrt eine Aktion aus und zeigt die danach eingehenden
/// Modem-Antworten an
fn antworten_zeigen(
    kanal: &mut KommandoKanal,
    aktion: impl FnOnce(&mut KommandoKanal) -> fernruf_modem::ModemResult<()>,
) -> Result<()> {
    let (tx, rx) = unbounded();
    let stop = Arc::new(AtomicBool::new(false));
    kanal.lauscher_starten(tx, Arc::clone(&stop))?;

    aktion(kanal)?;
    std::thread::sleep(ANTWORT_WARTEZEIT);
    stop.store(true, Ordering::SeqCst);

    for ereignis in rx.try_iter() {
        match ereignis {
            ModemEvent::Notifikation(text) => print!("{text}"),
            ModemEvent::KanalFehler(fehler) => println!("Kanalfehler: {fehler}"),
        }
    }
    println!();
    Ok(())
}
