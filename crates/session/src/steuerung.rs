//! Anruf-Zustandsmaschine
//!
//! Einziger Ort, an dem Zustandswechsel stattfinden. Der Lebenslauf
//! eines Anrufs ist einbahnig:
//! `Leerlauf -> Aufbau -> Aktiv -> Abbau -> Beendet`, mit dem
//! Fehlerpfad direkt in den Abbau. Die Ueberwachung waehrend `Aktiv`
//! arbeitet rein pollend und blockiert nie auf I/O; wer zuerst
//! abbricht (Gegenseite, lokale Seite oder Kanalfehler), gewinnt.

use crossbeam_channel::Receiver;
use fernruf_core::{AnrufRichtung, AnrufZustand, DtmfTon, ModemEvent, SerielleLeitung};
use fernruf_modem::KommandoKanal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::eingabe::LokaleEingabe;
use crate::error::{SessionError, SessionResult};
use crate::session::AnrufSession;

/// Ruhezeit nach dem Leeren der Portpuffer, bevor Kommandos fliessen
pub const PORT_RUHEZEIT: Duration = Duration::from_millis(300);

/// Abfrage-Intervall der Ueberwachungsschleife
const UEBERWACHUNGS_INTERVALL: Duration = Duration::from_millis(10);

/// Marker, mit denen das Modem ein Gespraechsende meldet
const ABSCHLUSS_MARKER: [&str; 3] = ["NO CARRIER", "BUSY", "ERROR"];

/// Groesse des Fensters, in dem Notifikations-Fragmente
/// zusammengesetzt werden (Bytes)
const NOTIFIKATIONS_FENSTER: usize = 64;

/// Feste Konfigurationssequenz vor jedem Anruf
const KONFIG_SEQUENZ: [&str; 6] = [
    "AT+CGREG=0",
    "AT+CECM=7",
    "AT+CECWB=0x0800",
    "AT+CMICGAIN=5",
    "AT+COUTGAIN=4",
    "AT+CNSN=0x1000",
];

/// Grund, aus dem die Ueberwachung ein Gespraech beendet hat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbbruchGrund {
    /// Das Modem hat ein Gespraechsende gemeldet (NO CARRIER, BUSY, ERROR)
    Gegenseite,
    /// Lokales Auflegen oder Stop-Signal
    Lokal,
    /// Lesefehler auf dem Kommandokanal
    KanalFehler,
}

impl std::fmt::Display for AbbruchGrund {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AbbruchGrund::Gegenseite => "gegenseite",
            AbbruchGrund::Lokal => "lokal",
            AbbruchGrund::KanalFehler => "kanalfehler",
        };
        f.write_str(s)
    }
}

/// Zustandsmaschine eines Anrufversuchs
pub struct AnrufSteuerung {
    session: AnrufSession,
    zustand: AnrufZustand,
    kanal: KommandoKanal,
    ereignisse: Receiver<ModemEvent>,
    eingaben: Receiver<LokaleEingabe>,
    stop: Arc<AtomicBool>,
    port_ruhe: Duration,
}

impl AnrufSteuerung {
    pub fn neu(
        session: AnrufSession,
        kanal: KommandoKanal,
        ereignisse: Receiver<ModemEvent>,
        eingaben: Receiver<LokaleEingabe>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self::mit_port_ruhe(session, kanal, ereignisse, eingaben, stop, PORT_RUHEZEIT)
    }

    pub fn mit_port_ruhe(
        session: AnrufSession,
        kanal: KommandoKanal,
        ereignisse: Receiver<ModemEvent>,
        eingaben: Receiver<LokaleEingabe>,
        stop: Arc<AtomicBool>,
        port_ruhe: Duration,
    ) -> Self {
        Self {
            session,
            zustand: AnrufZustand::Leerlauf,
            kanal,
            ereignisse,
            eingaben,
            stop,
            port_ruhe,
        }
    }

    pub fn zustand(&self) -> AnrufZustand {
        self.zustand
    }

    /// Baut die Verbindung auf: `Leerlauf -> Aufbau -> Aktiv`.
    ///
    /// Leert zuerst beide Leitungspuffer und wartet die Port-Ruhezeit,
    /// dann laeuft die feste Konfigurationssequenz, das Wahlkommando
    /// (`ATD<nr>;` bzw. `ATA`) und zuletzt `AT+CPCMREG=1` fuer den
    /// PCM-Audiomodus. Auf eine Modem-Bestaetigung wird bewusst nicht
    /// gewartet; die Ruhezeiten des Kommandokanals sind die einzige
    /// Taktung.
    pub fn aufbauen(&mut self, audio_leitung: &mut dyn SerielleLeitung) -> SessionResult<()> {
        self.wechseln(AnrufZustand::Aufbau)?;

        self.kanal.puffer_leeren()?;
        audio_leitung.puffer_leeren()?;
        std::thread::sleep(self.port_ruhe);

        for kommando in KONFIG_SEQUENZ {
            self.kanal.senden(kommando)?;
        }

        let aktion = match (&self.session.richtung, &self.session.nummer) {
            (AnrufRichtung::Ausgehend, Some(nummer)) => format!("ATD{nummer};"),
            (AnrufRichtung::Ausgehend, None) => {
                return Err(SessionError::UngueltigerZustand(self.zustand))
            }
            (AnrufRichtung::Eingehend, _) => "ATA".to_string(),
        };
        self.kanal.senden(&aktion)?;
        self.kanal.senden("AT+CPCMREG=1")?;

        self.wechseln(AnrufZustand::Aktiv)?;
        info!(session = %self.session.id, richtung = ?self.session.richtung, "Gespraech aktiv");
        Ok(())
    }

    /// Ueberwacht ein aktives Gespraech bis zum ersten Abbruchausloeser.
    ///
    /// Pollt alle 10 ms, ohne je auf I/O zu blockieren: Modem-Ereignisse
    /// (Fragmente werden per Konkatenation in einem begrenzten Fenster
    /// zusammengesetzt und auf die Abschlussmarker geprueft), lokale
    /// Eingaben (Auflegen bzw. DTMF) und das Stop-Signal. Der erste
    /// Ausloeser gewinnt; die Zustandsmaschine bleibt bis zum `abbauen`
    /// in `Aktiv`.
    pub fn ueberwachen(&mut self) -> AbbruchGrund {
        let mut fenster = String::new();

        loop {
            if self.zustand != AnrufZustand::Aktiv || self.stop.load(Ordering::SeqCst) {
                info!("Ueberwachung lokal beendet");
                return AbbruchGrund::Lokal;
            }

            while let Ok(ereignis) = self.ereignisse.try_recv() {
                match ereignis {
                    ModemEvent::Notifikation(fragment) => {
                        fenster.push_str(&fragment);
                        fenster_begrenzen(&mut fenster);
                        if let Some(marker) =
                            ABSCHLUSS_MARKER.iter().find(|m| fenster.contains(*m))
                        {
                            info!(marker, "Gegenseite hat das Gespraech beendet");
                            return AbbruchGrund::Gegenseite;
                        }
                    }
                    ModemEvent::KanalFehler(fehler) => {
                        warn!(%fehler, "Kommandokanal ausgefallen");
                        return AbbruchGrund::KanalFehler;
                    }
                }
            }

            while let Ok(eingabe) = self.eingaben.try_recv() {
                match eingabe {
                    LokaleEingabe::Auflegen => {
                        info!("Lokal aufgelegt");
                        return AbbruchGrund::Lokal;
                    }
                    LokaleEingabe::Ton(zeichen) => match DtmfTon::neu(zeichen) {
                        Ok(ton) => {
                            if let Err(e) = self.ton_senden(ton) {
                                warn!(%ton, fehler = %e, "DTMF-Ton nicht gesendet");
                            }
                        }
                        Err(e) => warn!(fehler = %e, "Eingabe verworfen"),
                    },
                }
            }

            std::thread::sleep(UEBERWACHUNGS_INTERVALL);
        }
    }

    /// Sendet einen DTMF-Ton. Nur im Zustand `Aktiv` erlaubt.
    pub fn ton_senden(&mut self, ton: DtmfTon) -> SessionResult<()> {
        if self.zustand != AnrufZustand::Aktiv {
            return Err(SessionError::UngueltigerZustand(self.zustand));
        }
        self.kanal.senden(&format!("AT+VTS={ton}"))?;
        Ok(())
    }

    /// Baut die Verbindung ab: `-> Abbau -> Beendet`.
    ///
    /// Laeuft auf jedem Ausstiegspfad genau einmal durch. `AT+CHUP` und
    /// `AT+CPCMREG=0,1` gehen ueber den verschluckenden Sendepfad raus,
    /// damit der Abbau auch auf einer toten Leitung zu Ende kommt.
    /// Wiederholte Aufrufe sind wirkungslos.
    pub fn abbauen(&mut self) {
        match self.zustand {
            AnrufZustand::Beendet => return,
            AnrufZustand::Abbau => {}
            _ => self.setzen(AnrufZustand::Abbau),
        }

        self.kanal.senden_stumm("AT+CHUP");
        self.kanal.senden_stumm("AT+CPCMREG=0,1");

        self.setzen(AnrufZustand::Beendet);
        info!(session = %self.session.id, "Gespraech beendet");
    }

    /// Schliesst den Kommandokanal. Idempotent.
    pub fn kanal_schliessen(&mut self) {
        self.kanal.schliessen();
    }

    fn wechseln(&mut self, nach: AnrufZustand) -> SessionResult<()> {
        if !self.zustand.darf_wechseln(nach) {
            return Err(SessionError::UngueltigerWechsel {
                von: self.zustand,
                nach,
            });
        }
        self.setzen(nach);
        Ok(())
    }

    fn setzen(&mut self, nach: AnrufZustand) {
        debug!(von = %self.zustand, nach = %nach, "Zustandswechsel");
        self.zustand = nach;
        *self.session.zustand_handle().write() = nach;
    }
}

/// Haelt das Notifikationsfenster auf seiner Maximalgroesse
fn fenster_begrenzen(fenster: &mut String) {
    if fenster.len() <= NOTIFIKATIONS_FENSTER {
        return;
    }
    let mut grenze = fenster.len() - NOTIFIKATIONS_FENSTER;
    while !fenster.is_char_boundary(grenze) {
        grenze += 1;
    }
    fenster.drain(..grenze);
}
