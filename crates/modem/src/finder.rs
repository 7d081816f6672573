//! Port-Suche fuer das Modem
//!
//! Ordnet den beiden logischen Rollen "Kommandoleitung" und
//! "Audioleitung" die OS-Portnamen zu. Explizit konfigurierte Namen
//! gewinnen; sonst wird per USB-Kennung enumeriert. SIM7600-Modems
//! melden sich mit VID 0x1E0E / PID 0x9005 und exponieren die
//! AT-Schnittstelle auf USB-Interface 2, den PCM-Audiostrom auf
//! Interface 4.

use serialport::{SerialPortType, UsbPortInfo};
use tracing::{debug, info};

use crate::error::{ModemError, ModemResult};

/// USB Vendor-ID der SIMCOM-Modems
pub const SIMCOM_VID: u16 = 0x1E0E;
/// USB Product-ID des SIM7600
pub const SIM7600_PID: u16 = 0x9005;

const AT_INTERFACE: u8 = 2;
const AUDIO_INTERFACE: u8 = 4;

/// Aufgeloeste Portnamen fuer beide Rollen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRollen {
    /// OS-Name der Kommandoleitung (AT)
    pub kommando: String,
    /// OS-Name der Audioleitung (PCM)
    pub audio: String,
}

/// Sucht die seriellen Ports des Modems
#[derive(Debug, Default)]
pub struct PortFinder {
    /// Explizit konfigurierter Kommando-Port (ueberstimmt die Suche)
    pub kommando_port: Option<String>,
    /// Explizit konfigurierter Audio-Port (ueberstimmt die Suche)
    pub audio_port: Option<String>,
}

impl PortFinder {
    /// Loest beide Rollen auf.
    ///
    /// Wird einmal beim Sitzungsstart aufgerufen. Schlaegt mit
    /// `PortsNichtGefunden` fehl wenn keine vollstaendige Zuordnung
    /// moeglich ist.
    pub fn aufloesen(&self) -> ModemResult<PortRollen> {
        if let (Some(kommando), Some(audio)) = (&self.kommando_port, &self.audio_port) {
            info!(kommando, audio, "Ports aus Konfiguration uebernommen");
            return Ok(PortRollen {
                kommando: kommando.clone(),
                audio: audio.clone(),
            });
        }

        let ports = serialport::available_ports().map_err(|e| {
            debug!(fehler = %e, "Port-Enumeration fehlgeschlagen");
            ModemError::PortsNichtGefunden
        })?;

        let mut kandidaten: Vec<(String, UsbPortInfo)> = Vec::new();
        for port in ports {
            if let SerialPortType::UsbPort(usb) = port.port_type {
                if usb.vid == SIMCOM_VID && usb.pid == SIM7600_PID {
                    kandidaten.push((port.port_name, usb));
                }
            }
        }
        kandidaten.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(anzahl = kandidaten.len(), "Modem-Ports gefunden");

        let kommando = self
            .kommando_port
            .clone()
            .or_else(|| rolle_suchen(&kandidaten, AT_INTERFACE))
            .ok_or(ModemError::PortsNichtGefunden)?;
        let audio = self
            .audio_port
            .clone()
            .or_else(|| rolle_suchen(&kandidaten, AUDIO_INTERFACE))
            .ok_or(ModemError::PortsNichtGefunden)?;

        if kommando == audio {
            return Err(ModemError::PortsNichtGefunden);
        }

        info!(kommando, audio, "Modem-Ports zugeordnet");
        Ok(PortRollen { kommando, audio })
    }
}

/// Sucht den Port mit der gegebenen USB-Interface-Nummer.
///
/// Manche Plattformen liefern keine Interface-Nummern; dann wird auf
/// die Position in der (nach Namen sortierten) Kandidatenliste
/// zurueckgegriffen.
fn rolle_suchen(kandidaten: &[(String, UsbPortInfo)], interface: u8) -> Option<String> {
    if let Some((name, _)) = kandidaten
        .iter()
        .find(|(_, usb)| usb.interface == Some(interface))
    {
        return Some(name.clone());
    }
    kandidaten
        .get(interface as usize)
        .map(|(name, _)| name.clone())
}
