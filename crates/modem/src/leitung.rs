//! Echte serielle Leitung via serialport
//!
//! Implementiert `SerielleLeitung` ueber das serialport-Crate. Reads sind
//! poll-basiert: der Port-Timeout steht auf praktisch null, WouldBlock und
//! TimedOut werden als "nichts da" gemeldet statt als Fehler.

use fernruf_core::SerielleLeitung;
use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::debug;

use crate::error::{ModemError, ModemResult};

/// Serielle Leitung auf einem echten OS-Port
pub struct EchteLeitung {
    port: Box<dyn SerialPort>,
}

impl EchteLeitung {
    /// Oeffnet den Port exklusiv mit der gegebenen Baudrate.
    ///
    /// Schlaegt mit `PortNichtVerfuegbar` fehl wenn das Geraet nicht
    /// belegt werden kann.
    pub fn oeffnen(port_name: &str, baud: u32) -> ModemResult<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(1))
            .open()
            .map_err(|e| {
                ModemError::PortNichtVerfuegbar(format!("{port_name}: {e}"))
            })?;
        debug!(port = port_name, baud, "Serieller Port geoeffnet");
        Ok(Self { port })
    }
}

impl SerielleLeitung for EchteLeitung {
    fn schreiben(&mut self, daten: &[u8]) -> io::Result<()> {
        self.port.write_all(daten)?;
        self.port.flush()
    }

    fn lesen(&mut self, puffer: &mut [u8]) -> io::Result<usize> {
        match self.port.read(puffer) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    fn verfuegbar(&self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::other)
    }

    fn puffer_leeren(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::All).map_err(io::Error::other)
    }

    fn klonen(&self) -> io::Result<Box<dyn SerielleLeitung>> {
        let port = self.port.try_clone().map_err(io::Error::other)?;
        Ok(Box::new(EchteLeitung { port }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oeffnen_nicht_existenter_port() {
        let result = EchteLeitung::oeffnen("/dev/gibt-es-nicht", 115_200);
        match result {
            Err(ModemError::PortNichtVerfuegbar(beschreibung)) => {
                assert!(beschreibung.contains("/dev/gibt-es-nicht"));
            }
            _ => panic!("PortNichtVerfuegbar erwartet"),
        }
    }
}
