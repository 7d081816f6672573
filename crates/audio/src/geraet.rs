//! Audio-Geraete-Auswahl via cpal
//!
//! Laedt das gewuenschte Ein-/Ausgabegeraet anhand eines
//! Namens-Teilstrings oder faellt auf das Standardgeraet zurueck.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;
use tracing::debug;

use crate::error::{AudioError, AudioResult};

/// Laedt ein cpal-Eingabegeraet (None = Standardgeraet)
pub fn eingabegeraet_laden(name: Option<&str>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or(AudioError::KeinStandardEingabegeraet),
        Some(n) => {
            let geraete = host
                .input_devices()
                .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
            for geraet in geraete {
                if let Ok(geraet_name) = geraet.name() {
                    if geraet_name.contains(n) {
                        debug!(name = geraet_name, "Eingabegeraet gewaehlt");
                        return Ok(geraet);
                    }
                }
            }
            Err(AudioError::GeraetNichtVerfuegbar(n.to_string()))
        }
    }
}

/// Laedt ein cpal-Ausgabegeraet (None = Standardgeraet)
pub fn ausgabegeraet_laden(name: Option<&str>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or(AudioError::KeinStandardAusgabegeraet),
        Some(n) => {
            let geraete = host
                .output_devices()
                .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
            for geraet in geraete {
                if let Ok(geraet_name) = geraet.name() {
                    if geraet_name.contains(n) {
                        debug!(name = geraet_name, "Ausgabegeraet gewaehlt");
                        return Ok(geraet);
                    }
                }
            }
            Err(AudioError::GeraetNichtVerfuegbar(n.to_string()))
        }
    }
}
