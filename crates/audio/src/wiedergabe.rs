//! Audio-Playback via cpal
//!
//! Oeffnet einen cpal OutputStream, der seine Samples direkt aus dem
//! `WiedergabePuffer` zieht. Fehlende Samples werden als Stille
//! gerendert – bei sprechpausenreichem Modem-Audio der Normalfall,
//! deshalb kein Underrun-Gewarne.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::{AudioError, AudioResult};
use crate::puffer::WiedergabePuffer;

/// Konfiguration fuer den Audio-Playback
#[derive(Debug, Clone)]
pub struct WiedergabeConfig {
    /// Abtastrate in Hz
    pub sample_rate: u32,
    /// Kanalanzahl
    pub kanaele: u16,
}

impl Default for WiedergabeConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            kanaele: 1,
        }
    }
}

/// Audio-Playback-Stream
pub struct WiedergabeStream {
    _stream: Stream,
}

/// Oeffnet einen Playback-Stream auf dem gegebenen Geraet.
///
/// Der Stream liest im cpal-Callback-Thread aus dem Wiedergabepuffer.
pub fn wiedergabe_stream_oeffnen(
    geraet: &Device,
    config: WiedergabeConfig,
    puffer: Arc<WiedergabePuffer>,
) -> AudioResult<WiedergabeStream> {
    let stream_config = StreamConfig {
        channels: config.kanaele,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err| error!("Playback-Fehler: {}", err);

    let supported = geraet
        .supported_output_configs()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?
        .find(|c| {
            c.min_sample_rate().0 <= config.sample_rate
                && c.max_sample_rate().0 >= config.sample_rate
                && c.channels() >= config.kanaele
        });

    let sample_format = supported
        .map(|c| c.sample_format())
        .unwrap_or(SampleFormat::I16);

    let stream = match sample_format {
        SampleFormat::I16 => geraet
            .build_output_stream(
                &stream_config,
                move |data: &mut [i16], _| {
                    let n = puffer.entnehmen(data);
                    data[n..].fill(0);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        SampleFormat::F32 => geraet
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    let mut zwischen = vec![0i16; data.len()];
                    let n = puffer.entnehmen(&mut zwischen);
                    for (ziel, s) in data.iter_mut().zip(zwischen.iter().take(n)) {
                        *ziel = *s as f32 / i16::MAX as f32;
                    }
                    data[n..].fill(0.0);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        andere => {
            return Err(AudioError::StreamFehler(format!(
                "Nicht unterstuetztes Sample-Format: {:?}",
                andere
            )))
        }
    };

    stream
        .play()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    debug!(
        "Playback-Stream geoeffnet: {}Hz {}ch",
        config.sample_rate, config.kanaele
    );

    Ok(WiedergabeStream { _stream: stream })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puffer::PufferConfig;
    use cpal::traits::HostTrait;

    #[test]
    fn wiedergabe_config_default() {
        let config = WiedergabeConfig::default();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.kanaele, 1);
    }

    #[test]
    #[ignore = "Benoetigt Audio-Hardware"]
    fn wiedergabe_stream_oeffenbar() {
        let host = cpal::default_host();
        if let Some(geraet) = host.default_output_device() {
            let puffer = Arc::new(WiedergabePuffer::neu(PufferConfig::default()));
            let result =
                wiedergabe_stream_oeffnen(&geraet, WiedergabeConfig::default(), puffer);
            assert!(result.is_ok(), "Playback-Stream sollte oeffenbar sein");
        }
    }
}
