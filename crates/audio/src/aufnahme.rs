//! Mikrofon-Capture via cpal
//!
//! Oeffnet einen cpal InputStream und schreibt i16-Samples in einen
//! lock-free Ring-Buffer. Der Sende-Arbeiter der Bruecke entnimmt sie
//! dort in festen Stuecken.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, error, warn};

use crate::error::{AudioError, AudioResult};

/// Konfiguration fuer den Audio-Capture
#[derive(Debug, Clone)]
pub struct AufnahmeConfig {
    /// Abtastrate in Hz
    pub sample_rate: u32,
    /// Kanalanzahl (Modem-Audio ist Mono)
    pub kanaele: u16,
    /// Ring-Buffer Kapazitaet in Samples
    pub puffer_samples: usize,
}

impl Default for AufnahmeConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            kanaele: 1,
            puffer_samples: 8000, // 1 Sekunde Puffer
        }
    }
}

/// Konsumiert Samples fuer den Sende-Arbeiter
pub type AufnahmeKonsument = HeapCons<i16>;
/// Produziert Samples aus dem Mikrofon-Callback
pub type AufnahmeProduzent = HeapProd<i16>;

/// Audio-Capture-Stream
///
/// Haelt den cpal-Stream am Leben. Wird der Stream gedroppt, stoppt
/// die Aufnahme automatisch.
pub struct AufnahmeStream {
    _stream: Stream,
}

/// Oeffnet einen Capture-Stream auf dem gegebenen Geraet.
///
/// Gibt den Stream und den Ring-Buffer Consumer zurueck. Der Producer
/// laeuft im cpal-Callback-Thread.
pub fn aufnahme_stream_oeffnen(
    geraet: &Device,
    config: AufnahmeConfig,
) -> AudioResult<(AufnahmeStream, AufnahmeKonsument)> {
    let stream_config = StreamConfig {
        channels: config.kanaele,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let rb = HeapRb::<i16>::new(config.puffer_samples);
    let (mut produzent, konsument) = rb.split();

    let err_fn = |err| error!("Capture-Fehler: {}", err);

    let supported = geraet
        .supported_input_configs()
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
            .build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    let geschrieben = produzent.push_slice(data);
                    if geschrieben < data.len() {
                        warn!(
                            "Capture Ring-Buffer voll, {} Samples verworfen",
                            data.len() - geschrieben
                        );
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        SampleFormat::F32 => geraet
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    let samples: Vec<i16> = data
                        .iter()
                        .map(|&s| (s * i16::MAX as f32) as i16)
                        .collect();
                    let geschrieben = produzent.push_slice(&samples);
                    if geschrieben < samples.len() {
                        warn!("Capture Ring-Buffer voll");
                    }
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
        "Capture-Stream geoeffnet: {}Hz {}ch",
        config.sample_rate, config.kanaele
    );

    Ok((AufnahmeStream { _stream: stream }, konsument))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::traits::HostTrait;

    #[test]
    fn aufnahme_config_default() {
        let config = AufnahmeConfig::default();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.kanaele, 1);
        assert!(config.puffer_samples > 0);
    }

    #[test]
    #[ignore = "Benoetigt Audio-Hardware"]
    fn aufnahme_stream_oeffenbar() {
        let host = cpal::default_host();
        if let Some(geraet) = host.default_input_device() {
            let result = aufnahme_stream_oeffnen(&geraet, AufnahmeConfig::default());
            assert!(result.is_ok(), "Capture-Stream sollte oeffenbar sein");
        }
    }
}
