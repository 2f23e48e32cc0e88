// ABOUTME: WAV container decoder built on hound
// ABOUTME: Normalizes integer and float WAV data to interleaved f32

use std::io::Cursor;

use crate::assets::decode::AudioDecoder;
use crate::assets::DecodedAudio;
use crate::error::Error;

/// Decoder for RIFF/WAV assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl WavDecoder {
    /// Create a WAV decoder.
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for WavDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedAudio, Error> {
        let reader =
            hound::WavReader::new(Cursor::new(data)).map_err(|e| Error::Decode(e.to_string()))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| Error::Decode(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| Error::Decode(e.to_string()))?
            }
        };

        Ok(DecodedAudio::new(samples, spec.channels, spec.sample_rate))
    }
}
