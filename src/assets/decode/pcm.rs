// ABOUTME: Raw PCM decoder implementation
// ABOUTME: Supports 16-bit and 24-bit PCM in either byte order

use crate::assets::decode::AudioDecoder;
use crate::assets::DecodedAudio;
use crate::error::Error;

/// PCM endianness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmEndian {
    /// Little-endian byte order
    Little,
    /// Big-endian byte order
    Big,
}

/// Decoder for headerless PCM streams.
///
/// The stream carries no format metadata, so bit depth, sample rate and
/// channel count come from the experiment configuration that registered the
/// section.
#[derive(Debug, Clone)]
pub struct PcmDecoder {
    bit_depth: u8,
    sample_rate: u32,
    channels: u16,
    endian: PcmEndian,
}

const I16_SCALE: f32 = 32_768.0;
const I24_SCALE: f32 = 8_388_608.0;

fn i24_from_bytes(b0: u8, b1: u8, b2: u8) -> i32 {
    // Sign-extend the 24-bit value through the top of an i32.
    (i32::from(b2) << 24 | i32::from(b1) << 16 | i32::from(b0) << 8) >> 8
}

impl PcmDecoder {
    /// Create a decoder for the given bit depth (16 or 24), little-endian.
    pub fn new(bit_depth: u8, sample_rate: u32, channels: u16) -> Self {
        Self {
            bit_depth,
            sample_rate,
            channels,
            endian: PcmEndian::Little,
        }
    }

    /// Create a decoder with explicit endianness.
    pub fn with_endian(bit_depth: u8, sample_rate: u32, channels: u16, endian: PcmEndian) -> Self {
        Self {
            bit_depth,
            sample_rate,
            channels,
            endian,
        }
    }
}

impl AudioDecoder for PcmDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedAudio, Error> {
        let bytes_per_sample = usize::from(self.bit_depth / 8);
        let frame_bytes = bytes_per_sample * usize::from(self.channels);
        if frame_bytes > 0 && data.len() % frame_bytes != 0 {
            return Err(Error::Decode(format!(
                "{} bytes is not a whole number of {}-byte frames",
                data.len(),
                frame_bytes
            )));
        }

        let samples: Vec<f32> = match (self.bit_depth, self.endian) {
            (16, PcmEndian::Little) => data
                .chunks_exact(2)
                .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])) / I16_SCALE)
                .collect(),
            (16, PcmEndian::Big) => data
                .chunks_exact(2)
                .map(|c| f32::from(i16::from_be_bytes([c[0], c[1]])) / I16_SCALE)
                .collect(),
            (24, PcmEndian::Little) => data
                .chunks_exact(3)
                .map(|c| i24_from_bytes(c[0], c[1], c[2]) as f32 / I24_SCALE)
                .collect(),
            (24, PcmEndian::Big) => data
                .chunks_exact(3)
                .map(|c| i24_from_bytes(c[2], c[1], c[0]) as f32 / I24_SCALE)
                .collect(),
            _ => {
                return Err(Error::Decode(format!(
                    "unsupported bit depth: {}",
                    self.bit_depth
                )))
            }
        };

        Ok(DecodedAudio::new(samples, self.channels, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_16bit_little_endian() {
        let decoder = PcmDecoder::new(16, 48_000, 1);
        // 0x4000 = 16384 = 0.5 full scale
        let audio = decoder.decode(&[0x00, 0x40, 0x00, 0xC0]).unwrap();
        let s = audio.samples();
        assert!((s[0] - 0.5).abs() < 1e-6);
        assert!((s[1] + 0.5).abs() < 1e-6);
        assert_eq!(audio.sample_rate(), 48_000);
    }

    #[test]
    fn decodes_16bit_big_endian() {
        let decoder = PcmDecoder::with_endian(16, 44_100, 1, PcmEndian::Big);
        let audio = decoder.decode(&[0x40, 0x00]).unwrap();
        assert!((audio.samples()[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn decodes_24bit_both_orders() {
        // 0x400000 = 4194304 = 0.5 full scale
        let le = PcmDecoder::new(24, 48_000, 1)
            .decode(&[0x00, 0x00, 0x40])
            .unwrap();
        let be = PcmDecoder::with_endian(24, 48_000, 1, PcmEndian::Big)
            .decode(&[0x40, 0x00, 0x00])
            .unwrap();
        assert!((le.samples()[0] - 0.5).abs() < 1e-6);
        assert!((be.samples()[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rejects_unsupported_bit_depth() {
        let decoder = PcmDecoder::new(8, 48_000, 1);
        assert!(matches!(decoder.decode(&[0, 0]), Err(Error::Decode(_))));
    }

    #[test]
    fn rejects_partial_frames() {
        let decoder = PcmDecoder::new(16, 48_000, 2);
        // 6 bytes = 1.5 stereo 16-bit frames
        assert!(matches!(
            decoder.decode(&[0u8; 6]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn rejects_partial_samples() {
        let decoder = PcmDecoder::new(16, 48_000, 1);
        // 3 bytes = 1.5 mono 16-bit samples
        assert!(matches!(
            decoder.decode(&[0u8; 3]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn negative_full_scale_sign_extends() {
        let decoder = PcmDecoder::new(24, 48_000, 1);
        // 0x800000 = -8388608 = -1.0 full scale
        let audio = decoder.decode(&[0x00, 0x00, 0x80]).unwrap();
        assert!((audio.samples()[0] + 1.0).abs() < 1e-6);
    }
}
