// ABOUTME: Audio decoder implementations (raw PCM, WAV)
// ABOUTME: Decoders turn fetched bytes into ready-to-play DecodedAudio

use crate::assets::DecodedAudio;
use crate::error::Error;

/// Raw PCM decoder
pub mod pcm;
/// WAV container decoder
pub mod wav;

pub use pcm::{PcmDecoder, PcmEndian};
pub use wav::WavDecoder;

/// Turns fetched bytes into a playable buffer.
pub trait AudioDecoder {
    /// Decode an entire asset's bytes into interleaved f32 PCM.
    fn decode(&self, data: &[u8]) -> Result<DecodedAudio, Error>;
}
