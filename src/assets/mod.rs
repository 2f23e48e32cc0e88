// ABOUTME: Audio asset loading, decoding, and caching
// ABOUTME: Contains SectionId, DecodedAudio, sources, decoders, and the cache

/// Decoded-audio cache keyed by section id
pub mod cache;
/// Audio decoder implementations (raw PCM, WAV)
pub mod decode;
/// Section source abstraction for fetching raw bytes
pub mod source;
/// Core asset type definitions
pub mod types;

pub use cache::AudioAssetCache;
pub use decode::{AudioDecoder, PcmDecoder, PcmEndian, WavDecoder};
pub use source::{FileSource, SectionSource};
pub use types::{DecodedAudio, SectionId};
