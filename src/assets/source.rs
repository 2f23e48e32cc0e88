// ABOUTME: Section source abstraction for fetching raw asset bytes
// ABOUTME: URLs are opaque strings supplied by the experiment configuration layer

use std::io;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

/// Fetches the raw bytes of a section asset.
///
/// URLs are opaque to this crate; what they name (a path, an object key, an
/// HTTP resource) is decided by the configuration layer that registered the
/// section. Implementations must not block the thread — fetching is one of
/// the two suspension points of the scheduler.
pub trait SectionSource {
    /// Fetch the complete asset identified by `url`.
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, io::Result<Vec<u8>>>;
}

/// Source that treats URLs as filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl FileSource {
    /// Create a filesystem-backed source.
    pub fn new() -> Self {
        Self
    }
}

impl SectionSource for FileSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, io::Result<Vec<u8>>> {
        let path = url.to_string();
        async move { tokio::fs::read(&path).await }.boxed_local()
    }
}
