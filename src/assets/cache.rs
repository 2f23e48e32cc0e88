// ABOUTME: Decoded-audio cache keyed by section id
// ABOUTME: Guarantees at-most-one in-flight fetch/decode per section

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;
use log::{debug, warn};

use crate::assets::decode::AudioDecoder;
use crate::assets::source::SectionSource;
use crate::assets::{DecodedAudio, SectionId};
use crate::error::Error;

type LoadFuture = Shared<LocalBoxFuture<'static, Result<DecodedAudio, Error>>>;

/// Cache slot state. Absent sections simply have no entry.
enum AssetSlot {
    /// A fetch/decode is in flight; later loads await the same future.
    /// The epoch distinguishes this load from any retry started after a
    /// `clear()` removed it.
    Pending(LoadFuture, u64),
    /// Ready for immediate playback.
    Decoded(DecodedAudio),
}

/// Loads and retains decoded audio buffers, keyed by section id.
///
/// The cache owns every asset exclusively; playback borrows buffers as
/// cheap `Arc` clones. There is no automatic eviction — the working set is
/// bounded by the number of sections in a single experiment run. Cloning
/// the cache produces another handle to the same shared state.
#[derive(Clone)]
pub struct AudioAssetCache {
    slots: Rc<RefCell<HashMap<SectionId, AssetSlot>>>,
    urls: Rc<RefCell<HashMap<SectionId, String>>>,
    source: Rc<dyn SectionSource>,
    decoder: Rc<dyn AudioDecoder>,
    epoch: Rc<Cell<u64>>,
}

impl AudioAssetCache {
    /// Create a cache over the given source and decoder.
    pub fn new(source: Rc<dyn SectionSource>, decoder: Rc<dyn AudioDecoder>) -> Self {
        Self {
            slots: Rc::new(RefCell::new(HashMap::new())),
            urls: Rc::new(RefCell::new(HashMap::new())),
            source,
            decoder,
            epoch: Rc::new(Cell::new(0)),
        }
    }

    /// Record a section's source URL without loading it, so the engine can
    /// later resolve `play(id)` for a section that was never preloaded.
    pub fn register(&self, id: SectionId, url: impl Into<String>) {
        self.urls.borrow_mut().insert(id, url.into());
    }

    /// The URL registered for a section, if any.
    pub fn registered_url(&self, id: &SectionId) -> Option<String> {
        self.urls.borrow().get(id).cloned()
    }

    /// Load a section from `url`, registering the URL as a side effect.
    ///
    /// Returns the cached buffer immediately if the section is already
    /// decoded. If a load for this id is already in flight, awaits that
    /// same load instead of fetching again.
    pub async fn load(&self, id: &SectionId, url: impl Into<String>) -> Result<DecodedAudio, Error> {
        self.register(id.clone(), url);
        self.load_registered(id).await
    }

    /// Load a section using its registered URL.
    pub async fn load_registered(&self, id: &SectionId) -> Result<DecodedAudio, Error> {
        let (future, epoch) = {
            let mut slots = self.slots.borrow_mut();
            match slots.get(id) {
                Some(AssetSlot::Decoded(audio)) => return Ok(audio.clone()),
                Some(AssetSlot::Pending(future, epoch)) => (future.clone(), *epoch),
                None => {
                    let url = self
                        .urls
                        .borrow()
                        .get(id)
                        .cloned()
                        .ok_or_else(|| Error::UnknownSection(id.to_string()))?;
                    let epoch = self.epoch.get() + 1;
                    self.epoch.set(epoch);
                    let future = self.spawn_load(id.clone(), url);
                    slots.insert(id.clone(), AssetSlot::Pending(future.clone(), epoch));
                    (future, epoch)
                }
            }
        };

        let result = future.await;

        // Every waiter runs this bookkeeping; the epoch check makes it a
        // no-op when the slot was cleared or replaced while we waited.
        let mut slots = self.slots.borrow_mut();
        let still_ours = matches!(slots.get(id), Some(AssetSlot::Pending(_, e)) if *e == epoch);
        match &result {
            Ok(audio) if still_ours => {
                slots.insert(id.clone(), AssetSlot::Decoded(audio.clone()));
            }
            Err(e) if still_ours => {
                // Revert to absent so a later load can retry.
                warn!("load failed for section '{id}': {e}");
                slots.remove(id);
            }
            _ => {}
        }

        result
    }

    fn spawn_load(&self, id: SectionId, url: String) -> LoadFuture {
        let source = Rc::clone(&self.source);
        let decoder = Rc::clone(&self.decoder);
        debug!("loading section '{id}' from '{url}'");
        async move {
            let bytes = source.fetch(&url).await.map_err(|e| Error::AssetLoad {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
            decoder.decode(&bytes).map_err(|e| Error::AssetLoad {
                id: id.to_string(),
                reason: e.to_string(),
            })
        }
        .boxed_local()
        .shared()
    }

    /// Pure lookup; never triggers a load.
    pub fn get(&self, id: &SectionId) -> Option<DecodedAudio> {
        match self.slots.borrow().get(id) {
            Some(AssetSlot::Decoded(audio)) => Some(audio.clone()),
            _ => None,
        }
    }

    /// Whether a load for this section is currently in flight.
    pub fn is_pending(&self, id: &SectionId) -> bool {
        matches!(self.slots.borrow().get(id), Some(AssetSlot::Pending(..)))
    }

    /// Drop every cached and pending asset. Registered URLs are kept; an
    /// in-flight load whose slot was cleared completes without
    /// re-populating the cache.
    pub fn clear(&self) {
        self.slots.borrow_mut().clear();
    }
}
