// ABOUTME: Integration tests for the decoded-audio cache
// ABOUTME: Covers in-flight dedup, failure recovery, and clear semantics

mod common;

use std::rc::Rc;
use std::time::Duration;

use tokio::task::LocalSet;
use tokio::time::sleep;

use common::{ByteDecoder, ScriptedSource};
use cuesync::assets::{AudioAssetCache, SectionId, SectionSource};
use cuesync::Error;

fn scripted_cache() -> (AudioAssetCache, Rc<ScriptedSource>) {
    let source = Rc::new(ScriptedSource::new());
    let cache = AudioAssetCache::new(
        Rc::clone(&source) as Rc<dyn SectionSource>,
        Rc::new(ByteDecoder),
    );
    (cache, source)
}

#[tokio::test(start_paused = true)]
async fn concurrent_loads_share_one_fetch() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (cache, source) = scripted_cache();
            source.respond("a.wav", vec![1; 10]);
            let gate = source.gate("a.wav");

            let id = SectionId::from("a");
            cache.register(id.clone(), "a.wav");

            let c1 = cache.clone();
            let i1 = id.clone();
            let first = tokio::task::spawn_local(async move { c1.load_registered(&i1).await });
            let c2 = cache.clone();
            let i2 = id.clone();
            let second = tokio::task::spawn_local(async move { c2.load_registered(&i2).await });

            sleep(Duration::from_millis(1)).await;
            assert!(cache.is_pending(&id));
            gate.notify_one();

            let a = first.await.unwrap().unwrap();
            let b = second.await.unwrap().unwrap();
            assert!(a.same_buffer(&b), "both waiters get the same buffer");
            assert_eq!(source.fetch_count(), 1, "exactly one fetch for the pair");
            assert!(!cache.is_pending(&id));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn cached_section_loads_without_refetching() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (cache, source) = scripted_cache();
            source.respond("a.wav", vec![1; 10]);

            let id = SectionId::from("a");
            let first = cache.load(&id, "a.wav").await.unwrap();
            let second = cache.load(&id, "a.wav").await.unwrap();
            assert!(first.same_buffer(&second));
            assert_eq!(source.fetch_count(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn failed_load_reverts_to_absent_and_can_retry() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (cache, source) = scripted_cache();
            source.fail("a.wav", "connection refused");

            let id = SectionId::from("a");
            let err = cache.load(&id, "a.wav").await.unwrap_err();
            assert!(matches!(err, Error::AssetLoad { .. }), "got {err:?}");
            assert!(cache.get(&id).is_none(), "failure leaves the slot absent");
            assert!(!cache.is_pending(&id));

            source.respond("a.wav", vec![2; 10]);
            let audio = cache.load(&id, "a.wav").await.unwrap();
            assert_eq!(audio.frames(), 10);
            assert_eq!(source.fetch_count(), 2, "the retry fetches again");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn get_is_a_pure_lookup() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (cache, source) = scripted_cache();
            source.respond("a.wav", vec![1; 10]);

            let id = SectionId::from("a");
            cache.register(id.clone(), "a.wav");
            assert!(cache.get(&id).is_none());
            assert_eq!(source.fetch_count(), 0, "get() must never trigger a load");

            cache.load_registered(&id).await.unwrap();
            assert!(cache.get(&id).is_some());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn unregistered_section_is_an_error() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (cache, _source) = scripted_cache();
            let err = cache
                .load_registered(&SectionId::from("ghost"))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::UnknownSection(_)), "got {err:?}");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn clear_keeps_urls_and_forces_a_refetch() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (cache, source) = scripted_cache();
            source.respond("a.wav", vec![1; 10]);

            let id = SectionId::from("a");
            cache.load(&id, "a.wav").await.unwrap();
            cache.clear();
            assert!(cache.get(&id).is_none());
            assert_eq!(cache.registered_url(&id).as_deref(), Some("a.wav"));

            cache.load_registered(&id).await.unwrap();
            assert_eq!(source.fetch_count(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn clear_during_inflight_load_does_not_repopulate() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (cache, source) = scripted_cache();
            source.respond("a.wav", vec![1; 10]);
            let gate = source.gate("a.wav");

            let id = SectionId::from("a");
            cache.register(id.clone(), "a.wav");

            let c = cache.clone();
            let i = id.clone();
            let load = tokio::task::spawn_local(async move { c.load_registered(&i).await });
            sleep(Duration::from_millis(1)).await;
            assert!(cache.is_pending(&id));

            cache.clear();
            gate.notify_one();

            // The waiter still receives its buffer; the cache stays empty.
            let audio = load.await.unwrap().unwrap();
            assert_eq!(audio.frames(), 10);
            assert!(cache.get(&id).is_none());
            assert!(!cache.is_pending(&id));
        })
        .await;
}
