// ABOUTME: Command-line demo playing one audio file through the engine
// ABOUTME: Shows cache registration, session playback, and countdown sync

use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use log::info;
use tokio::sync::oneshot;

use cuesync::assets::{AudioAssetCache, FileSource, SectionId, WavDecoder};
use cuesync::engine::{AudioEngine, CpalContext, SessionEvents};
use cuesync::visual::countdown::{Countdown, CountdownConfig, CountdownState};

#[derive(Parser, Debug)]
#[command(name = "cueplay", about = "Play a WAV file with synced countdown output")]
struct Args {
    /// Path to a WAV file
    file: String,

    /// Start offset into the file, in seconds
    #[arg(long, default_value_t = 0.0)]
    offset: f64,

    /// Linear gain, 0.0-1.0
    #[arg(long, default_value_t = 1.0)]
    gain: f32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let local = tokio::task::LocalSet::new();
    local.run_until(run(args)).await
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let cache = AudioAssetCache::new(Rc::new(FileSource::new()), Rc::new(WavDecoder::new()));
    let id = SectionId::from("cli");
    cache.register(id.clone(), args.file.as_str());

    let audio = cache.load_registered(&id).await?;
    info!(
        "loaded {} ({} ch @ {} Hz, {:.2}s)",
        args.file,
        audio.channels(),
        audio.sample_rate(),
        audio.duration_secs()
    );

    let engine = AudioEngine::new(cache);
    engine.initialize(Box::new(CpalContext::new()?));
    engine.set_gain(args.gain);
    info!("latency compensation: {:.1}ms", engine.total_latency_ms());

    let duration = (audio.duration_secs() - args.offset.max(0.0)).max(0.0);
    let mut last_shown = u64::MAX;
    let _countdown = Countdown::new(
        CountdownConfig::builder()
            .duration(duration)
            .frame_interval(Duration::from_millis(250))
            .on_frame(Box::new(move |state: CountdownState| {
                if state.remaining != last_shown {
                    last_shown = state.remaining;
                    println!("{:>4}s remaining", state.remaining);
                }
            }))
            .build(),
    );

    let (done_tx, done_rx) = oneshot::channel();
    let mut done_tx = Some(done_tx);
    engine
        .play_session(
            &id,
            args.offset,
            SessionEvents {
                on_tick: None,
                on_finish: Some(Box::new(move || {
                    if let Some(tx) = done_tx.take() {
                        let _ = tx.send(());
                    }
                })),
            },
        )
        .await?;

    let _ = done_rx.await;
    println!("done");
    Ok(())
}
