// ABOUTME: Shared test doubles for integration tests
// ABOUTME: Scripted byte source and a recording output context

// Not every suite uses every helper.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use tokio::sync::Notify;

use cuesync::assets::{AudioDecoder, DecodedAudio, SectionSource};
use cuesync::engine::{LatencyEstimate, OutputContext};
use cuesync::Error;

/// Source whose responses are scripted per URL, with optional gates that
/// hold a fetch open until the test releases it.
#[derive(Default)]
pub struct ScriptedSource {
    responses: RefCell<HashMap<String, Result<Vec<u8>, String>>>,
    gates: RefCell<HashMap<String, Rc<Notify>>>,
    fetches: Cell<usize>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, bytes: Vec<u8>) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), Ok(bytes));
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), Err(reason.to_string()));
    }

    /// Make fetches of `url` wait until the returned gate is notified.
    pub fn gate(&self, url: &str) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        self.gates
            .borrow_mut()
            .insert(url.to_string(), Rc::clone(&gate));
        gate
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl SectionSource for ScriptedSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, io::Result<Vec<u8>>> {
        self.fetches.set(self.fetches.get() + 1);
        let gate = self.gates.borrow().get(url).cloned();
        let response = self
            .responses
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(format!("no scripted response for '{url}'")));
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            response.map_err(|reason| io::Error::new(io::ErrorKind::NotFound, reason))
        }
        .boxed_local()
    }
}

/// Decoder that turns each input byte into one mono sample at 100Hz, so a
/// ten-byte payload decodes to exactly 100ms of audio.
pub struct ByteDecoder;

impl AudioDecoder for ByteDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedAudio, Error> {
        if data.is_empty() {
            return Err(Error::Decode("empty payload".to_string()));
        }
        let samples: Vec<f32> = data.iter().map(|b| f32::from(*b) / 255.0).collect();
        Ok(DecodedAudio::new(samples, 1, 100))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start { frames: usize, offset: f64 },
    Stop,
    Gain(f32),
    Suspend,
    Resume,
}

/// Output context that records every call instead of touching hardware.
pub struct RecordingContext {
    events: Rc<RefCell<Vec<Event>>>,
    latency: LatencyEstimate,
    fail_start: bool,
}

impl RecordingContext {
    pub fn new() -> (Self, Rc<RefCell<Vec<Event>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                events: Rc::clone(&events),
                latency: LatencyEstimate::ZERO,
                fail_start: false,
            },
            events,
        )
    }

    pub fn with_latency(mut self, latency: LatencyEstimate) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }
}

impl OutputContext for RecordingContext {
    fn start_source(&mut self, audio: &DecodedAudio, offset_secs: f64) -> Result<(), Error> {
        if self.fail_start {
            return Err(Error::Output("scripted start failure".to_string()));
        }
        self.events.borrow_mut().push(Event::Start {
            frames: audio.frames(),
            offset: offset_secs,
        });
        Ok(())
    }

    fn stop_source(&mut self) {
        self.events.borrow_mut().push(Event::Stop);
    }

    fn set_gain(&mut self, level: f32) {
        self.events.borrow_mut().push(Event::Gain(level));
    }

    fn latency(&self) -> LatencyEstimate {
        self.latency
    }

    fn suspend(&mut self) -> Result<(), Error> {
        self.events.borrow_mut().push(Event::Suspend);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), Error> {
        self.events.borrow_mut().push(Event::Resume);
        Ok(())
    }
}
