//! Audio engine - owns the mix graph and the output stream
//!
//! The state shared with the audio callback sits behind a `parking_lot`
//! mutex. The callback only ever `try_lock`s it and outputs silence on
//! contention, so control-thread writes never block the real-time path.

use crate::error::EngineError;
use crate::graph::MixGraph;
use crate::listener::{ListenerSlot, MAX_LISTENERS};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Sample rate used when no output device dictates one
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Internal mix channel count (interleaved stereo)
pub const MIX_CHANNELS: usize = 2;

/// Engine construction options
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Preferred output rate; the device default is used when `None`
    pub sample_rate: Option<u32>,
    /// Number of listener slots (clamped to `MAX_LISTENERS`)
    pub listener_count: u32,
    pub master_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: None,
            listener_count: MAX_LISTENERS,
            master_volume: 1.0,
        }
    }
}

/// Everything the audio callback reads
pub struct EngineState {
    graph: MixGraph,
    listeners: Vec<ListenerSlot>,
    master_volume: f32,
    sample_rate: u32,
    /// Frames rendered since the engine started
    clock: u64,
}

impl EngineState {
    pub fn new(sample_rate: u32, listener_count: u32) -> Self {
        let listener_count = listener_count.min(MAX_LISTENERS) as usize;
        Self {
            graph: MixGraph::new(),
            listeners: vec![ListenerSlot::default(); listener_count],
            master_volume: 1.0,
            sample_rate,
            clock: 0,
        }
    }

    pub fn graph(&self) -> &MixGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut MixGraph {
        &mut self.graph
    }

    pub fn listener_count(&self) -> u32 {
        self.listeners.len() as u32
    }

    pub fn listener(&self, index: u32) -> Option<&ListenerSlot> {
        self.listeners.get(index as usize)
    }

    pub fn listener_mut(&mut self, index: u32) -> Option<&mut ListenerSlot> {
        self.listeners.get_mut(index as usize)
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// 0.0 is silent, 1.0 is unity, above 1.0 amplifies
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.max(0.0);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Engine clock in frames
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Convert a duration to frames at the engine rate
    pub fn frames_for(&self, duration: Duration) -> u64 {
        duration_to_frames(self.sample_rate, duration)
    }

    /// Fill an interleaved stereo buffer with the next block of the mix
    pub fn process(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        self.graph.render(output, self.clock);

        for sample in output.iter_mut() {
            *sample = limit(*sample * self.master_volume);
        }

        self.clock += (output.len() / MIX_CHANNELS) as u64;
    }
}

/// Frames covered by `duration` at `sample_rate`, saturating at `u64::MAX`
pub fn duration_to_frames(sample_rate: u32, duration: Duration) -> u64 {
    let frames = duration.as_nanos() * u128::from(sample_rate) / 1_000_000_000;
    u64::try_from(frames).unwrap_or(u64::MAX)
}

/// Bus level where limiting starts
const LIMIT_KNEE: f32 = 0.75;
/// Level the limiter never exceeds
const LIMIT_CEILING: f32 = 0.89;

/// Output bus limiter: linear up to the knee, tanh-shaped above it
#[inline(always)]
fn limit(x: f32) -> f32 {
    let level = x.abs();
    if level <= LIMIT_KNEE {
        return x;
    }
    let headroom = LIMIT_CEILING - LIMIT_KNEE;
    let shaped = LIMIT_KNEE + headroom * ((level - LIMIT_KNEE) / headroom).tanh();
    shaped.min(LIMIT_CEILING).copysign(x)
}

/// Output thread owning the cpal stream
struct OutputThread {
    /// Dropping the sender tells the thread to close the stream
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

/// The audio engine
///
/// Owns the shared state and, unless headless, the output thread. Engine-side
/// resources hold an `EngineRef` instead, which does not keep it alive.
pub struct Engine {
    state: Arc<Mutex<EngineState>>,
    output: Option<OutputThread>,
}

impl Engine {
    /// Open the default output device and start streaming
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let state = Arc::new(Mutex::new(Self::initial_state(
            config,
            config.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
        )));

        let (ready_tx, ready_rx) = bounded::<Result<u32, EngineError>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let state_for_thread = Arc::clone(&state);
        let requested_rate = config.sample_rate;

        let handle = thread::Builder::new()
            .name("chime-output".into())
            .spawn(move || run_output_thread(state_for_thread, requested_rate, ready_tx, shutdown_rx))?;

        let mut output = OutputThread {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        };

        match ready_rx.recv() {
            Ok(Ok(sample_rate)) => {
                tracing::info!(sample_rate, "audio engine started");
                Ok(Self {
                    state,
                    output: Some(output),
                })
            }
            Ok(Err(err)) => {
                output.stop();
                Err(err)
            }
            Err(_) => {
                output.stop();
                Err(EngineError::OutputThread)
            }
        }
    }

    /// Create an engine with no output device; frames are pulled with `render`
    pub fn headless(config: &EngineConfig) -> Self {
        let sample_rate = config.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        tracing::info!(sample_rate, "audio engine started (headless)");
        Self {
            state: Arc::new(Mutex::new(Self::initial_state(config, sample_rate))),
            output: None,
        }
    }

    fn initial_state(config: &EngineConfig, sample_rate: u32) -> EngineState {
        let mut state = EngineState::new(sample_rate, config.listener_count);
        state.set_master_volume(config.master_volume);
        state
    }

    pub fn is_headless(&self) -> bool {
        self.output.is_none()
    }

    pub fn sample_rate(&self) -> u32 {
        self.state.lock().sample_rate()
    }

    /// Lock the shared state for a control-thread update
    pub fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock()
    }

    /// Non-owning reference for engine-side resources
    pub fn downgrade(&self) -> EngineRef {
        EngineRef(Arc::downgrade(&self.state))
    }

    /// Mix the next block into `output` (interleaved stereo)
    ///
    /// Meant for headless engines; on a streaming engine this steals frames
    /// from the device.
    pub fn render(&self, output: &mut [f32]) {
        self.state.lock().process(output);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.stop();
        }
    }
}

impl OutputThread {
    fn stop(&mut self) {
        self.shutdown_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Weak handle to the engine state
#[derive(Clone, Debug, Default)]
pub struct EngineRef(Weak<Mutex<EngineState>>);

impl EngineRef {
    /// Run `f` against the engine state, or return `None` if the engine is gone
    pub fn with<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> Option<R> {
        let state = self.0.upgrade()?;
        let mut guard = state.lock();
        Some(f(&mut guard))
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

fn run_output_thread(
    state: Arc<Mutex<EngineState>>,
    requested_rate: Option<u32>,
    ready_tx: Sender<Result<u32, EngineError>>,
    shutdown_rx: Receiver<()>,
) {
    let stream = match open_stream(&state, requested_rate) {
        Ok((stream, sample_rate)) => {
            let _ = ready_tx.send(Ok(sample_rate));
            stream
        }
        Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
        }
    };

    // Blocks until the engine drops its sender
    let _ = shutdown_rx.recv();
    drop(stream);
    tracing::debug!("output stream closed");
}

fn open_stream(
    state: &Arc<Mutex<EngineState>>,
    requested_rate: Option<u32>,
) -> Result<(cpal::Stream, u32), EngineError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(EngineError::NoOutputDevice)?;

    let supported = match requested_rate {
        Some(rate) => device
            .supported_output_configs()
            .map_err(|e| EngineError::OutputConfig(e.to_string()))?
            .find(|range| {
                range.sample_format() == cpal::SampleFormat::F32
                    && range.min_sample_rate().0 <= rate
                    && rate <= range.max_sample_rate().0
            })
            .map(|range| range.with_sample_rate(cpal::SampleRate(rate))),
        None => None,
    };
    let config = match supported {
        Some(config) => config,
        None => device
            .default_output_config()
            .map_err(|e| EngineError::OutputConfig(e.to_string()))?,
    };

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    state.lock().set_sample_rate(sample_rate);

    let state_for_callback = Arc::clone(state);
    // Stereo scratch for non-stereo devices (grown outside the steady state only)
    let mut scratch = vec![0.0f32; 8192];

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let Some(mut engine) = state_for_callback.try_lock() else {
                    // Lock contention - output silence to avoid blocking
                    data.fill(0.0);
                    return;
                };

                if channels == MIX_CHANNELS {
                    engine.process(data);
                    return;
                }

                let frames = data.len() / channels.max(1);
                if scratch.len() < frames * MIX_CHANNELS {
                    scratch.resize(frames * MIX_CHANNELS, 0.0);
                }
                let stereo = &mut scratch[..frames * MIX_CHANNELS];
                engine.process(stereo);

                for (out, mix) in data.chunks_exact_mut(channels).zip(stereo.chunks_exact(2)) {
                    if channels == 1 {
                        out[0] = (mix[0] + mix[1]) * 0.5;
                    } else {
                        out[0] = mix[0];
                        out[1] = mix[1];
                        out[2..].fill(0.0);
                    }
                }
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    stream
        .play()
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    Ok((stream, sample_rate))
}
