//! Waveform handles - tone generators on the output bus

use crate::device::Device;
use crate::handle::Handle;
use chime_engine::{EngineRef, Generator, NodeId, NodeKind, WaveformKind};

/// Handle to a generated waveform
pub type Waveform = Handle<WaveformImpl>;

/// Implementation object behind a `Waveform`
///
/// Owns one generator node. The node is attached to the output bus when
/// created and detached again before it is removed.
pub struct WaveformImpl {
    engine: EngineRef,
    node: NodeId,
}

impl WaveformImpl {
    pub(crate) fn new(device: &Device, kind: WaveformKind, amplitude: f32, frequency: f32) -> Self {
        let node = {
            let mut state = device.engine().lock();
            let generator = Generator::new(kind, amplitude, frequency, state.sample_rate());
            let graph = state.graph_mut();
            let node = graph.insert(NodeKind::Generator(generator), false);
            if let Err(err) = graph.attach(node) {
                tracing::warn!(?node, %err, "failed to attach waveform");
            }
            node
        };
        tracing::debug!(?kind, amplitude, frequency, ?node, "waveform created");

        Self {
            engine: device.engine_ref(),
            node,
        }
    }

    fn generator<R: Default>(&self, f: impl FnOnce(&mut Generator) -> R) -> R {
        self.engine
            .with(|state| state.graph_mut().generator_mut(self.node).map(f))
            .flatten()
            .unwrap_or_default()
    }

    fn set_active(&self, active: bool) {
        self.engine.with(|state| {
            let _ = state.graph_mut().set_active(self.node, active);
        });
    }

    fn is_active(&self) -> bool {
        self.engine
            .with(|state| state.graph().is_active(self.node))
            .unwrap_or(false)
    }
}

impl Drop for WaveformImpl {
    fn drop(&mut self) {
        let node = self.node;
        self.engine.with(|state| {
            let graph = state.graph_mut();
            // Unlink from the bus before the node is freed
            let _ = graph.detach(node);
            match graph.remove(node) {
                Ok(_) => tracing::debug!(?node, "waveform released"),
                Err(err) => tracing::warn!(?node, %err, "failed to release waveform"),
            }
        });
    }
}

impl Handle<WaveformImpl> {
    /// Create a waveform through the global device
    pub fn new(kind: WaveformKind, amplitude: f32, frequency: f32) -> Waveform {
        Device::global().create_waveform(kind, amplitude, frequency)
    }

    /// Replace the referenced generator with a new one from `device`
    ///
    /// This handle's share of the old generator is released first.
    pub fn create(&mut self, device: &Device, kind: WaveformKind, amplitude: f32, frequency: f32) {
        self.reset();
        *self = device.create_waveform(kind, amplitude, frequency);
    }

    #[track_caller]
    pub fn set_kind(&self, kind: WaveformKind) {
        self.object().generator(|gen| gen.set_kind(kind));
    }

    #[track_caller]
    pub fn kind(&self) -> WaveformKind {
        self.object().generator(|gen| gen.kind())
    }

    #[track_caller]
    pub fn set_amplitude(&self, amplitude: f32) {
        self.object().generator(|gen| gen.set_amplitude(amplitude));
    }

    #[track_caller]
    pub fn amplitude(&self) -> f32 {
        self.object().generator(|gen| gen.amplitude())
    }

    #[track_caller]
    pub fn set_frequency(&self, frequency: f32) {
        self.object().generator(|gen| gen.set_frequency(frequency));
    }

    #[track_caller]
    pub fn frequency(&self) -> f32 {
        self.object().generator(|gen| gen.frequency())
    }

    /// Rate the generator advances its phase at (defaults to the engine rate)
    #[track_caller]
    pub fn set_sample_rate(&self, sample_rate: u32) {
        self.object().generator(|gen| gen.set_sample_rate(sample_rate));
    }

    #[track_caller]
    pub fn sample_rate(&self) -> u32 {
        self.object().generator(|gen| gen.sample_rate())
    }

    /// Make the node audible; no effect if already started
    #[track_caller]
    pub fn start(&self) {
        self.object().set_active(true);
    }

    /// Silence the node; no effect if already stopped
    #[track_caller]
    pub fn stop(&self) {
        self.object().set_active(false);
    }

    #[track_caller]
    pub fn is_started(&self) -> bool {
        self.object().is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_engine::EngineConfig;

    fn device() -> Device {
        Device::headless(&EngineConfig::default())
    }

    fn graph_len(device: &Device) -> (usize, usize) {
        let state = device.engine().lock();
        (state.graph().len(), state.graph().bus_len())
    }

    #[test]
    fn test_created_stopped_and_attached() {
        let device = device();
        let waveform = device.create_waveform(WaveformKind::Sine, 0.5, 440.0);
        assert!(!waveform.is_started());
        assert_eq!(graph_len(&device), (1, 1));
        assert_eq!(waveform.sample_rate(), device.sample_rate());

        let mut out = vec![0.0; 64];
        device.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_start_stop_idempotent() {
        let device = device();
        let waveform = device.create_waveform(WaveformKind::Square, 0.5, 100.0);

        waveform.start();
        waveform.start();
        assert!(waveform.is_started());
        let mut out = vec![0.0; 4];
        device.render(&mut out);
        assert_eq!(out, vec![0.5; 4]);

        waveform.stop();
        waveform.stop();
        assert!(!waveform.is_started());
        device.render(&mut out);
        assert_eq!(out, vec![0.0; 4]);
    }

    #[test]
    fn test_released_once_after_last_copy() {
        let device = device();
        let a = device.create_waveform(WaveformKind::Triangle, 0.2, 880.0);
        let b = a.clone();
        let c = a.clone();
        let d = c.clone();
        assert_eq!(d.ref_count(), 4);

        drop(a);
        drop(d);
        drop(b);
        assert_eq!(graph_len(&device), (1, 1));
        c.set_frequency(220.0);
        assert_eq!(c.frequency(), 220.0);

        drop(c);
        // Detached from the bus and freed
        assert_eq!(graph_len(&device), (0, 0));
    }

    #[test]
    fn test_create_replaces_generator() {
        let device = device();
        let mut waveform = device.create_waveform(WaveformKind::Sine, 0.5, 440.0);
        let other = waveform.clone();

        waveform.create(&device, WaveformKind::Sawtooth, 0.1, 55.0);
        assert_ne!(waveform, other);
        assert_eq!(waveform.kind(), WaveformKind::Sawtooth);
        assert_eq!(other.kind(), WaveformKind::Sine);
        assert_eq!(graph_len(&device), (2, 2));

        drop(other);
        assert_eq!(graph_len(&device), (1, 1));
    }

    #[test]
    fn test_setters_pass_through() {
        let device = device();
        let waveform = device.create_waveform(WaveformKind::Sine, 0.0, 0.0);
        waveform.set_kind(WaveformKind::Triangle);
        waveform.set_amplitude(0.2);
        waveform.set_frequency(987.7666);
        waveform.set_sample_rate(22050);

        let copy = waveform.clone();
        assert_eq!(copy.kind(), WaveformKind::Triangle);
        assert_eq!(copy.amplitude(), 0.2);
        assert_eq!(copy.frequency(), 987.7666);
        assert_eq!(copy.sample_rate(), 22050);
    }

    #[test]
    fn test_outlives_device() {
        let device = device();
        let waveform = device.create_waveform(WaveformKind::Sine, 0.5, 440.0);
        drop(device);
        waveform.start();
        assert!(!waveform.is_started());
        assert_eq!(waveform.amplitude(), 0.0);
    }

    #[test]
    fn test_null_waveform() {
        let waveform = Waveform::default();
        assert!(waveform.is_null());
        assert_eq!(waveform, Waveform::null());
    }

    #[test]
    #[should_panic(expected = "null WaveformImpl handle")]
    fn test_start_on_null_panics() {
        Waveform::null().start();
    }
}
