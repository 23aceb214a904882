//! Curve-driven sound effects
//!
//! A `CurveEffect` plays a waveform whose frequency and amplitude follow two
//! curves over a fixed duration. The caller drives it with `update(dt)` once
//! per tick; curve time and `dt` are both in seconds.

use crate::curve::Curve;
use crate::device::Device;
use crate::waveform::Waveform;
use chime_engine::WaveformKind;

/// B4 (Hz)
pub const NOTE_B4: f32 = 493.8833;
/// E5 (Hz)
pub const NOTE_E5: f32 = 659.2551;
/// B5 (Hz)
pub const NOTE_B5: f32 = 987.7666;
/// E6 (Hz)
pub const NOTE_E6: f32 = 1318.510;

/// Waveform operations an effect needs
pub trait WaveformControl {
    fn set_frequency(&mut self, frequency: f32);
    fn set_amplitude(&mut self, amplitude: f32);
    fn start(&mut self);
    fn stop(&mut self);
}

impl WaveformControl for Waveform {
    fn set_frequency(&mut self, frequency: f32) {
        Waveform::set_frequency(self, frequency);
    }

    fn set_amplitude(&mut self, amplitude: f32) {
        Waveform::set_amplitude(self, amplitude);
    }

    fn start(&mut self) {
        Waveform::start(self);
    }

    fn stop(&mut self) {
        Waveform::stop(self);
    }
}

/// Effect playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectState {
    #[default]
    Idle,
    Playing,
}

/// Waveform effect driven by frequency and amplitude curves
#[derive(Debug)]
pub struct CurveEffect<W: WaveformControl = Waveform> {
    waveform: W,
    frequency: Curve,
    amplitude: Curve,
    /// Scale applied to the amplitude curve
    gain: f32,
    duration: f32,
    elapsed: f32,
    state: EffectState,
}

impl<W: WaveformControl> CurveEffect<W> {
    pub fn new(waveform: W, frequency: Curve, amplitude: Curve, gain: f32, duration: f32) -> Self {
        Self {
            waveform,
            frequency,
            amplitude,
            gain,
            duration,
            elapsed: 0.0,
            state: EffectState::Idle,
        }
    }

    /// Start (or restart) from the beginning
    pub fn play(&mut self) {
        self.elapsed = 0.0;
        self.state = EffectState::Playing;
    }

    /// Stop and silence the waveform
    pub fn stop(&mut self) {
        self.waveform.stop();
        self.state = EffectState::Idle;
    }

    /// Advance by `dt` seconds; does nothing while idle
    pub fn update(&mut self, dt: f32) {
        if self.state != EffectState::Playing {
            return;
        }

        let frequency = self.frequency.evaluate(self.elapsed);
        let amplitude = self.amplitude.evaluate(self.elapsed);

        self.waveform.set_frequency(frequency);
        self.waveform.set_amplitude(amplitude * self.gain);
        self.waveform.start();

        self.elapsed += dt;
        if self.elapsed > self.duration {
            self.stop();
        }
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == EffectState::Playing
    }

    /// Seconds since `play`
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn waveform(&self) -> &W {
        &self.waveform
    }
}

impl CurveEffect<Waveform> {
    /// Coin pickup: B5 for a tenth of a second, then E6, fading out
    pub fn coin(device: &Device) -> Self {
        let waveform = device.create_waveform(WaveformKind::Triangle, 0.0, 0.0);
        let frequency = Curve::from_points([
            (0.0, NOTE_B5),
            (0.1, NOTE_B5),
            (0.1, NOTE_E6),
            (1.0, NOTE_E6),
        ]);
        let amplitude = Curve::from_points([(0.0, 1.0), (1.0, 0.0)]);
        Self::new(waveform, frequency, amplitude, 0.2, 0.9)
    }
}
