//! Periodic waveform generator
//!
//! A generator is a mix-graph source that renders a bare oscillator. Phase is
//! kept in `f64` so long-running tones don't drift.

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaveformKind {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// Evaluate one cycle of `kind` at `phase` in [0, 1)
#[inline]
fn shape(kind: WaveformKind, phase: f64) -> f32 {
    let value = match kind {
        WaveformKind::Sine => (std::f64::consts::TAU * phase).sin(),
        WaveformKind::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        // Starts at zero and rises, like the sine
        WaveformKind::Triangle => {
            let shifted = phase + 0.25;
            1.0 - 4.0 * (shifted - shifted.floor() - 0.5).abs()
        }
        WaveformKind::Sawtooth => 2.0 * phase - 1.0,
    };
    value as f32
}

/// Tone generator
#[derive(Debug, Clone)]
pub struct Generator {
    kind: WaveformKind,
    amplitude: f32,
    frequency: f32,
    sample_rate: u32,
    /// Position within the current cycle [0, 1)
    phase: f64,
}

impl Generator {
    /// Create a generator running at `sample_rate`
    pub fn new(kind: WaveformKind, amplitude: f32, frequency: f32, sample_rate: u32) -> Self {
        Self {
            kind,
            amplitude,
            frequency,
            sample_rate,
            phase: 0.0,
        }
    }

    pub fn kind(&self) -> WaveformKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: WaveformKind) {
        self.kind = kind;
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    /// Rate used to advance the phase (independent of the engine rate)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Restart the cycle
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produce the next mono sample
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let sample = shape(self.kind, self.phase) * self.amplitude;

        if self.sample_rate > 0 {
            self.phase += f64::from(self.frequency) / f64::from(self.sample_rate);
            self.phase -= self.phase.floor();
        }

        sample
    }

    /// Add the generator output to an interleaved stereo buffer
    pub fn render(&mut self, output: &mut [f32]) {
        for frame in output.chunks_exact_mut(2) {
            let sample = self.next_sample();
            frame[0] += sample;
            frame[1] += sample;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_starts_at_zero() {
        let mut gen = Generator::new(WaveformKind::Sine, 1.0, 440.0, 48000);
        assert_eq!(gen.next_sample(), 0.0);
        assert!(gen.next_sample() > 0.0);
    }

    #[test]
    fn test_square_amplitude() {
        // 4 samples per cycle
        let mut gen = Generator::new(WaveformKind::Square, 0.25, 12000.0, 48000);
        let samples: Vec<f32> = (0..4).map(|_| gen.next_sample()).collect();
        assert_eq!(samples, vec![0.25, 0.25, -0.25, -0.25]);
    }

    #[test]
    fn test_triangle_and_saw_ranges() {
        for kind in [WaveformKind::Triangle, WaveformKind::Sawtooth] {
            let mut gen = Generator::new(kind, 0.5, 440.0, 48000);
            for _ in 0..4800 {
                let s = gen.next_sample();
                assert!(s.abs() <= 0.5 + 1e-6, "{kind:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn test_triangle_quarter_points() {
        // 4 samples per cycle
        let mut gen = Generator::new(WaveformKind::Triangle, 1.0, 12000.0, 48000);
        let samples: Vec<f32> = (0..4).map(|_| gen.next_sample()).collect();
        assert!((samples[0] - 0.0).abs() < 1e-6);
        assert!((samples[1] - 1.0).abs() < 1e-6);
        assert!((samples[2] - 0.0).abs() < 1e-6);
        assert!((samples[3] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_sample_rate_holds_phase() {
        let mut gen = Generator::new(WaveformKind::Sawtooth, 1.0, 440.0, 0);
        let first = gen.next_sample();
        assert_eq!(gen.next_sample(), first);
    }

    #[test]
    fn test_render_is_additive_stereo() {
        let mut gen = Generator::new(WaveformKind::Square, 0.5, 100.0, 48000);
        let mut buffer = vec![0.25f32; 8];
        gen.render(&mut buffer);
        for frame in buffer.chunks_exact(2) {
            assert_eq!(frame[0], 0.75);
            assert_eq!(frame[1], 0.75);
        }
    }
}
