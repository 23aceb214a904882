//! Demo sequence: narration, a frequency sweep and the coin effect

use crate::config::AppConfig;
use chime_audio::{CurveEffect, Device, Sound, Waveform, WaveformKind};

/// Length of the first narration segment (seconds)
const NARRATION_1: f64 = 11.5;
const SWEEP: f64 = 5.0;
const NARRATION_2: f64 = 7.6;
/// Time given to the coin effect before narration resumes
const COIN_WAIT: f64 = 1.0;
const NARRATION_3: f64 = 1.5;

/// Where the demo is in its sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NarrationPart1,
    Sweep,
    NarrationPart2,
    Coin,
    Wait,
    NarrationPart3,
    Done,
}

/// Demo state machine
pub struct Demo {
    stage: Stage,
    /// Seconds spent in the current stage
    stage_time: f64,
    narrator: Sound,
    sweep: Waveform,
    coin: CurveEffect,
}

impl Demo {
    pub fn new(device: &Device, config: &AppConfig) -> Self {
        Self {
            stage: Stage::NarrationPart1,
            stage_time: 0.0,
            narrator: device.load_music(&config.narrator),
            sweep: device.create_waveform(WaveformKind::Sine, config.sweep_amplitude, 500.0),
            coin: CurveEffect::coin(device),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Advance by `dt` seconds; returns false once the sequence is over
    pub fn tick(&mut self, dt: f64) -> bool {
        self.stage_time += dt;

        match self.stage {
            Stage::NarrationPart1 => {
                self.narrator.play();
                if self.stage_time > NARRATION_1 {
                    self.narrator.pause();
                    self.advance(Stage::Sweep);
                }
            }
            Stage::Sweep => {
                self.sweep.start();
                let frequency = sweep_frequency(self.stage_time);
                tracing::debug!(frequency, "sweep");
                self.sweep.set_frequency(frequency as f32);

                if self.stage_time > SWEEP {
                    self.sweep.stop();
                    self.advance(Stage::NarrationPart2);
                }
            }
            Stage::NarrationPart2 => {
                self.narrator.play();
                if self.stage_time > NARRATION_2 {
                    self.narrator.pause();
                    self.advance(Stage::Coin);
                }
            }
            Stage::Coin => {
                self.coin.play();
                self.stage = Stage::Wait;
            }
            Stage::Wait => {
                self.coin.update(dt as f32);
                if self.stage_time > COIN_WAIT {
                    self.advance(Stage::NarrationPart3);
                }
            }
            Stage::NarrationPart3 => {
                self.narrator.play();
                if self.stage_time > NARRATION_3 {
                    self.narrator.stop();
                    self.advance(Stage::Done);
                }
            }
            Stage::Done => return false,
        }

        true
    }

    fn advance(&mut self, stage: Stage) {
        tracing::info!(from = ?self.stage, to = ?stage, "demo stage");
        self.stage = stage;
        self.stage_time = 0.0;
    }
}

/// Sweep between 20 Hz and 1020 Hz
fn sweep_frequency(t: f64) -> f64 {
    (t.sin() + 1.0) / 2.0 * 1000.0 + 20.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_audio::EngineConfig;

    fn demo(device: &Device) -> Demo {
        let config = AppConfig {
            narrator: "/no/such/narrator.flac".into(),
            ..AppConfig::default()
        };
        Demo::new(device, &config)
    }

    #[test]
    fn test_sweep_range() {
        assert_eq!(sweep_frequency(0.0), 520.0);
        assert!((sweep_frequency(std::f64::consts::FRAC_PI_2) - 1020.0).abs() < 1e-9);
        assert!((sweep_frequency(-std::f64::consts::FRAC_PI_2) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_walks_every_stage() {
        let device = Device::headless(&EngineConfig::default());
        let mut demo = demo(&device);
        let dt = 0.016;

        let mut seen = vec![demo.stage()];
        let mut ticks = 0;
        while demo.tick(dt) {
            if seen.last() != Some(&demo.stage()) {
                seen.push(demo.stage());
            }
            ticks += 1;
            assert!(ticks < 10_000, "demo never finished");
        }

        assert_eq!(
            seen,
            vec![
                Stage::NarrationPart1,
                Stage::Sweep,
                Stage::NarrationPart2,
                Stage::Coin,
                Stage::Wait,
                Stage::NarrationPart3,
                Stage::Done,
            ]
        );
        // The coin ran past its duration during the wait
        assert!(!demo.coin.is_playing());
        assert!(!demo.sweep.is_started());
    }

    #[test]
    fn test_sweep_starts_waveform() {
        let device = Device::headless(&EngineConfig::default());
        let mut demo = demo(&device);
        demo.advance(Stage::Sweep);
        demo.tick(0.5);
        assert!(demo.sweep.is_started());
        assert!((demo.sweep.frequency() as f64 - sweep_frequency(0.5)).abs() < 1e-3);
    }
}
