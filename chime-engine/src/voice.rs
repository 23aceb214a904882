//! Sound voice - playback of decoded sample data
//!
//! A voice is the engine-side half of a loaded sound. It owns a read cursor
//! over shared, pre-decoded stereo frames and the per-sound playback state
//! (volume, pan, pitch, looping, fades and scheduled start/stop).

use crate::decoder::DecodedAudio;
use crate::spatial::SpatialParams;
use std::sync::Arc;

/// Where a voice gets its frames from
#[derive(Debug, Clone, Default)]
pub enum VoiceSource {
    /// Decoding has not finished yet
    #[default]
    Pending,
    /// Decoded frames at the engine sample rate
    Ready(Arc<DecodedAudio>),
    /// Decoding failed; the voice stays silent
    Failed,
}

/// Linear gain ramp measured in frames
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    length: u64,
    elapsed: u64,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            from: 1.0,
            to: 1.0,
            length: 0,
            elapsed: 0,
        }
    }
}

impl Fade {
    fn level(&self) -> f32 {
        if self.elapsed >= self.length {
            return self.to;
        }
        let t = self.elapsed as f32 / self.length as f32;
        self.from + (self.to - self.from) * t
    }

    #[inline]
    fn advance(&mut self) -> f32 {
        let level = self.level();
        if self.elapsed < self.length {
            self.elapsed += 1;
        }
        level
    }
}

/// Engine-side sound playback state
#[derive(Debug, Clone)]
pub struct SoundVoice {
    source: VoiceSource,
    /// Read position in frames (fractional when pitched)
    cursor: f64,
    playing: bool,
    looping: bool,
    at_end: bool,
    volume: f32,
    pan: f32,
    pitch: f32,
    fade: Fade,
    /// Engine clock (frames) before which the voice stays silent
    start_at: Option<u64>,
    /// Engine clock (frames) at which the voice stops itself
    stop_at: Option<u64>,
    spatialized: bool,
    spatial: SpatialParams,
}

impl SoundVoice {
    /// Create a stopped voice
    pub fn new(source: VoiceSource, spatialized: bool) -> Self {
        Self {
            source,
            cursor: 0.0,
            playing: false,
            looping: false,
            at_end: false,
            volume: 1.0,
            pan: 0.0,
            pitch: 1.0,
            fade: Fade::default(),
            start_at: None,
            stop_at: None,
            spatialized,
            spatial: SpatialParams::default(),
        }
    }

    pub fn source(&self) -> &VoiceSource {
        &self.source
    }

    /// Install decoded frames (or a failure) once decoding finishes
    pub fn set_source(&mut self, source: VoiceSource) {
        self.source = source;
        self.at_end = false;
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.source, VoiceSource::Failed)
    }

    /// Number of frames available, 0 until decoded
    pub fn frames(&self) -> usize {
        match &self.source {
            VoiceSource::Ready(audio) => audio.frames(),
            _ => 0,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        match &self.source {
            VoiceSource::Ready(audio) => audio.duration_secs() as f32,
            _ => 0.0,
        }
    }

    /// Start (or resume) playback; a finished voice restarts from the top
    pub fn play(&mut self) {
        if self.at_end {
            self.cursor = 0.0;
            self.at_end = false;
        }
        self.playing = true;
    }

    /// Stop playback, keeping the cursor where it is
    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// True once a non-looping voice has played past its last frame
    pub fn is_at_end(&self) -> bool {
        self.at_end
    }

    /// Move the cursor to `frame`
    ///
    /// Past the data, a looping voice wraps and any other voice ends.
    /// Before decoding finishes the position is kept as given.
    pub fn seek(&mut self, frame: u64) {
        let frames = self.frames() as u64;
        if frames == 0 || frame < frames {
            self.cursor = frame as f64;
            self.at_end = false;
        } else if self.looping {
            self.cursor = (frame % frames) as f64;
            self.at_end = false;
        } else {
            self.cursor = frames as f64;
            self.playing = false;
            self.at_end = true;
        }
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Stereo balance (-1.0 = left, 1.0 = right)
    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Playback rate; non-positive values are ignored
    pub fn set_pitch(&mut self, pitch: f32) {
        if pitch > 0.0 {
            self.pitch = pitch;
        }
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Ramp from the current fade level to `end_volume` over `frames`
    pub fn set_fade(&mut self, end_volume: f32, frames: u64) {
        self.fade = Fade {
            from: self.fade.level(),
            to: end_volume.max(0.0),
            length: frames,
            elapsed: 0,
        };
    }

    /// Current fade multiplier
    pub fn fade_level(&self) -> f32 {
        self.fade.level()
    }

    pub fn set_start_time(&mut self, clock: u64) {
        self.start_at = Some(clock);
    }

    pub fn set_stop_time(&mut self, clock: u64) {
        self.stop_at = Some(clock);
    }

    pub fn is_spatialized(&self) -> bool {
        self.spatialized
    }

    pub fn spatial(&self) -> &SpatialParams {
        &self.spatial
    }

    pub fn spatial_mut(&mut self) -> &mut SpatialParams {
        &mut self.spatial
    }

    /// Add this voice to an interleaved stereo buffer whose first frame
    /// plays at engine clock `clock`
    pub fn render(&mut self, output: &mut [f32], clock: u64) {
        if !self.playing {
            return;
        }

        let audio = match &self.source {
            VoiceSource::Ready(audio) => Arc::clone(audio),
            _ => return,
        };
        let frames = audio.frames();
        if frames == 0 {
            self.playing = false;
            self.at_end = true;
            return;
        }

        let samples = audio.samples();
        // Balance pan: only the opposite side is attenuated
        let gain_l = if self.pan > 0.0 { 1.0 - self.pan } else { 1.0 };
        let gain_r = if self.pan < 0.0 { 1.0 + self.pan } else { 1.0 };

        for (i, frame) in output.chunks_exact_mut(2).enumerate() {
            let now = clock + i as u64;

            if self.stop_at.is_some_and(|stop| now >= stop) {
                self.stop_at = None;
                self.playing = false;
                break;
            }
            if self.start_at.is_some_and(|start| now < start) {
                continue;
            }

            let idx = (self.cursor as usize).min(frames - 1);
            let gain = self.volume * self.fade.advance();
            frame[0] += samples[idx * 2] * gain * gain_l;
            frame[1] += samples[idx * 2 + 1] * gain * gain_r;

            self.cursor += f64::from(self.pitch);
            if self.cursor >= frames as f64 {
                if self.looping {
                    self.cursor %= frames as f64;
                } else {
                    self.cursor = frames as f64;
                    self.playing = false;
                    self.at_end = true;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_voice(frames: usize) -> SoundVoice {
        let samples: Vec<f32> = (0..frames).flat_map(|i| [i as f32, -(i as f32)]).collect();
        let audio = DecodedAudio::new(samples, 48000);
        SoundVoice::new(VoiceSource::Ready(Arc::new(audio)), true)
    }

    #[test]
    fn test_stopped_voice_is_silent() {
        let mut voice = ramp_voice(8);
        let mut out = vec![0.0; 8];
        voice.render(&mut out, 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_plays_frames_in_order() {
        let mut voice = ramp_voice(8);
        voice.play();
        let mut out = vec![0.0; 8];
        voice.render(&mut out, 0);
        assert_eq!(out, vec![0.0, 0.0, 1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        assert!(voice.is_playing());
        assert!(!voice.is_at_end());
    }

    #[test]
    fn test_non_looping_reaches_end() {
        let mut voice = ramp_voice(4);
        voice.play();
        let mut out = vec![0.0; 16];
        voice.render(&mut out, 0);
        assert!(!voice.is_playing());
        assert!(voice.is_at_end());
        // Nothing written past the data
        assert!(out[8..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_looping_never_ends() {
        let mut voice = ramp_voice(4);
        voice.set_looping(true);
        voice.play();
        let mut out = vec![0.0; 64];
        voice.render(&mut out, 0);
        assert!(voice.is_playing());
        assert!(!voice.is_at_end());
        assert_eq!(out[8], 0.0);
        assert_eq!(out[10], 1.0);
    }

    #[test]
    fn test_play_after_end_restarts() {
        let mut voice = ramp_voice(2);
        voice.play();
        let mut out = vec![0.0; 8];
        voice.render(&mut out, 0);
        assert!(voice.is_at_end());

        voice.play();
        assert!(!voice.is_at_end());
        assert_eq!(voice.cursor(), 0.0);
    }

    #[test]
    fn test_seek_past_end_reports_end() {
        let mut voice = ramp_voice(4);
        voice.play();
        voice.seek(4);
        assert!(voice.is_at_end());
        assert!(!voice.is_playing());

        let mut out = vec![0.0; 8];
        voice.render(&mut out, 0);
        assert!(out.iter().all(|&s| s == 0.0));

        voice.seek(3);
        assert!(!voice.is_at_end());
        voice.play();
        voice.render(&mut out, 0);
        assert_eq!(&out[..2], &[3.0, -3.0]);
    }

    #[test]
    fn test_seek_past_end_wraps_when_looping() {
        let mut voice = ramp_voice(4);
        voice.set_looping(true);
        voice.seek(9);
        assert_eq!(voice.cursor(), 1.0);
        assert!(!voice.is_at_end());
    }

    #[test]
    fn test_stop_keeps_position() {
        let mut voice = ramp_voice(8);
        voice.play();
        let mut out = vec![0.0; 4];
        voice.render(&mut out, 0);
        voice.stop();
        assert_eq!(voice.cursor(), 2.0);
        voice.play();
        assert_eq!(voice.cursor(), 2.0);
    }

    #[test]
    fn test_pan_balance() {
        let samples = vec![1.0; 8];
        let mut voice = SoundVoice::new(
            VoiceSource::Ready(Arc::new(DecodedAudio::new(samples, 48000))),
            false,
        );
        voice.set_pan(0.5);
        voice.play();
        let mut out = vec![0.0; 2];
        voice.render(&mut out, 0);
        assert_eq!(out, vec![0.5, 1.0]);
    }

    #[test]
    fn test_scheduled_start_and_stop() {
        let mut voice = ramp_voice(16);
        voice.set_start_time(2);
        voice.set_stop_time(4);
        voice.play();
        let mut out = vec![0.0; 12];
        voice.render(&mut out, 0);
        // Frames 0-1 silent, 2-3 play data frames 0-1, stopped at clock 4
        assert_eq!(out, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(!voice.is_playing());
        assert!(!voice.is_at_end());
    }

    #[test]
    fn test_fade_ramps_linearly() {
        let mut voice = SoundVoice::new(
            VoiceSource::Ready(Arc::new(DecodedAudio::new(vec![1.0; 16], 48000))),
            false,
        );
        voice.set_fade(0.0, 4);
        voice.play();
        let mut out = vec![0.0; 10];
        voice.render(&mut out, 0);
        let left: Vec<f32> = out.iter().step_by(2).copied().collect();
        assert_eq!(left, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
        assert_eq!(voice.fade_level(), 0.0);
    }

    #[test]
    fn test_pending_and_failed_are_silent() {
        for source in [VoiceSource::Pending, VoiceSource::Failed] {
            let mut voice = SoundVoice::new(source, false);
            voice.play();
            let mut out = vec![0.0; 4];
            voice.render(&mut out, 0);
            assert!(out.iter().all(|&s| s == 0.0));
            assert_eq!(voice.duration_secs(), 0.0);
        }
    }

    #[test]
    fn test_pitch_ignores_non_positive() {
        let mut voice = ramp_voice(4);
        voice.set_pitch(2.0);
        voice.set_pitch(0.0);
        voice.set_pitch(-1.0);
        assert_eq!(voice.pitch(), 2.0);
    }
}
