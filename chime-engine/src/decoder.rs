//! Audio file decoding using Symphonia
//!
//! Files are decoded in full, folded to stereo and resampled to the engine
//! rate so voices can read frames without any conversion on the audio thread.

use crate::error::EngineError;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded interleaved stereo audio
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedAudio {
    /// Wrap interleaved stereo samples; a trailing half frame is dropped
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Self {
        samples.truncate(samples.len() / 2 * 2);
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode a file to stereo at `target_sample_rate`
pub fn decode_file(path: &Path, target_sample_rate: u32) -> Result<DecodedAudio, EngineError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create hint from file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_error)?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(EngineError::NoAudioTrack)?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_sample_rate = codec_params.sample_rate.unwrap_or(44100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(decode_error)?;

    let mut stereo: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(_) => break,
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(_) => continue,
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        fold_to_stereo(sample_buf.samples(), channels, &mut stereo);
    }

    if stereo.is_empty() {
        return Err(EngineError::Decode("no audio frames decoded".into()));
    }

    let samples = if source_sample_rate != target_sample_rate {
        resample_stereo(&stereo, source_sample_rate, target_sample_rate)?
    } else {
        stereo
    };

    tracing::debug!(
        path = %path.display(),
        source_sample_rate,
        frames = samples.len() / 2,
        "decoded audio file"
    );

    Ok(DecodedAudio::new(samples, target_sample_rate))
}

/// Append `interleaved` (with `channels` channels) to `out` as stereo
///
/// Mono is duplicated to both sides; channels past the first two are dropped.
fn fold_to_stereo(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => out.extend(interleaved.iter().flat_map(|&s| [s, s])),
        2 => out.extend_from_slice(interleaved),
        n => {
            for frame in interleaved.chunks_exact(n) {
                out.push(frame[0]);
                out.push(frame[1]);
            }
        }
    }
}

/// Resample interleaved stereo audio
///
/// Input is fed in fixed-size blocks, the last one zero-padded, and the
/// output is cut to the length the rate ratio calls for.
fn resample_stereo(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, EngineError> {
    use rubato::{FftFixedInOut, Resampler};

    let mut resampler =
        FftFixedInOut::<f32>::new(source_rate as usize, target_rate as usize, 1024, 2)
            .map_err(decode_error)?;
    let block = resampler.input_frames_next();

    let frames = samples.len() / 2;
    let expected = (frames as u64 * u64::from(target_rate) / u64::from(source_rate)) as usize;
    let mut planar = [vec![0.0f32; block], vec![0.0f32; block]];
    let mut resampled = Vec::with_capacity((expected + resampler.output_frames_next()) * 2);

    for input in samples.chunks(block * 2) {
        let filled = input.len() / 2;
        for (i, frame) in input.chunks_exact(2).enumerate() {
            planar[0][i] = frame[0];
            planar[1][i] = frame[1];
        }
        for channel in planar.iter_mut() {
            channel[filled..].fill(0.0);
        }

        let output = resampler.process(&planar[..], None).map_err(decode_error)?;
        resampled.extend(output[0].iter().zip(&output[1]).flat_map(|(&l, &r)| [l, r]));
    }

    resampled.truncate(expected * 2);
    Ok(resampled)
}

fn decode_error(err: impl std::fmt::Display) -> EngineError {
    EngineError::Decode(err.to_string())
}
