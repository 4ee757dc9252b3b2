//! Audio decoding using Symphonia
//!
//! Loads any container/codec Symphonia supports (mp3, wav, flac, ogg, ...),
//! downmixes to mono and resamples to the configured analysis rate.

use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use super::source::{AudioInput, AudioSource};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_to_mono;
use crate::preprocessing::resample::resample_mono;

/// Decode an audio file to interleaved f32 samples
///
/// # Returns
///
/// Tuple of (interleaved samples, sample_rate, channels)
pub fn decode_interleaved(path: &Path) -> Result<(Vec<f32>, u32, usize), AnalysisError> {
    log::debug!("Decoding audio file: {}", path.display());

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            AnalysisError::DecodingError(format!(
                "No supported audio tracks found in {}",
                path.display()
            ))
        })?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut interleaved: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(err.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count();

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupted packets are skipped
                log::warn!("Skipping undecodable packet in {}: {}", path.display(), msg);
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }

    if sample_rate == 0 {
        return Err(AnalysisError::DecodingError(format!(
            "Missing sample rate in {}",
            path.display()
        )));
    }
    if channels == 0 {
        channels = 1;
    }

    Ok((interleaved, sample_rate, channels))
}

/// Decode an audio file into a mono source at the configured analysis rate
///
/// `config.sample_rate == 0` keeps the file's native rate.
///
/// # Errors
///
/// Returns `AnalysisError::Io` if the file cannot be opened and
/// `AnalysisError::DecodingError` if it cannot be decoded.
pub fn decode_audio_file<P: AsRef<Path>>(
    path: P,
    config: &AnalysisConfig,
) -> Result<AudioSource, AnalysisError> {
    let path = path.as_ref();
    let (interleaved, native_rate, channels) = decode_interleaved(path)?;
    let mono = downmix_to_mono(&interleaved, channels)?;
    drop(interleaved);

    let (samples, sample_rate) = if config.sample_rate == 0 || config.sample_rate == native_rate {
        (mono, native_rate)
    } else {
        (
            resample_mono(&mono, native_rate, config.sample_rate)?,
            config.sample_rate,
        )
    };

    log::debug!(
        "Loaded {}: {} Hz, {} channel(s) -> {} mono samples at {} Hz",
        path.display(),
        native_rate,
        channels,
        samples.len(),
        sample_rate
    );

    AudioSource::new(samples, sample_rate)
}

/// Audio file on disk, decoded when analyzed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    /// Path to the file
    pub path: PathBuf,
}

impl AudioFile {
    /// Reference a file by path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl AudioInput for AudioFile {
    fn load(&self, config: &AnalysisConfig) -> Result<Cow<'_, AudioSource>, AnalysisError> {
        decode_audio_file(&self.path, config).map(Cow::Owned)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
