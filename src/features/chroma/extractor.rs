//! Chroma vector extraction
//!
//! Converts mono audio into a sequence of 12-element pitch-class energy frames.
//!
//! Algorithm:
//! 1. Slice the signal into centered, Hann-windowed frames (`frame_size`),
//!    advancing `hop_size` samples per frame; samples outside the signal are zero
//! 2. FFT each frame and pick spectral peaks (local maxima within 40 dB of the
//!    frame maximum), refining each peak's frequency by parabolic interpolation
//! 3. Map every peak onto semitone-spaced (constant-Q) bins spanning
//!    `n_octaves` octaves from `min_midi_note`, spreading it over the nearest
//!    semitones with a Gaussian of width `soft_mapping_sigma`
//! 4. Fold the bins into 12 pitch classes (octave folding) and normalize each
//!    frame so its strongest pitch class is 1.0
//!
//! Silent or empty input produces all-zero frames, never an error.
//!
//! # Example
//!
//! ```
//! use chordsync::{AnalysisConfig, AudioSource};
//! use chordsync::features::chroma::extractor::extract_chroma;
//!
//! let source = AudioSource::new(vec![0.0f32; 22050], 22050)?;
//! let frames = extract_chroma(&source, &AnalysisConfig::default())?;
//! assert_eq!(frames.len(), 1 + 22050 / 512);
//! assert!(frames.iter().all(|f| f.energies == [0.0; 12]));
//! # Ok::<(), chordsync::AnalysisError>(())
//! ```

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::normalization::normalize_max_gated;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::source::AudioSource;

/// Peaks quieter than this (relative to the frame's strongest bin) are ignored
const PEAK_FLOOR_DB: f32 = -40.0;

/// Floor applied before taking logarithms
const MIN_MAGNITUDE: f32 = 1e-12;

/// Pitch-class energy at one time instant
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaFrame {
    /// Frame index
    pub index: usize,

    /// Frame time in seconds (`index * hop_size / sample_rate`)
    pub time: f32,

    /// Non-negative energies, 0 = C ... 11 = B
    pub energies: [f32; 12],
}

/// Chroma extractor with a precomputed window and FFT plan
pub struct ChromaExtractor {
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    tuning_frequency: f32,
    min_midi_note: f32,
    n_bins: usize,
    sigma: f32,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl ChromaExtractor {
    /// Create an extractor for audio at `sample_rate`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate or an
    /// invalid configuration.
    pub fn new(config: &AnalysisConfig, sample_rate: u32) -> Result<Self, AnalysisError> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate".to_string(),
            ));
        }

        let frame_size = config.frame_size;
        // Periodic Hann window
        let window: Vec<f32> = (0..frame_size)
            .map(|i| {
                0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / frame_size as f32).cos()
            })
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);

        Ok(Self {
            sample_rate,
            frame_size,
            hop_size: config.hop_size,
            tuning_frequency: config.tuning_frequency,
            min_midi_note: config.min_midi_note as f32,
            n_bins: config.n_octaves * 12,
            sigma: config.soft_mapping_sigma,
            window,
            fft,
        })
    }

    /// Number of frames produced for `n_samples` samples (centered framing)
    pub fn frame_count(&self, n_samples: usize) -> usize {
        1 + n_samples / self.hop_size
    }

    /// Extract one chroma frame per hop over the whole signal
    pub fn extract(&self, samples: &[f32]) -> Vec<ChromaFrame> {
        let n_frames = self.frame_count(samples.len());
        let half = (self.frame_size / 2) as isize;

        log::debug!(
            "Extracting chroma: {} samples at {} Hz, frame={}, hop={}, {} frames",
            samples.len(),
            self.sample_rate,
            self.frame_size,
            self.hop_size,
            n_frames
        );

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.frame_size];
        let mut magnitudes = vec![0.0f32; self.frame_size / 2 + 1];
        let mut frames = Vec::with_capacity(n_frames);

        for index in 0..n_frames {
            let start = (index * self.hop_size) as isize - half;
            let mut has_signal = false;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let pos = start + i as isize;
                let sample = if pos >= 0 && (pos as usize) < samples.len() {
                    samples[pos as usize]
                } else {
                    0.0
                };
                has_signal |= sample != 0.0;
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            let mut energies = [0.0f32; 12];
            if has_signal {
                self.fft.process(&mut buffer);
                for (mag, bin) in magnitudes.iter_mut().zip(buffer.iter()) {
                    *mag = bin.norm();
                }
                self.fold_peaks(&magnitudes, &mut energies);
                normalize_max_gated(&mut energies);
            }

            let time = (index as f64 * self.hop_size as f64 / self.sample_rate as f64) as f32;
            frames.push(ChromaFrame {
                index,
                time,
                energies,
            });
        }

        frames
    }

    /// Accumulate spectral peaks of one magnitude spectrum into pitch classes
    fn fold_peaks(&self, magnitudes: &[f32], energies: &mut [f32; 12]) {
        let max_mag = magnitudes.iter().cloned().fold(0.0f32, f32::max);
        if max_mag <= MIN_MAGNITUDE {
            return;
        }
        let floor = max_mag * 10f32.powf(PEAK_FLOOR_DB / 20.0);
        let bin_hz = self.sample_rate as f32 / self.frame_size as f32;

        for j in 1..magnitudes.len().saturating_sub(1) {
            let b = magnitudes[j];
            if b < floor || b <= magnitudes[j - 1] || b < magnitudes[j + 1] {
                continue;
            }

            // Parabolic interpolation on the dB spectrum
            let a_db = 20.0 * magnitudes[j - 1].max(MIN_MAGNITUDE).log10();
            let b_db = 20.0 * b.max(MIN_MAGNITUDE).log10();
            let c_db = 20.0 * magnitudes[j + 1].max(MIN_MAGNITUDE).log10();
            let denom = a_db - 2.0 * b_db + c_db;
            let offset = if denom.abs() > f32::EPSILON {
                (0.5 * (a_db - c_db) / denom).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            let peak_db = b_db - 0.25 * (a_db - c_db) * offset;
            let peak_mag = 10f32.powf(peak_db / 20.0);

            let freq = (j as f32 + offset) * bin_hz;
            if freq <= 0.0 {
                continue;
            }
            let midi = 69.0 + 12.0 * (freq / self.tuning_frequency).log2();
            self.spread_onto_semitones(midi, peak_mag, energies);
        }
    }

    /// Distribute one peak over the nearest semitone bins inside the analysis range
    fn spread_onto_semitones(&self, midi: f32, magnitude: f32, energies: &mut [f32; 12]) {
        let nearest = midi.round();
        for step in -1i32..=1 {
            let note = nearest + step as f32;
            let bin = note - self.min_midi_note;
            if bin < 0.0 || bin >= self.n_bins as f32 {
                continue;
            }
            let distance = midi - note;
            if distance.abs() >= 1.0 {
                continue;
            }
            let weight = (-0.5 * (distance / self.sigma).powi(2)).exp();
            let pitch_class = (note as i64).rem_euclid(12) as usize;
            energies[pitch_class] += weight * magnitude;
        }
    }
}

/// Extract chroma frames from an audio source
///
/// # Arguments
///
/// * `source` - Mono audio
/// * `config` - Analysis configuration (frame size, hop size, pitch range)
///
/// # Returns
///
/// `1 + samples / hop_size` frames, time-ordered
///
/// # Errors
///
/// Returns `AnalysisError` if the configuration or sample rate is invalid
pub fn extract_chroma(
    source: &AudioSource,
    config: &AnalysisConfig,
) -> Result<Vec<ChromaFrame>, AnalysisError> {
    let extractor = ChromaExtractor::new(config, source.sample_rate)?;
    Ok(extractor.extract(&source.samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, amplitude: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    fn mix(parts: &[Vec<f32>]) -> Vec<f32> {
        let len = parts.iter().map(|p| p.len()).max().unwrap_or(0);
        (0..len)
            .map(|i| parts.iter().map(|p| p.get(i).copied().unwrap_or(0.0)).sum())
            .collect()
    }

    fn mean_chroma(frames: &[ChromaFrame]) -> [f32; 12] {
        let mut mean = [0.0f32; 12];
        for f in frames {
            for i in 0..12 {
                mean[i] += f.energies[i] / frames.len() as f32;
            }
        }
        mean
    }

    #[test]
    fn test_frame_count_and_times() {
        let config = AnalysisConfig::default();
        let source = AudioSource::new(tone(440.0, 0.5, 22050, 1.0), 22050).unwrap();
        let frames = extract_chroma(&source, &config).unwrap();

        assert_eq!(frames.len(), 1 + 22050 / 512);
        for (i, f) in frames.iter().enumerate() {
            assert_eq!(f.index, i);
            let expected = i as f32 * 512.0 / 22050.0;
            assert!((f.time - expected).abs() < 1e-6);
        }
        for w in frames.windows(2) {
            assert!(w[1].time > w[0].time);
        }
    }

    #[test]
    fn test_a440_maps_to_a() {
        let config = AnalysisConfig::default();
        let source = AudioSource::new(tone(440.0, 0.5, 22050, 1.0), 22050).unwrap();
        let frames = extract_chroma(&source, &config).unwrap();
        let mean = mean_chroma(&frames[2..frames.len() - 2]);

        let argmax = (0..12).max_by(|&a, &b| mean[a].partial_cmp(&mean[b]).unwrap()).unwrap();
        assert_eq!(argmax, 9, "A440 should land on pitch class A, got {:?}", mean);
    }

    #[test]
    fn test_c_major_chord_energy() {
        let config = AnalysisConfig::default();
        let samples = mix(&[
            tone(261.63, 0.4, 22050, 1.0),
            tone(329.63, 0.3, 22050, 1.0),
            tone(392.00, 0.3, 22050, 1.0),
        ]);
        let source = AudioSource::new(samples, 22050).unwrap();
        let frames = extract_chroma(&source, &config).unwrap();
        let mean = mean_chroma(&frames[2..frames.len() - 2]);

        for pc in [0, 4, 7] {
            assert!(mean[pc] > 0.5, "chord tone {} too weak: {:?}", pc, mean);
        }
        for pc in [1, 2, 3, 5, 6, 8, 9, 10, 11] {
            assert!(mean[pc] < 0.3, "non-chord tone {} too strong: {:?}", pc, mean);
        }
    }

    #[test]
    fn test_energies_non_negative_and_bounded() {
        let config = AnalysisConfig::default();
        let samples = mix(&[tone(196.0, 0.3, 22050, 0.5), tone(523.25, 0.2, 22050, 0.5)]);
        let source = AudioSource::new(samples, 22050).unwrap();
        for f in extract_chroma(&source, &config).unwrap() {
            assert!(f.energies.iter().all(|&e| (0.0..=1.0).contains(&e)));
        }
    }

    #[test]
    fn test_silent_input_yields_zero_frames() {
        let config = AnalysisConfig::default();
        let source = AudioSource::new(vec![0.0; 10000], 22050).unwrap();
        let frames = extract_chroma(&source, &config).unwrap();
        assert_eq!(frames.len(), 1 + 10000 / 512);
        assert!(frames.iter().all(|f| f.energies == [0.0; 12]));
    }

    #[test]
    fn test_empty_input_yields_single_zero_frame() {
        let config = AnalysisConfig::default();
        let source = AudioSource::new(Vec::new(), 22050).unwrap();
        let frames = extract_chroma(&source, &config).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].energies, [0.0; 12]);
        assert_eq!(frames[0].time, 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut config = AnalysisConfig::default();
        config.hop_size = 0;
        let source = AudioSource::new(vec![0.1; 100], 22050).unwrap();
        assert!(extract_chroma(&source, &config).is_err());

        assert!(ChromaExtractor::new(&AnalysisConfig::default(), 0).is_err());
    }
}
