//! Chord sequencing
//!
//! Runs the full single-source pipeline (chroma → segments → matches) and
//! turns per-segment matches into chord-change events.
//!
//! A segment emits an event only if its label differs from the last emitted
//! label and its confidence is strictly above the threshold. Segments that
//! fail either test are absorbed: nothing is emitted and the tracked
//! "current chord" is left unchanged.

use std::time::Instant;

use super::result::{AnalysisResult, ChordEvent};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::chord::{match_chord, ChordTemplateBank};
use crate::features::chroma::{frames_per_segment, segment_frames, ChromaExtractor, Segment};
use crate::io::source::{AudioInput, AudioSource};

/// Single-source chord analysis with an immutable configuration and template bank
///
/// Holds no mutable state, so one sequencer can be shared across threads and
/// reused for any number of sources.
#[derive(Debug, Clone)]
pub struct ChordSequencer {
    config: AnalysisConfig,
    templates: ChordTemplateBank,
}

impl ChordSequencer {
    /// Create a sequencer with the standard template bank
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::with_templates(config, ChordTemplateBank::new())
    }

    /// Create a sequencer with a custom template bank
    pub fn with_templates(
        config: AnalysisConfig,
        templates: ChordTemplateBank,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config, templates })
    }

    /// Analysis configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Template bank used for matching
    pub fn templates(&self) -> &ChordTemplateBank {
        &self.templates
    }

    /// Convert time-ordered segments into chord-change events
    pub fn sequence(&self, segments: &[Segment]) -> Vec<ChordEvent> {
        let threshold = self.config.confidence_threshold;
        let mut events: Vec<ChordEvent> = Vec::new();
        let mut current: Option<String> = None;

        for segment in segments {
            let matched = match_chord(&segment.chroma, &self.templates);
            let label = matched.label();

            if current.as_deref() == Some(label.as_str()) || matched.confidence <= threshold {
                continue;
            }

            events.push(ChordEvent {
                time: segment.start,
                chord: label.clone(),
                confidence: matched.confidence,
            });
            current = Some(label);
        }

        events
    }

    /// Analyze mono samples, propagating failures
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate or invalid
    /// configuration and `AnalysisError::NumericalError` if a sample is NaN or
    /// infinite.
    pub fn try_analyze_samples(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<AnalysisResult, AnalysisError> {
        let start_time = Instant::now();

        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate".to_string(),
            ));
        }
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::NumericalError(format!(
                "Non-finite sample at index {}",
                pos
            )));
        }

        let extractor = ChromaExtractor::new(&self.config, sample_rate)?;
        let frames = extractor.extract(samples);
        let per_segment =
            frames_per_segment(self.config.segment_duration, sample_rate, self.config.hop_size)?;
        let segments = segment_frames(&frames, per_segment)?;
        drop(frames);

        let events = self.sequence(&segments);

        log::debug!(
            "Sequenced {} segments into {} chord events in {:.1} ms",
            segments.len(),
            events.len(),
            start_time.elapsed().as_secs_f32() * 1000.0
        );

        Ok(AnalysisResult {
            duration: (samples.len() as f64 / sample_rate as f64) as f32,
            events,
            sample_rate,
            hop_size: self.config.hop_size,
            primary_stem: None,
            error: None,
        })
    }

    /// Analyze mono samples without copying them
    ///
    /// Never fails: errors are reported in [`AnalysisResult::error`] with
    /// duration 0 and no events.
    pub fn analyze_samples(&self, samples: &[f32], sample_rate: u32) -> AnalysisResult {
        self.try_analyze_samples(samples, sample_rate)
            .unwrap_or_else(|e| self.failure(&e))
    }

    /// Analyze one decoded source, propagating failures
    ///
    /// # Errors
    ///
    /// See [`ChordSequencer::try_analyze_samples`]
    pub fn try_analyze(&self, source: &AudioSource) -> Result<AnalysisResult, AnalysisError> {
        self.try_analyze_samples(&source.samples, source.sample_rate)
    }

    /// Analyze one decoded source
    ///
    /// Never fails: errors are reported in [`AnalysisResult::error`] with
    /// duration 0 and no events.
    pub fn analyze(&self, source: &AudioSource) -> AnalysisResult {
        self.analyze_samples(&source.samples, source.sample_rate)
    }

    /// Load and analyze any audio input (in-memory source or file)
    ///
    /// Loading failures (missing file, undecodable data) become an error result.
    pub fn analyze_input<I: AudioInput + ?Sized>(&self, input: &I) -> AnalysisResult {
        match input.load(&self.config) {
            Ok(source) => self.analyze(&source),
            Err(e) => {
                log::warn!("Could not load {}: {}", input.describe(), e);
                self.failure(&e)
            }
        }
    }

    fn failure(&self, error: &AnalysisError) -> AnalysisResult {
        log::debug!("Analysis failed: {}", error);
        AnalysisResult::failed(error, self.config.hop_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f32, chroma: [f32; 12]) -> Segment {
        Segment {
            start,
            first_frame: 0,
            frame_count: 1,
            chroma,
        }
    }

    fn triad(root: usize, third: usize) -> [f32; 12] {
        let mut v = [0.0f32; 12];
        v[root % 12] = 1.0;
        v[(root + third) % 12] = 0.8;
        v[(root + 7) % 12] = 0.8;
        v
    }

    fn sequencer() -> ChordSequencer {
        ChordSequencer::new(AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_change_detection() {
        let segments = vec![
            segment(0.0, triad(0, 4)),
            segment(2.0, triad(0, 4)),
            segment(4.0, triad(7, 4)),
            segment(6.0, triad(9, 3)),
            segment(8.0, triad(9, 3)),
            segment(10.0, triad(0, 4)),
        ];
        let events = sequencer().sequence(&segments);
        let labels: Vec<&str> = events.iter().map(|e| e.chord.as_str()).collect();
        assert_eq!(labels, vec!["C", "G", "Am", "C"]);
        let times: Vec<f32> = events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0.0, 4.0, 6.0, 10.0]);
    }

    #[test]
    fn test_low_confidence_is_absorbed() {
        // A threshold no match can clear: nothing emitted, current chord never set.
        let mut config = AnalysisConfig::default();
        config.confidence_threshold = 1.0;
        let seq = ChordSequencer::new(config).unwrap();
        let segments = vec![segment(0.0, triad(0, 4)), segment(2.0, triad(7, 4))];
        assert!(seq.sequence(&segments).is_empty());
    }

    #[test]
    fn test_absorbed_segment_does_not_reset_current_chord() {
        // C, (rejected G), C -> only one C event because current stays C.
        let mut config = AnalysisConfig::default();
        config.confidence_threshold = 0.9;
        let seq = ChordSequencer::new(config).unwrap();

        // Nearly flat vector peaking on G: correlates only weakly with any template
        let mut weak_g = [0.9f32; 12];
        weak_g[7] = 1.0;
        let weak = match_chord(&weak_g, seq.templates());
        assert_eq!(weak.label(), "G");
        assert!(weak.confidence <= 0.9);

        let c = {
            let mut v = [0.0f32; 12];
            v[0] = 1.0;
            v[4] = 1.0;
            v[7] = 1.0;
            v
        };
        let events = seq.sequence(&[segment(0.0, c), segment(2.0, weak_g), segment(4.0, c)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chord, "C");
    }

    #[test]
    fn test_silent_segments_follow_confidence_formula() {
        // Silent vectors score 0 -> confidence 0.5 -> above 0.3, labelled "C".
        let segments = vec![segment(0.0, [0.0; 12]), segment(2.0, [0.0; 12])];
        let events = sequencer().sequence(&segments);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chord, "C");
        assert!((events[0].confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_analyze_silence() {
        let source = AudioSource::new(vec![0.0; 22050 * 6], 22050).unwrap();
        let result = sequencer().analyze(&source);
        assert!(result.error.is_none());
        assert!((result.duration - 6.0).abs() < 1e-6);
        assert_eq!(result.sample_rate, 22050);
        assert_eq!(result.hop_size, 512);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].time, 0.0);
        assert_eq!(result.events[0].chord, "C");
    }

    #[test]
    fn test_analyze_invalid_source_reports_error() {
        let source = AudioSource {
            samples: vec![0.1; 100],
            sample_rate: 0,
        };
        let result = sequencer().analyze(&source);
        assert_eq!(result.duration, 0.0);
        assert!(result.events.is_empty());
        assert!(result.error.is_some());
    }

    #[test]
    fn test_non_finite_samples_are_numerical_errors() {
        let mut samples = vec![0.1f32; 4096];
        samples[1000] = f32::NAN;
        let seq = sequencer();
        assert!(matches!(
            seq.try_analyze_samples(&samples, 22050),
            Err(AnalysisError::NumericalError(_))
        ));

        samples[1000] = f32::INFINITY;
        let result = seq.analyze_samples(&samples, 22050);
        assert_eq!(result.duration, 0.0);
        assert!(result.events.is_empty());
        assert!(result.error.unwrap().starts_with("Numerical error"));
    }

    #[test]
    fn test_slice_and_source_entry_points_agree() {
        let samples: Vec<f32> = (0..22050 * 3)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 22050.0).sin() * 0.5)
            .collect();
        let seq = sequencer();
        let from_slice = seq.analyze_samples(&samples[..], 22050);
        let source = AudioSource::new(samples, 22050).unwrap();
        assert_eq!(from_slice, seq.analyze(&source));
        assert!((from_slice.duration - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_events_ordered_without_repeats() {
        let segments: Vec<Segment> = (0..24)
            .map(|i| segment(i as f32 * 2.0, triad((i / 2) * 5, if i % 3 == 0 { 3 } else { 4 })))
            .collect();
        let events = sequencer().sequence(&segments);
        for pair in events.windows(2) {
            assert!(pair[1].time > pair[0].time);
            assert_ne!(pair[1].chord, pair[0].chord);
        }
    }
}
