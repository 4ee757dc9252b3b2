//! Sample-rate conversion to the analysis rate

use rubato::{FftFixedIn, Resampler};

use crate::error::AnalysisError;

/// Input chunk size fed to the FFT resampler
const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `from_rate` to `to_rate`
///
/// Uses rubato's synchronous FFT resampler. The resampler's output delay is
/// trimmed and the result is cut to `ceil(len * to_rate / from_rate)` samples,
/// so durations are preserved. Equal rates return the input unchanged.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for zero rates and
/// `AnalysisError::ProcessingError` if the resampler fails.
pub fn resample_mono(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, AnalysisError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Sample rates must be > 0".to_string(),
        ));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    log::debug!(
        "Resampling {} samples from {} Hz to {} Hz",
        samples.len(),
        from_rate,
        to_rate
    );

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1)
            .map_err(|e| AnalysisError::ProcessingError(format!("resampler setup: {}", e)))?;

    let expected_len =
        ((samples.len() as u64 * to_rate as u64 + from_rate as u64 - 1) / from_rate as u64) as usize;
    let delay = resampler.output_delay();
    let mut output: Vec<f32> = Vec::with_capacity(expected_len + delay + CHUNK_SIZE);

    let mut pos = 0;
    loop {
        let needed = resampler.input_frames_next();
        if pos + needed > samples.len() {
            break;
        }
        let chunk: [&[f32]; 1] = [&samples[pos..pos + needed]];
        let out = resampler
            .process(&chunk[..], None)
            .map_err(|e| AnalysisError::ProcessingError(format!("resampling: {}", e)))?;
        output.extend_from_slice(&out[0]);
        pos += needed;
    }

    if pos < samples.len() {
        let tail: [&[f32]; 1] = [&samples[pos..]];
        let out = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|e| AnalysisError::ProcessingError(format!("resampling: {}", e)))?;
        output.extend_from_slice(&out[0]);
    }

    // Flush until the delayed tail is out
    while output.len() < expected_len + delay {
        let out = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| AnalysisError::ProcessingError(format!("resampling: {}", e)))?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    let start = delay.min(output.len());
    let mut resampled = output.split_off(start);
    resampled.resize(expected_len, 0.0);
    Ok(resampled)
}
