//! `chords.json` artifact I/O

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::analysis::result::AnalysisResult;
use crate::error::AnalysisError;

/// Write an analysis result as pretty-printed UTF-8 JSON
///
/// # Errors
///
/// Returns `AnalysisError::Io` if the file cannot be created or written and
/// `AnalysisError::Serialization` if encoding fails.
pub fn save_to_json<P: AsRef<Path>>(result: &AnalysisResult, path: P) -> Result<(), AnalysisError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    log::debug!(
        "Wrote {} chord events to {}",
        result.events.len(),
        path.display()
    );
    Ok(())
}

/// Read a previously written artifact
pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<AnalysisResult, AnalysisError> {
    let file = File::open(path.as_ref())?;
    let result = serde_json::from_reader(BufReader::new(file))?;
    Ok(result)
}
