use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes the final page markup with a leading comment recording when it was
/// taken.
pub fn write_snapshot(
    target: &Path,
    markup: &str,
    taken_at: DateTime<Utc>,
) -> Result<PathBuf, SnapshotError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = target
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| SnapshotError::OutputDir(format!("no file name in {target:?}")))?;

    let content = format!(
        "<!-- quicksearch snapshot {} -->\n{}\n",
        taken_at.to_rfc3339(),
        markup
    );
    AtomicFileWriter::new(dir).write(filename, &content)
}

/// Creates `dir` if missing and checks it accepts new files.
fn ensure_output_dir(dir: &Path) -> Result<(), SnapshotError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| SnapshotError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(SnapshotError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| SnapshotError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| SnapshotError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes `{dir}/{filename}` through a temp file in the same directory and a
/// rename, so readers never see a partial snapshot.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, SnapshotError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| SnapshotError::Io(e.error))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_is_written_with_timestamp_header() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("page.html");
        let taken_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        let written = write_snapshot(&target, "<html></html>", taken_at).unwrap();

        assert_eq!(written, target);
        let content = fs::read_to_string(&target).unwrap();
        assert_eq!(
            content,
            "<!-- quicksearch snapshot 2024-05-01T12:30:00+00:00 -->\n<html></html>\n"
        );
    }

    #[test]
    fn existing_snapshot_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AtomicFileWriter::new(dir.path().to_path_buf());

        writer.write("page.html", "first").unwrap();
        let path = writer.write("page.html", "second").unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = AtomicFileWriter::new(blocker).write("page.html", "x").unwrap_err();
        assert!(matches!(err, SnapshotError::OutputDir(_)));
    }
}
