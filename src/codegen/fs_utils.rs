//! Filesystem output for code generation

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::codegen::error::WriteError;
use crate::codegen::project_config::OverwritePolicy;

/// Write content to a file, creating parent directories if needed
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, contents)
}

/// What happened to one target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file existed and the policy keeps existing files
    Skipped,
}

/// Writes rendered artifacts under an output root.
///
/// Paths handed to [`OutputWriter::write`] are relative to the root. Counts
/// of written and skipped files accumulate across calls.
#[derive(Debug)]
pub struct OutputWriter {
    root: PathBuf,
    policy: OverwritePolicy,
    written: usize,
    skipped: usize,
}

impl OutputWriter {
    pub fn new<P: Into<PathBuf>>(root: P, policy: OverwritePolicy) -> Self {
        Self {
            root: root.into(),
            policy,
            written: 0,
            skipped: 0,
        }
    }

    /// Write `content` to `root/relative`, honouring the overwrite policy.
    pub fn write<P: AsRef<Path>>(&mut self, relative: P, content: &str) -> Result<WriteOutcome, WriteError> {
        let path = self.root.join(relative.as_ref());

        if self.policy == OverwritePolicy::SkipExisting && path.exists() {
            tracing::warn!(path = %path.display(), "File exists, skipping");
            self.skipped += 1;
            return Ok(WriteOutcome::Skipped);
        }

        write_file(&path, content).map_err(|source| WriteError {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        self.written += 1;
        Ok(WriteOutcome::Written)
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_directories_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut writer = OutputWriter::new(dir.path(), OverwritePolicy::Always);

        let outcome = writer.write("backend/models/employee.py", "first").unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        writer.write("backend/models/employee.py", "second").unwrap();

        let content = fs::read_to_string(dir.path().join("backend/models/employee.py")).unwrap();
        assert_eq!(content, "second");
        assert_eq!(writer.written(), 2);
        assert_eq!(writer.skipped(), 0);
    }

    #[test]
    fn test_skip_existing_keeps_user_edits() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("frontend/src/App.vue");
        write_file(&target, "edited by hand").unwrap();

        let mut writer = OutputWriter::new(dir.path(), OverwritePolicy::SkipExisting);
        assert_eq!(writer.write("frontend/src/App.vue", "generated").unwrap(), WriteOutcome::Skipped);
        assert_eq!(writer.write("frontend/src/main.js", "generated").unwrap(), WriteOutcome::Written);

        assert_eq!(fs::read_to_string(&target).unwrap(), "edited by hand");
        assert_eq!((writer.written(), writer.skipped()), (1, 1));
    }

    #[test]
    fn test_write_error_names_the_path() {
        let dir = TempDir::new().unwrap();
        // A file where a directory is needed
        write_file(dir.path().join("backend"), "not a directory").unwrap();

        let mut writer = OutputWriter::new(dir.path(), OverwritePolicy::Always);
        let err = writer.write("backend/main.py", "app").unwrap_err();
        assert!(err.path.ends_with("backend/main.py"));
        assert_eq!(writer.written(), 0);
    }
}
