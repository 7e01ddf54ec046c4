use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::counting::CountAggregate;
use crate::error::SinkError;
use crate::traits::CountSink;

/// Count snapshot file, fully rewritten on every change
///
/// The new content goes to a `.tmp` sibling first and is renamed over the
/// target, so readers see either the previous snapshot or the new one.
#[derive(Debug, Clone)]
pub struct CountFile {
    path: PathBuf,
}

impl CountFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CountSink for CountFile {
    fn write_snapshot(&mut self, counts: &CountAggregate) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
        }

        let staging = self.staging_path();
        fs::write(&staging, counts.render()).map_err(|e| SinkError::io(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| SinkError::io(&self.path, e))?;

        debug!("Wrote {} count entries to {:?}", counts.iter().count(), self.path);
        Ok(())
    }
}
