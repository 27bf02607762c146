//! Marker file handing the created conversation id between probe steps.
//!
//! The file holds a single `CONVERSATION_ID=<id>` line. [`MarkerFile`] is a
//! scoped guard: dropping it deletes the file, so every exit path of the
//! binary that unwinds normally leaves no marker behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MARKER_KEY: &str = "CONVERSATION_ID";

#[derive(Debug)]
pub struct MarkerFile {
    path: PathBuf,
}

impl MarkerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the id, replacing any previous content.
    pub fn store(&self, conversation_id: &str) -> io::Result<()> {
        fs::write(&self.path, format!("{}={}\n", MARKER_KEY, conversation_id))?;
        debug!(path = %self.path.display(), conversation_id, "Marker file written");
        Ok(())
    }

    /// Read the stored id. `Ok(None)` when the file is absent or holds no id.
    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(parse_marker(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete the file. Deleting a file that is already gone succeeds.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for MarkerFile {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            debug!(path = %self.path.display(), error = %e, "Failed to remove marker file");
        }
    }
}

fn parse_marker(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        let value = value.trim();
        (key.trim() == MARKER_KEY && !value.is_empty()).then(|| value.to_string())
    })
}
