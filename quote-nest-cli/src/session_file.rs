//! Signed-in principal persisted between `qn` invocations.

use quote_nest_core::Principal;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.yaml";

#[derive(Debug)]
pub enum SessionFileError {
    IoError(PathBuf, io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for SessionFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionFileError::IoError(path, e) => {
                write!(f, "Session file '{}': {}", path.display(), e)
            }
            SessionFileError::ParseError(path, e) => {
                write!(f, "Corrupt session file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for SessionFileError {}

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Principal>, SessionFileError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionFileError::IoError(self.path.clone(), e)),
        };

        serde_yaml::from_str(&contents)
            .map(Some)
            .map_err(|e| SessionFileError::ParseError(self.path.clone(), e))
    }

    pub fn save(&self, principal: &Principal) -> Result<(), SessionFileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SessionFileError::IoError(parent.to_path_buf(), e))?;
        }

        let contents = serde_yaml::to_string(principal).map_err(|e| {
            SessionFileError::IoError(
                self.path.clone(),
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;
        fs::write(&self.path, contents)
            .map_err(|e| SessionFileError::IoError(self.path.clone(), e))
    }

    /// Removes the saved session. Clearing a missing file succeeds.
    pub fn clear(&self) -> Result<(), SessionFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionFileError::IoError(self.path.clone(), e)),
        }
    }
}
