use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

/// Small text files kept under the state directory. A save goes through a
/// sibling temp file and a rename, so a load sees the old content or the new,
/// never a mix.
#[derive(Debug, Clone)]
pub struct StateFiles {
    dir: PathBuf,
}

impl StateFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn save(&self, name: &str, content: &str) -> Result<PathBuf, StateFileError> {
        self.prepare_dir()?;

        let target = self.dir.join(name);
        let write_err = |source: io::Error| StateFileError::Io {
            action: "write",
            path: target.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        staged.write_all(content.as_bytes()).map_err(write_err)?;
        staged.as_file().sync_all().map_err(write_err)?;
        staged.persist(&target).map_err(|err| write_err(err.error))?;
        Ok(target)
    }

    /// `None` when `name` has never been saved.
    pub fn load(&self, name: &str) -> Result<Option<String>, StateFileError> {
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StateFileError::Io {
                action: "read",
                path,
                source,
            }),
        }
    }

    fn prepare_dir(&self) -> Result<(), StateFileError> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(StateFileError::NotADirectory(self.dir.clone()));
        }
        fs::create_dir_all(&self.dir).map_err(|source| StateFileError::Io {
            action: "create",
            path: self.dir.clone(),
            source,
        })
    }
}
