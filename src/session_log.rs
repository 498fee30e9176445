//! Plain-text transcript of REPL exchanges

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionLogError {
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write session log {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    /// Prepare a log at `path`, creating its parent directory if needed.
    /// The file itself is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionLogError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SessionLogError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark the start of a session.
    pub fn start_session(&self, at: DateTime<Utc>) -> Result<(), SessionLogError> {
        self.write(&format!(
            "--- Session started {} ---\n\n",
            at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ))
    }

    pub fn append(&self, user: &str, reply: &str) -> Result<(), SessionLogError> {
        self.write(&format!("You: {user}\nCo-Pilot: {reply}\n\n"))
    }

    /// Truncate the log.
    pub fn clear(&self) -> Result<(), SessionLogError> {
        File::create(&self.path)
            .map(drop)
            .map_err(|source| self.write_error(source))
    }

    fn write(&self, text: &str) -> Result<(), SessionLogError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(text.as_bytes()))
            .map_err(|source| self.write_error(source))
    }

    fn write_error(&self, source: std::io::Error) -> SessionLogError {
        SessionLogError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
