use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("cannot read access token: {0}")]
    Read(#[source] io::Error),
    #[error("cannot store access token: {0}")]
    Write(#[from] PersistError),
    #[error("token store lock poisoned")]
    Poisoned,
}

/// Holder of the bearer token sent with every authenticated request.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, TokenError>;
    fn save(&self, token: &str) -> Result<(), TokenError>;
    fn clear(&self) -> Result<(), TokenError>;
}

/// Token kept in a single file, e.g. `{state_dir}/access_token`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    writer: AtomicFileWriter,
    filename: String,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "access_token".to_string());
        let dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            writer: AtomicFileWriter::new(dir),
            filename,
        }
    }

    fn path(&self) -> PathBuf {
        self.writer.dir().join(&self.filename)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenError> {
        match fs::read_to_string(self.path()) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(TokenError::Read(err)),
        }
    }

    fn save(&self, token: &str) -> Result<(), TokenError> {
        self.writer.write(&self.filename, token.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(TokenError::Write(PersistError::Io(err))),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenError> {
        Ok(self.token.lock().map_err(|_| TokenError::Poisoned)?.clone())
    }

    fn save(&self, token: &str) -> Result<(), TokenError> {
        *self.token.lock().map_err(|_| TokenError::Poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenError> {
        *self.token.lock().map_err(|_| TokenError::Poisoned)? = None;
        Ok(())
    }
}
