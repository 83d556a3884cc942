use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

use super::Session;
use crate::error::ApiError;

/// Where the current session lives between requests (and between CLI runs)
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, ApiError>;
    async fn save(&self, session: &Session) -> Result<(), ApiError>;
    async fn clear(&self) -> Result<(), ApiError>;
}

/// Process-local store
#[derive(Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Session>>, ApiError> {
        self.session
            .lock()
            .map_err(|_| ApiError::Storage("session lock poisoned".to_string()))
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<Session>, ApiError> {
        Ok(self.lock()?.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), ApiError> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// JSON file store used by the CLI, one file per server
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

fn storage_error(err: std::io::Error) -> ApiError {
    ApiError::Storage(err.to_string())
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<Session>, ApiError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let session: Session = serde_json::from_str(&content)
                    .map_err(|e| ApiError::Storage(format!("corrupt session file: {}", e)))?;
                Ok(Some(session))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
        }

        let content = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&self.path, content).await.map_err(storage_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(storage_error)?;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(e)),
        }
    }
}
