use crate::models::Session;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

/// The active session, mirrored to a JSON file so it survives restarts.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: Option<Session>,
}

impl SessionStore {
    /// Reads a previously persisted session. The token is not re-validated;
    /// the next failing API call takes care of that.
    pub async fn restore(path: PathBuf) -> Self {
        let current = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) if !session.token.is_empty() => Some(session),
                Ok(_) => None,
                Err(err) => {
                    error!("failed to parse session file: {err}");
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                error!("failed to read session file: {err}");
                None
            }
        };

        if let Some(session) = &current {
            info!(chapter = %session.chapter_id, "restored persisted session");
        }

        Self { path, current }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn token(&self) -> Option<String> {
        self.current.as_ref().map(|session| session.token.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn establish(
        &mut self,
        chapter_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<(), std::io::Error> {
        let session = Session {
            token: token.into(),
            chapter_id: chapter_id.into(),
        };
        persist_session(&self.path, &session).await?;
        info!(chapter = %session.chapter_id, "session established");
        self.current = Some(session);
        Ok(())
    }

    /// Forgets the session in memory even if the file cannot be removed.
    pub async fn clear(&mut self) {
        self.current = None;
        match fs::remove_file(&self.path).await {
            Ok(()) => info!("session cleared"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("failed to remove session file: {err}"),
        }
    }
}

async fn persist_session(path: &Path, session: &Session) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(session)?;
    fs::write(path, payload).await
}
