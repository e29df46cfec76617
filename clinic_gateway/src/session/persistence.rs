use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use keyring::Entry;

use crate::{GatewayError, GatewayResult, session::Session};

pub trait SessionPersistence: Send + Sync {
    fn load(&self) -> GatewayResult<Option<Session>>;
    fn save(&self, session: &Session) -> GatewayResult<()>;
    fn clear(&self) -> GatewayResult<()>;
}

#[derive(Clone, Debug)]
pub struct KeyringSessionPersistence {
    service: String,
    account: String,
}

impl KeyringSessionPersistence {
    pub fn new(service: impl Into<String>, profile: &str) -> Self {
        Self {
            service: service.into(),
            account: format!("session:profile:{profile}"),
        }
    }

    fn entry(&self) -> GatewayResult<Entry> {
        Ok(Entry::new(&self.service, &self.account)?)
    }
}

impl SessionPersistence for KeyringSessionPersistence {
    fn load(&self) -> GatewayResult<Option<Session>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, session: &Session) -> GatewayResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?.set_password(&raw)?;
        Ok(())
    }

    fn clear(&self) -> GatewayResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/clinic/session.<profile>.json`
    pub fn in_config_dir(profile: &str) -> GatewayResult<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| GatewayError::message("cannot determine the user config directory"))?
            .join("clinic");
        Ok(Self::new(dir.join(format!("session.{profile}.json"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> GatewayResult<Option<Session>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, session: &Session) -> GatewayResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_vec_pretty(session)?;
        let mut file = private_file(&self.path)?;
        file.write_all(&raw)?;
        file.flush()?;
        Ok(())
    }

    fn clear(&self) -> GatewayResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
fn private_file(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn private_file(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}

/// Keeps the session for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemorySessionPersistence {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionPersistence {
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl MemorySessionPersistence {
    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionPersistence for MemorySessionPersistence {
    fn load(&self) -> GatewayResult<Option<Session>> {
        Ok(self.slot().clone())
    }

    fn save(&self, session: &Session) -> GatewayResult<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> GatewayResult<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clinic_core::UserId;

    use super::{FileSessionPersistence, SessionPersistence};
    use crate::session::{Session, UserIdentity};

    fn sample_session() -> Session {
        Session {
            access_token: Some("access".to_owned()),
            refresh_token: Some("refresh".to_owned()),
            user: Some(UserIdentity {
                id: UserId::from("u-1"),
                name: Some("Front Desk".to_owned()),
                email: None,
                role: Some("admin".to_owned()),
            }),
            updated_at: None,
        }
    }

    #[test]
    fn file_persistence_saves_loads_and_clears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionPersistence::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().expect("load missing"), None);

        store.save(&sample_session()).expect("save");
        assert_eq!(store.load().expect("load"), Some(sample_session()));

        store.clear().expect("clear");
        store.clear().expect("clear is idempotent");
        assert_eq!(store.load().expect("load cleared"), None);
    }

    #[test]
    fn corrupt_session_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").expect("write corrupt file");

        assert!(FileSessionPersistence::new(path).load().is_err());
    }
}
