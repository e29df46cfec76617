mod persistence;
mod store;
mod types;

pub use persistence::{
    FileSessionPersistence, KeyringSessionPersistence, MemorySessionPersistence,
    SessionPersistence,
};
pub use store::SessionStore;
pub use types::{Session, UserIdentity};
