pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod refresh;
pub mod resources;
pub mod session;
pub mod transport;

pub use cache::{QueryCache, QueryKey, QueryState, QueryStatus, ResourceKind, Subscription, Tag};
pub use client::ClinicClient;
pub use config::{CachePolicy, GatewayConfig};
pub use errors::{GatewayError, GatewayResult};
pub use gateway::Gateway;
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use session::{
    FileSessionPersistence, KeyringSessionPersistence, MemorySessionPersistence, Session,
    SessionPersistence, SessionStore, UserIdentity,
};
pub use transport::{
    ApiRequest, ApiResponse, HttpBackend, Method, ReqwestBackend, RequestBody, TransportError,
    Transport,
};
