use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    GatewayResult,
    config::GatewayConfig,
    refresh::RefreshCoordinator,
    session::SessionStore,
    transport::{ApiRequest, ApiResponse, HttpBackend, Transport},
};

/// Cheap to clone handle for authenticated calls against the backend.
pub struct Gateway<B> {
    coordinator: Arc<RefreshCoordinator<B>>,
}

impl<B> Clone for Gateway<B> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl<B: HttpBackend> Gateway<B> {
    pub fn new(backend: B, session: SessionStore, config: &GatewayConfig) -> Self {
        let transport = Transport::new(backend, session);
        Self {
            coordinator: Arc::new(RefreshCoordinator::new(
                transport,
                config.refresh_path.trim_matches('/'),
            )),
        }
    }

    pub fn session(&self) -> &SessionStore {
        self.coordinator.transport().session()
    }

    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    pub async fn send(&self, request: &ApiRequest) -> GatewayResult<ApiResponse> {
        self.coordinator.execute(request).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> GatewayResult<T> {
        self.send(request).await?.json()
    }

    /// For credential exchanges, where a 401 means the credentials are wrong
    /// rather than that the session expired.
    pub async fn send_without_refresh(&self, request: &ApiRequest) -> GatewayResult<ApiResponse> {
        Ok(self.coordinator.transport().execute(request).await?)
    }
}
