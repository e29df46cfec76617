use crate::{
    GatewayResult,
    cache::QueryCache,
    config::GatewayConfig,
    gateway::Gateway,
    resources::{
        appointments::Appointments, auth::Auth, catalog::Catalog, inquiries::Inquiries,
        patients::Patients, users::Users,
    },
    session::SessionStore,
    transport::{HttpBackend, ReqwestBackend},
};

/// Entry point bundling one session, one gateway and one query cache.
///
/// Resource handles returned by the accessors are cheap and share all three.
pub struct ClinicClient<B> {
    gateway: Gateway<B>,
    cache: QueryCache,
}

impl<B> Clone for ClinicClient<B> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl ClinicClient<ReqwestBackend> {
    pub fn connect(config: &GatewayConfig, session: SessionStore) -> GatewayResult<Self> {
        let backend = ReqwestBackend::new(config)?;
        Ok(Self::with_backend(backend, session, config))
    }
}

impl<B: HttpBackend + 'static> ClinicClient<B> {
    pub fn with_backend(backend: B, session: SessionStore, config: &GatewayConfig) -> Self {
        Self {
            gateway: Gateway::new(backend, session, config),
            cache: QueryCache::new(config.cache),
        }
    }

    pub fn gateway(&self) -> &Gateway<B> {
        &self.gateway
    }

    pub fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn auth(&self) -> Auth<B> {
        Auth::new(self.gateway.clone(), self.cache.clone())
    }

    pub fn patients(&self) -> Patients<B> {
        Patients::new(self.gateway.clone(), self.cache.clone())
    }

    pub fn appointments(&self) -> Appointments<B> {
        Appointments::new(self.gateway.clone(), self.cache.clone())
    }

    pub fn users(&self) -> Users<B> {
        Users::new(self.gateway.clone(), self.cache.clone())
    }

    pub fn catalog(&self) -> Catalog<B> {
        Catalog::new(self.gateway.clone(), self.cache.clone())
    }

    pub fn inquiries(&self) -> Inquiries<B> {
        Inquiries::new(self.gateway.clone(), self.cache.clone())
    }
}
