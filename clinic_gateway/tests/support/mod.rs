#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use clinic_gateway::{
    ApiRequest, ApiResponse, ClinicClient, GatewayConfig, GatewayResult, HttpBackend, Method,
    RequestBody, Session, SessionPersistence, SessionStore, TransportError,
};
use serde_json::{Value, json};
use url::Url;

const COLLECTIONS: &[&str] = &[
    "admin/employee",
    "appointments",
    "inquiries",
    "patients",
    "services",
    "statuses",
];

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

pub fn config() -> GatewayConfig {
    GatewayConfig::new(
        Url::parse("https://clinic.test/api/").expect("static url"),
        "clinic-gateway-tests",
    )
}

pub fn client(clinic: &Arc<FakeClinic>, session: SessionStore) -> ClinicClient<Arc<FakeClinic>> {
    ClinicClient::with_backend(Arc::clone(clinic), session, &config())
}

/// In-process stand-in for the clinic backend: one valid access token at a
/// time, rotating refresh tokens, canned records for every collection.
pub struct FakeClinic {
    state: Mutex<FakeState>,
}

struct FakeState {
    valid_access: Option<String>,
    refresh_token: String,
    issued: usize,
    refresh_fails: bool,
    refresh_delay: Duration,
    resource_delay: Duration,
    calls: Vec<String>,
    served_with: Vec<String>,
}

impl FakeClinic {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                valid_access: Some("access-0".to_owned()),
                refresh_token: "refresh-0".to_owned(),
                issued: 0,
                refresh_fails: false,
                refresh_delay: Duration::ZERO,
                resource_delay: Duration::ZERO,
                calls: Vec::new(),
                served_with: Vec::new(),
            }),
        })
    }

    pub fn signed_in_session(&self) -> SessionStore {
        let session = SessionStore::in_memory();
        session.set("access-0", "refresh-0", None);
        session
    }

    /// Rejects the current access token from now on.
    pub fn expire_access_token(&self) {
        self.state().valid_access = None;
    }

    pub fn fail_refreshes(&self) {
        self.state().refresh_fails = true;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        self.state().refresh_delay = delay;
    }

    /// Holds every resource request this long before checking its token.
    pub fn set_resource_delay(&self, delay: Duration) {
        self.state().resource_delay = delay;
    }

    pub fn refresh_calls(&self) -> usize {
        self.calls_to("POST auth/refresh")
    }

    /// Counts recorded request lines (`METHOD path?query`) starting with
    /// `prefix`.
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    /// Bearer tokens of every request that was served a resource.
    pub fn served_with(&self) -> Vec<String> {
        self.state().served_with.clone()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake clinic state")
    }

    fn refresh(&self, request: &ApiRequest) -> ApiResponse {
        let presented = match &request.body {
            Some(RequestBody::Json(body)) => body["refreshToken"].as_str().map(str::to_owned),
            _ => None,
        };

        let mut state = self.state();
        if state.refresh_fails || presented.as_deref() != Some(state.refresh_token.as_str()) {
            return respond(401, json!({ "message": "invalid refresh token" }));
        }
        state.issued += 1;
        let access = format!("access-{}", state.issued);
        state.refresh_token = format!("refresh-{}", state.issued);
        state.valid_access = Some(access.clone());
        respond(
            200,
            json!({ "accessToken": access, "refreshToken": state.refresh_token }),
        )
    }

    fn login(&self, request: &ApiRequest) -> ApiResponse {
        let password = match &request.body {
            Some(RequestBody::Json(body)) => body["password"].as_str().map(str::to_owned),
            _ => None,
        };
        if password.as_deref() != Some("secret") {
            return respond(401, json!({ "message": "invalid credentials" }));
        }

        let mut state = self.state();
        state.issued += 1;
        let access = format!("access-{}", state.issued);
        state.refresh_token = format!("refresh-{}", state.issued);
        state.valid_access = Some(access.clone());
        respond(
            200,
            json!({
                "accessToken": access,
                "refreshToken": state.refresh_token,
                "user": { "id": "u-1", "name": "Front Desk", "role": "admin" },
            }),
        )
    }
}

#[async_trait]
impl HttpBackend for FakeClinic {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        let (delay, resource_delay) = {
            let mut state = self.state();
            state.calls.push(request_line(request));
            (state.refresh_delay, state.resource_delay)
        };

        match request.path.as_str() {
            "auth/refresh" => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                return Ok(self.refresh(request));
            }
            "auth/login" => return Ok(self.login(request)),
            "auth/logout" => return Ok(respond(200, json!({ "message": "signed out" }))),
            _ => {}
        }

        if !resource_delay.is_zero() {
            tokio::time::sleep(resource_delay).await;
        }
        {
            let mut state = self.state();
            let authorized = bearer.is_some() && bearer == state.valid_access.as_deref();
            if !authorized {
                return Ok(respond(401, json!({ "message": "jwt expired" })));
            }
            if let Some(token) = bearer {
                state.served_with.push(token.to_owned());
            }
        }

        Ok(route(request))
    }
}

pub fn request_line(request: &ApiRequest) -> String {
    if request.query.is_empty() {
        format!("{} {}", request.method, request.path)
    } else {
        let query: Vec<String> = request
            .query
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        format!("{} {}?{}", request.method, request.path, query.join("&"))
    }
}

fn route(request: &ApiRequest) -> ApiResponse {
    if request.path == "auth/me" {
        return respond(
            200,
            json!({ "user": { "_id": "u-1", "name": "Front Desk", "email": "desk@clinic.test" } }),
        );
    }

    let Some((base, rest)) = COLLECTIONS.iter().find_map(|base| {
        request
            .path
            .strip_prefix(base)
            .map(|rest| (*base, rest.trim_start_matches('/')))
    }) else {
        return respond(404, json!({ "message": "no such route" }));
    };
    let segments: Vec<&str> = rest.split('/').filter(|part| !part.is_empty()).collect();

    match (request.method, segments.as_slice()) {
        (Method::Get, []) if base == "statuses" => respond(
            200,
            json!([
                { "id": "st-1", "name": "pending" },
                { "id": "st-2", "name": "done" },
            ]),
        ),
        (Method::Get, []) => {
            let page: u32 = request
                .query
                .iter()
                .find(|(name, _)| name == "page")
                .and_then(|(_, value)| value.parse().ok())
                .unwrap_or(1);
            let prefix = base.rsplit('/').next().unwrap_or(base);
            respond(
                200,
                json!({
                    "data": [
                        record(&format!("{prefix}-{page}-1")),
                        record(&format!("{prefix}-{page}-2")),
                    ],
                    "pagination": {
                        "currentPage": page,
                        "pageSize": 2,
                        "totalItems": 6,
                        "totalPages": 3,
                        "hasNextPage": page < 3,
                        "hasPreviousPage": page > 1,
                    },
                }),
            )
        }
        (Method::Get, [id]) => respond(200, record(id)),
        (Method::Post, []) => respond(201, record("new-1")),
        (Method::Put, [id]) | (Method::Patch, [id, "status"]) => respond(200, record(id)),
        (Method::Post, [id, "convert"]) => respond(200, record(&format!("patient-from-{id}"))),
        (Method::Delete, [_]) => respond(200, json!({ "message": "deleted" })),
        _ => respond(404, json!({ "message": "no such route" })),
    }
}

fn record(id: &str) -> Value {
    json!({
        "id": id,
        "firstName": "Test",
        "lastName": "Record",
        "name": "Test Record",
        "status": "pending",
    })
}

fn respond(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}

/// Memory persistence that counts writes, to observe how often the session
/// was cleared.
#[derive(Clone, Default)]
pub struct CountingPersistence {
    pub initial: Option<Session>,
    pub saves: Arc<AtomicUsize>,
    pub clears: Arc<AtomicUsize>,
}

impl CountingPersistence {
    pub fn with_session(session: Session) -> Self {
        Self {
            initial: Some(session),
            ..Self::default()
        }
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl SessionPersistence for CountingPersistence {
    fn load(&self) -> GatewayResult<Option<Session>> {
        Ok(self.initial.clone())
    }

    fn save(&self, _session: &Session) -> GatewayResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> GatewayResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn session_with(access: Option<&str>, refresh: Option<&str>) -> Session {
    Session {
        access_token: access.map(str::to_owned),
        refresh_token: refresh.map(str::to_owned),
        user: None,
        updated_at: None,
    }
}
