use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::{
    GatewayError, GatewayResult, config::GatewayConfig, errors::ErrorBody, session::SessionStore,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// The body shape decides the content type: JSON documents go out as
/// `application/json`, flat pairs as `application/x-www-form-urlencoded`.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> GatewayResult<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> GatewayResult<Self> {
        Ok(self.with_body(RequestBody::json(value)?))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Empty bodies (204 and friends) decode as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> GatewayResult<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum TransportError {
    #[error("response status {status}: {body}")]
    Status { status: u16, body: ErrorBody },
    #[error("no response received: {reason}")]
    Network { reason: String },
}

impl TransportError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network { reason } => GatewayError::Network { reason },
            TransportError::Status { status: 401, body } => GatewayError::AuthExpired { body },
            TransportError::Status { status, body } if (400..500).contains(&status) => {
                GatewayError::Validation { status, body }
            }
            TransportError::Status { status, body } if status >= 500 => {
                GatewayError::Server { status, body }
            }
            TransportError::Status { status, body } => {
                GatewayError::UnexpectedStatus { status, body }
            }
        }
    }
}

/// One round trip on the wire. Implementations report every received
/// response, whatever its status; only connection-level failures are errors.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<B> HttpBackend for Arc<B>
where
    B: HttpBackend + ?Sized,
{
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        (**self).send(request, bearer).await
    }
}

pub struct ReqwestBackend {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl ReqwestBackend {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| GatewayError::message(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        let url = self
            .config
            .endpoint_url(&request.path)
            .map_err(|err| TransportError::Network {
                reason: err.to_string(),
            })?;

        let mut builder = self
            .http
            .request(request.method.into(), url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Form(pairs)) => builder.form(pairs),
            None => builder,
        };

        let response = builder.send().await.map_err(network_failure)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(network_failure)?;

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

fn network_failure(err: reqwest::Error) -> TransportError {
    let reason = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    TransportError::Network { reason }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshedTokens {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
}

/// Sends requests with the current session's bearer token attached.
pub struct Transport<B> {
    backend: B,
    session: SessionStore,
}

impl<B: HttpBackend> Transport<B> {
    pub fn new(backend: B, session: SessionStore) -> Self {
        Self { backend, session }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.execute_tracked(request).await.0
    }

    /// Also hands back the access token that went out with the request.
    pub(crate) async fn execute_tracked(
        &self,
        request: &ApiRequest,
    ) -> (Result<ApiResponse, TransportError>, Option<String>) {
        let access_token = self.session.access_token();
        let outcome = self.send_raw(request, access_token.as_deref()).await;
        (outcome, access_token)
    }

    /// The refresh exchange never carries the (expired) bearer token.
    pub(crate) async fn exchange_refresh(
        &self,
        refresh_path: &str,
        refresh_token: &str,
    ) -> GatewayResult<RefreshedTokens> {
        let request = ApiRequest::post(refresh_path)
            .with_json(&serde_json::json!({ "refreshToken": refresh_token }))?;
        let response = self.send_raw(&request, None).await?;
        response.json()
    }

    async fn send_raw(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        let response = match self.backend.send(request, bearer).await {
            Ok(response) => response,
            Err(err) => {
                log::debug!("{} {} failed: {err}", request.method, request.path);
                return Err(err);
            }
        };
        log::trace!(
            "{} {} -> {} (bearer: {})",
            request.method,
            request.path,
            response.status,
            bearer.is_some()
        );

        if response.is_success() {
            Ok(response)
        } else {
            Err(TransportError::Status {
                status: response.status,
                body: ErrorBody::from_bytes(&response.body),
            })
        }
    }
}
