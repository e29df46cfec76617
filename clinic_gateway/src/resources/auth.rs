use serde::{Deserialize, Serialize};

use crate::{
    GatewayError, GatewayResult,
    cache::QueryCache,
    gateway::Gateway,
    session::{Session, UserIdentity},
    transport::{ApiRequest, HttpBackend},
};

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    user: Option<UserIdentity>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: UserIdentity },
    Bare(UserIdentity),
}

/// Sign-in and sign-out. These are the only operations besides a token
/// refresh that write the session.
pub struct Auth<B> {
    gateway: Gateway<B>,
    cache: QueryCache,
}

impl<B: HttpBackend + 'static> Auth<B> {
    pub(crate) fn new(gateway: Gateway<B>, cache: QueryCache) -> Self {
        Self { gateway, cache }
    }

    /// Wrong credentials come back as `Validation` with status 401; they
    /// never start a refresh.
    pub async fn login(&self, email: &str, password: &str) -> GatewayResult<Session> {
        let request = ApiRequest::post("auth/login").with_json(&Credentials { email, password })?;
        let response = match self.gateway.send_without_refresh(&request).await {
            Err(GatewayError::AuthExpired { body }) => {
                return Err(GatewayError::Validation { status: 401, body });
            }
            other => other?,
        };
        let login: LoginResponse = response.json()?;

        // cached data belongs to whoever was signed in before
        self.cache.reset();
        self.gateway
            .session()
            .set(login.access_token, login.refresh_token, login.user);
        log::info!("signed in as {email}");
        Ok(self.gateway.session().get())
    }

    /// Always ends the local session, even when the backend cannot be told.
    /// Returns `false` if nobody was signed in.
    pub async fn logout(&self) -> bool {
        let session = self.gateway.session().get();
        if let Some(refresh_token) = session.refresh_token.as_deref() {
            let notified = ApiRequest::post("auth/logout")
                .with_json(&serde_json::json!({ "refreshToken": refresh_token }));
            let outcome = match notified {
                Ok(request) => self.gateway.send_without_refresh(&request).await.map(drop),
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                log::warn!("backend logout failed: {}", err.display_chain());
            }
        }

        self.cache.reset();
        self.gateway.session().clear()
    }

    /// Fetches the signed-in user and stores it on the session.
    pub async fn me(&self) -> GatewayResult<UserIdentity> {
        let user = match self
            .gateway
            .send_json::<MeResponse>(&ApiRequest::get("auth/me"))
            .await?
        {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        };
        self.gateway.session().set_user(user.clone());
        Ok(user)
    }
}
