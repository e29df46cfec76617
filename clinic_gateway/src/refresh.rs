use std::{
    mem,
    sync::{Mutex, MutexGuard},
};

use tokio::sync::oneshot;

use crate::{
    GatewayResult,
    transport::{ApiRequest, ApiResponse, HttpBackend, Transport},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Failed,
}

enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
    /// A different access token was stored after this request went out.
    AlreadyRefreshed,
}

/// Recovers requests rejected with 401 by exchanging the refresh token.
///
/// Concurrent rejections collapse into one exchange: the first caller leads
/// the refresh, everyone arriving while it runs queues up and is woken with
/// its outcome. Each request is replayed at most once.
pub struct RefreshCoordinator<B> {
    transport: Transport<B>,
    refresh_path: String,
    state: Mutex<RefreshState>,
}

impl<B: HttpBackend> RefreshCoordinator<B> {
    pub fn new(transport: Transport<B>, refresh_path: impl Into<String>) -> Self {
        Self {
            transport,
            refresh_path: refresh_path.into(),
            state: Mutex::new(RefreshState::Idle),
        }
    }

    pub fn transport(&self) -> &Transport<B> {
        &self.transport
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state(), RefreshState::Refreshing { .. })
    }

    pub async fn execute(&self, request: &ApiRequest) -> GatewayResult<ApiResponse> {
        let (outcome, sent_token) = self.transport.execute_tracked(request).await;
        let rejected = match outcome {
            Err(err) if err.is_unauthorized() => err,
            other => return other.map_err(Into::into),
        };

        let refreshed = match self.claim(sent_token.as_deref()) {
            Role::AlreadyRefreshed => {
                log::debug!(
                    "{} {} was sent with a superseded token; replaying",
                    request.method,
                    request.path
                );
                true
            }
            Role::Leader => self.lead_refresh().await == RefreshOutcome::Refreshed,
            Role::Follower(outcome) => {
                log::trace!(
                    "{} {} waiting for in-flight refresh",
                    request.method,
                    request.path
                );
                matches!(outcome.await, Ok(RefreshOutcome::Refreshed))
            }
        };

        if !refreshed {
            return Err(rejected.into());
        }
        self.replay(request).await
    }

    async fn replay(&self, request: &ApiRequest) -> GatewayResult<ApiResponse> {
        match self.transport.execute(request).await {
            Ok(response) => {
                log::debug!(
                    "{} {} succeeded after session refresh",
                    request.method,
                    request.path
                );
                Ok(response)
            }
            Err(err) => {
                if err.is_unauthorized() {
                    log::warn!(
                        "{} {} still unauthorized after session refresh",
                        request.method,
                        request.path
                    );
                }
                Err(err.into())
            }
        }
    }

    fn claim(&self, sent_token: Option<&str>) -> Role {
        let mut state = self.state();
        if let RefreshState::Refreshing { waiters } = &mut *state {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            return Role::Follower(rx);
        }

        let current = self.transport.session().access_token();
        if current.is_some() && current.as_deref() != sent_token {
            return Role::AlreadyRefreshed;
        }

        *state = RefreshState::Refreshing {
            waiters: Vec::new(),
        };
        Role::Leader
    }

    async fn lead_refresh(&self) -> RefreshOutcome {
        let guard = RefreshGuard {
            state: &self.state,
            released: false,
        };
        let outcome = self.exchange().await;
        guard.release(outcome);
        outcome
    }

    async fn exchange(&self) -> RefreshOutcome {
        let session = self.transport.session();
        let Some(refresh_token) = session.refresh_token() else {
            log::debug!("access token rejected and no refresh token stored; signing out");
            session.clear();
            return RefreshOutcome::Failed;
        };

        log::debug!("access token rejected; exchanging refresh token");
        match self
            .transport
            .exchange_refresh(&self.refresh_path, &refresh_token)
            .await
        {
            Ok(tokens) => {
                session.update_tokens(tokens.access_token, tokens.refresh_token);
                log::debug!("session refreshed");
                RefreshOutcome::Refreshed
            }
            Err(err) => {
                log::warn!(
                    "session refresh failed, signing out: {}",
                    err.display_chain()
                );
                session.clear();
                RefreshOutcome::Failed
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        lock_state(&self.state)
    }
}

/// Returns the machine to `Idle` even when the leading future is dropped
/// mid-exchange; waiters then see a closed channel and treat it as failure.
struct RefreshGuard<'a> {
    state: &'a Mutex<RefreshState>,
    released: bool,
}

impl RefreshGuard<'_> {
    fn release(mut self, outcome: RefreshOutcome) {
        self.released = true;
        for waiter in self.take_waiters() {
            let _ = waiter.send(outcome);
        }
    }

    fn take_waiters(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        let mut state = lock_state(self.state);
        match mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            log::debug!("session refresh abandoned before completion");
            drop(self.take_waiters());
        }
    }
}

fn lock_state(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
