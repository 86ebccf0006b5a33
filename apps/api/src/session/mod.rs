//! Signed-in sessions: the acting user plus their comparison selection.
//!
//! Sign-in trusts the supplied role. The bearer token handed back is the only
//! credential; signing out drops the session and its selection. Sessions idle
//! longer than the registry's timeout are treated as signed out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::comparison::selector::Selection;
use crate::errors::AppError;
use crate::models::user::{Actor, Role};
use crate::state::AppState;

pub mod handlers;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(8 * 60 * 60);

#[derive(Debug, Clone)]
pub struct Session {
    pub actor: Actor,
    pub selection: Selection,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Opens a session with an empty selection and returns its token.
    pub async fn sign_in(&self, actor: Actor) -> Uuid {
        let token = Uuid::new_v4();
        info!("Signed in {} as {}", actor.display_name, actor.role);
        self.sessions.write().await.insert(
            token,
            Session {
                actor,
                selection: Selection::default(),
                last_seen: Instant::now(),
            },
        );
        token
    }

    /// Returns `false` when the token was not signed in.
    pub async fn sign_out(&self, token: Uuid) -> bool {
        match self.sessions.write().await.remove(&token) {
            Some(session) => {
                info!("Signed out {}", session.actor.display_name);
                true
            }
            None => false,
        }
    }

    /// Resolves a token and marks its session as active. An idle session is
    /// dropped instead.
    pub async fn actor(&self, token: Uuid) -> Option<Actor> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&token)?;
        if session.last_seen.elapsed() >= self.idle_timeout {
            info!("Session for {} expired", session.actor.display_name);
            sessions.remove(&token);
            return None;
        }
        session.last_seen = Instant::now();
        Some(session.actor.clone())
    }

    /// Drops every session idle for longer than the timeout; returns how many.
    pub async fn sweep_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < self.idle_timeout);
        before - sessions.len()
    }

    pub async fn selection(&self, token: Uuid) -> Option<Selection> {
        self.sessions
            .read()
            .await
            .get(&token)
            .map(|session| session.selection.clone())
    }

    /// Runs `f` against the session's selection under the write lock.
    pub async fn with_selection<R>(
        &self,
        token: Uuid,
        f: impl FnOnce(&mut Selection) -> R,
    ) -> Option<R> {
        self.sessions
            .write()
            .await
            .get_mut(&token)
            .map(|session| f(&mut session.selection))
    }
}

/// Builds the actor for a "sign in as" request.
pub fn actor_for(user_id: Option<String>, username: Option<String>, role: Role) -> Actor {
    Actor {
        id: user_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        display_name: username
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Test {role}")),
        role,
    }
}

/// The authenticated session behind a request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: Uuid,
    pub actor: Actor,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let actor = state
            .sessions
            .actor(token)
            .await
            .ok_or(AppError::Unauthorized)?;
        Ok(CurrentSession { token, actor })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}
