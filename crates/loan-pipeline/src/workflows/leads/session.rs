use axum::http::HeaderMap;

use super::domain::{Actor, ActorRole};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Capability that yields the acting user. Passed in by callers; the engine
/// never reaches for ambient session state.
pub trait SessionProvider {
    fn current_actor(&self) -> Result<Actor, SessionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("request carries no authenticated actor")]
    Unauthenticated,
    #[error("unknown actor role '{0}'")]
    UnknownRole(String),
}

/// Session resolved from headers set by the upstream authentication proxy.
pub struct HeaderSession<'a> {
    headers: &'a HeaderMap,
}

impl<'a> HeaderSession<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self { headers }
    }

    fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

impl SessionProvider for HeaderSession<'_> {
    fn current_actor(&self) -> Result<Actor, SessionError> {
        let id = self
            .header(ACTOR_ID_HEADER)
            .ok_or(SessionError::Unauthenticated)?;
        let raw_role = self
            .header(ACTOR_ROLE_HEADER)
            .ok_or(SessionError::Unauthenticated)?;
        let role =
            ActorRole::parse(raw_role).ok_or_else(|| SessionError::UnknownRole(raw_role.to_string()))?;
        Ok(Actor::new(id, role))
    }
}
