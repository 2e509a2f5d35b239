use crate::utils::error::ApiError;
use axum::http::HeaderMap;
use std::collections::HashSet;
use tracing::{debug, warn};

pub const ACTOR_HEADER: &str = "x-admin-user";

/// Who is making the request. Identity is established upstream by the host
/// admin framework; we only read the username it forwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let value = headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::Forbidden(format!("missing {} header", ACTOR_HEADER)))?;

        let name = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("invalid {} header", ACTOR_HEADER)))?;

        if name.is_empty() {
            return Err(ApiError::Forbidden(format!("empty {} header", ACTOR_HEADER)));
        }

        Ok(Actor(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Capability gate for mutating menu data. The handlers evaluate this
/// before invoking any move or CRUD operation; the services themselves
/// never check permissions.
pub struct ChangeGuard {
    editors: HashSet<String>,
}

impl ChangeGuard {
    pub fn new(editors: Vec<String>) -> Self {
        Self {
            editors: editors.into_iter().collect(),
        }
    }

    pub fn can_modify(&self, actor: &Actor) -> bool {
        self.editors.contains(actor.name())
    }

    /// Enforce change permission (throw error if denied)
    pub fn require_change(&self, actor: &Actor) -> Result<(), ApiError> {
        if !self.can_modify(actor) {
            warn!("Actor {} denied menu change permission", actor.name());
            return Err(ApiError::Forbidden(format!(
                "{} may not modify menu items",
                actor.name()
            )));
        }

        debug!("Actor {} has menu change permission", actor.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn guard() -> ChangeGuard {
        ChangeGuard::new(vec!["alice".to_string(), "bob".to_string()])
    }

    #[test]
    fn test_configured_editor_is_allowed() {
        assert!(guard().can_modify(&Actor("alice".to_string())));
        assert!(guard().require_change(&Actor("bob".to_string())).is_ok());
    }

    #[test]
    fn test_unknown_actor_is_forbidden() {
        let err = guard()
            .require_change(&Actor("mallory".to_string()))
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(Actor::from_headers(&headers).unwrap(), Actor("alice".into()));
    }

    #[test]
    fn test_missing_header_is_forbidden() {
        let headers = HeaderMap::new();
        assert!(matches!(
            Actor::from_headers(&headers),
            Err(ApiError::Forbidden(_))
        ));
    }
}
