use crate::models::OwnerScope;
use crate::utils::auth::validate_jwt;
use chrono::Utc;
use moka::future::Cache;
use std::time::Duration;

#[derive(Clone)]
struct Session {
    owner: OwnerScope,
    /// Token `exp`, seconds since the epoch.
    expires_at: i64,
}

/// Resolves session tokens to owner scopes, remembering each resolution for
/// a bounded time. An entry never outlives the token's own expiry.
///
/// Constructed once at startup and handed to the router through `AppState`;
/// [`SessionRegistry::clear`] is part of process teardown.
pub struct SessionRegistry {
    sessions: Cache<String, Session>,
    jwt_secret: String,
}

impl SessionRegistry {
    pub fn new(jwt_secret: impl Into<String>, capacity: u64, ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            jwt_secret: jwt_secret.into(),
        }
    }

    pub async fn resolve(&self, token: &str) -> Option<OwnerScope> {
        if let Some(session) = self.sessions.get(token).await {
            if session.expires_at > Utc::now().timestamp() {
                return Some(session.owner);
            }
            self.sessions.invalidate(token).await;
            tracing::debug!("Session token expired");
            return None;
        }

        match validate_jwt(token, &self.jwt_secret) {
            Ok(claims) => {
                let expires_at = claims.exp as i64;
                let owner = OwnerScope::from(claims);
                self.sessions
                    .insert(
                        token.to_string(),
                        Session {
                            owner: owner.clone(),
                            expires_at,
                        },
                    )
                    .await;
                Some(owner)
            }
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) {
        self.sessions.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::auth::create_jwt;

    #[tokio::test]
    async fn test_resolves_valid_token() {
        let registry = SessionRegistry::new("secret", 10, Duration::from_secs(60));
        let owner = OwnerScope::new("u1", "Ada", "Lovelace");
        let token = create_jwt(&owner, "secret", chrono::Duration::hours(1)).unwrap();

        assert_eq!(registry.resolve(&token).await, Some(owner.clone()));
        // Second lookup is served from the registry
        assert_eq!(registry.resolve(&token).await, Some(owner));
    }

    #[tokio::test]
    async fn test_cached_token_stops_resolving_at_expiry() {
        let registry = SessionRegistry::new("secret", 10, Duration::from_secs(60));
        let owner = OwnerScope::new("u1", "Ada", "Lovelace");
        let token = create_jwt(&owner, "secret", chrono::Duration::seconds(1)).unwrap();

        assert_eq!(registry.resolve(&token).await, Some(owner));

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(registry.resolve(&token).await.is_none());
        // Not re-admitted through validation either
        assert!(registry.resolve(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_rejects_garbage() {
        let registry = SessionRegistry::new("secret", 10, Duration::from_secs(60));
        assert!(registry.resolve("not-a-token").await.is_none());
    }
}
