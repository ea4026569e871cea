use crate::errors::GridError;
use crate::models::UserId;
use async_trait::async_trait;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 100_000;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// An opaque bearer token handed out at login. Every operation that needs
/// a user receives one explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Reads `Authorization: Bearer <token>`.
    pub fn from_authorization(header: &str) -> Option<Self> {
        let token = header.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self::new(token))
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolves the user behind a session, or fails with
    /// [`GridError::Authentication`].
    async fn current_user(&self, session: &Session) -> Result<UserId, GridError>;
}

/// Live sessions of the server process. Not persisted; a restart logs
/// everyone out. Sessions older than the ttl stop resolving and are pruned
/// whenever a new one is opened.
#[derive(Debug)]
pub struct SessionRegistry {
    ttl: Duration,
    sessions: RwLock<HashMap<String, (UserId, Instant)>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn open(&self, user: UserId) -> Session {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, issued)| issued.elapsed() < self.ttl);
        sessions.insert(token.clone(), (user, Instant::now()));
        Session::new(token)
    }

    pub async fn close(&self, session: &Session) -> bool {
        self.sessions.write().await.remove(session.token()).is_some()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl Authenticator for SessionRegistry {
    async fn current_user(&self, session: &Session) -> Result<UserId, GridError> {
        match self.sessions.read().await.get(session.token()) {
            Some((user, issued)) if issued.elapsed() < self.ttl => Ok(user.clone()),
            _ => Err(GridError::Authentication),
        }
    }
}

pub fn new_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn derive_key(salt: &str, password: &str, iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations.max(1), &mut key);
    key
}

/// PBKDF2-HMAC-SHA256 of the password, hex encoded.
pub fn hash_password(salt: &str, password: &str, iterations: u32) -> String {
    hex::encode(derive_key(salt, password, iterations))
}

/// Recomputes the hash and compares it in constant time.
pub fn verify_password(salt: &str, password: &str, iterations: u32, expected: &str) -> bool {
    let Ok(expected) = hex::decode(expected) else {
        return false;
    };
    let key = derive_key(salt, password, iterations);
    expected.len() == key.len()
        && expected
            .iter()
            .zip(key.iter())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(
            Session::from_authorization("Bearer abc123"),
            Some(Session::new("abc123"))
        );
        assert_eq!(Session::from_authorization("Bearer "), None);
        assert_eq!(Session::from_authorization("Basic abc"), None);
    }

    #[test]
    fn hashes_depend_on_salt_and_verify() {
        let a = hash_password("salt-a", "secret", 1_000);
        let b = hash_password("salt-b", "secret", 1_000);
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, hash_password("salt-a", "secret", 1_000));
        assert_ne!(a, hash_password("salt-a", "secret", 2_000));

        assert!(verify_password("salt-a", "secret", 1_000, &a));
        assert!(!verify_password("salt-a", "Secret", 1_000, &a));
        assert!(!verify_password("salt-b", "secret", 1_000, &a));
        assert!(!verify_password("salt-a", "secret", 1_000, "not-hex"));
        assert!(!verify_password("salt-a", "secret", 1_000, &a[..32]));
    }

    #[test]
    fn stored_hash_is_not_a_plain_digest() {
        use sha2::{Digest, Sha256};

        let mut plain = Sha256::new();
        plain.update(b"salt-a:secret");
        let plain = hex::encode(plain.finalize());
        let mut unsalted = Sha256::new();
        unsalted.update(b"secret");
        let unsalted = hex::encode(unsalted.finalize());

        let stored = hash_password("salt-a", "secret", 1_000);
        assert_ne!(stored, plain);
        assert_ne!(stored, unsalted);
    }

    #[tokio::test]
    async fn sessions_resolve_until_closed() {
        let registry = SessionRegistry::new();
        let user = UserId("user-1".into());
        let session = registry.open(user.clone()).await;

        assert_eq!(registry.current_user(&session).await, Ok(user));
        assert!(registry.close(&session).await);
        assert_eq!(
            registry.current_user(&session).await,
            Err(GridError::Authentication)
        );
        assert!(!registry.close(&session).await);
    }

    #[tokio::test]
    async fn expired_sessions_stop_resolving_and_are_pruned() {
        let registry = SessionRegistry::with_ttl(Duration::ZERO);
        let stale = registry.open(UserId("user-1".into())).await;
        assert_eq!(
            registry.current_user(&stale).await,
            Err(GridError::Authentication)
        );

        registry.open(UserId("user-2".into())).await;
        assert_eq!(registry.active_count().await, 1);
    }
}
