use crate::auth::SessionRegistry;
use crate::config::AdminSeed;
use crate::errors::GridError;
use crate::models::Role;
use crate::store::FileStore;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(store: FileStore) -> Self {
        Self {
            store: Arc::new(store),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    /// Creates the first admin account when the store has none.
    pub async fn seed_admin(&self, seed: Option<&AdminSeed>) -> Result<(), GridError> {
        if self.store.has_users().await {
            return Ok(());
        }
        match seed {
            Some(seed) => {
                self.store
                    .create_user(&seed.username, &seed.password, Role::Admin)
                    .await?;
                info!("seeded admin account {}", seed.username);
            }
            None => info!("no accounts yet; set STUDY_TIME_ADMIN_USER and STUDY_TIME_ADMIN_PASSWORD"),
        }
        Ok(())
    }
}
