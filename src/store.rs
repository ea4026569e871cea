use crate::auth::{DEFAULT_PASSWORD_ITERATIONS, hash_password, new_salt, verify_password};
use crate::calendar::MonthKey;
use crate::errors::GridError;
use crate::models::{MonthRecord, Role, UserId};
use crate::storage::{AppData, UserAccount, load_data, persist_data};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Persistence for month records, one per (user, month).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_month_record(
        &self,
        user: &UserId,
        key: &MonthKey,
    ) -> Result<Option<MonthRecord>, GridError>;

    /// Replaces the whole record stored for `(user, key)`.
    async fn save_month_record(
        &self,
        user: &UserId,
        key: &MonthKey,
        record: &MonthRecord,
    ) -> Result<(), GridError>;

    /// Every record of the user, oldest month first.
    async fn fetch_all_records(
        &self,
        user: &UserId,
    ) -> Result<Vec<(MonthKey, MonthRecord)>, GridError>;
}

/// Keeps the whole data document in memory and rewrites the JSON file
/// after every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: Mutex<AppData>,
    password_iterations: u32,
}

impl FileStore {
    pub fn new(path: PathBuf, data: AppData) -> Self {
        Self {
            path,
            data: Mutex::new(data),
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }

    /// PBKDF2 rounds for accounts created from now on. Existing accounts
    /// keep the count they were hashed with.
    pub fn with_password_iterations(mut self, iterations: u32) -> Self {
        self.password_iterations = iterations.max(1);
        self
    }

    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self::new(path, data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn has_users(&self) -> bool {
        !self.data.lock().await.users.is_empty()
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<UserAccount, GridError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(GridError::Validation("Please fill in all fields.".into()));
        }

        let lookup = username.to_lowercase();
        let mut data = self.data.lock().await;
        if data.users.contains_key(&lookup) {
            return Err(GridError::Conflict(format!("user '{username}' already exists")));
        }

        let salt = new_salt();
        let account = UserAccount {
            id: UserId::generate(),
            username: username.to_string(),
            password_hash: hash_password(&salt, password, self.password_iterations),
            password_iterations: self.password_iterations,
            salt,
            role,
        };
        data.users.insert(lookup.clone(), account.clone());

        if let Err(err) = persist_data(&self.path, &data).await {
            data.users.remove(&lookup);
            return Err(err);
        }

        info!(user = %account.id, ?role, "created account {}", account.username);
        Ok(account)
    }

    pub async fn verify_credentials(&self, username: &str, password: &str) -> Option<UserAccount> {
        let data = self.data.lock().await;
        let account = data.users.get(&username.trim().to_lowercase())?;
        verify_password(
            &account.salt,
            password,
            account.password_iterations,
            &account.password_hash,
        )
        .then(|| account.clone())
    }

    pub async fn find_user(&self, id: &UserId) -> Option<UserAccount> {
        let data = self.data.lock().await;
        data.users.values().find(|account| &account.id == id).cloned()
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn fetch_month_record(
        &self,
        user: &UserId,
        key: &MonthKey,
    ) -> Result<Option<MonthRecord>, GridError> {
        let data = self.data.lock().await;
        let Some(record) = data
            .records
            .get(user)
            .and_then(|records| records.get(&key.storage_key()))
        else {
            return Ok(None);
        };

        record
            .validate_for(key)
            .map_err(|err| GridError::Retrieval(err.to_string()))?;
        Ok(Some(record.clone()))
    }

    async fn save_month_record(
        &self,
        user: &UserId,
        key: &MonthKey,
        record: &MonthRecord,
    ) -> Result<(), GridError> {
        record.validate_for(key)?;

        let storage_key = key.storage_key();
        let mut data = self.data.lock().await;
        let previous = data
            .records
            .entry(user.clone())
            .or_default()
            .insert(storage_key.clone(), record.clone());

        if let Err(err) = persist_data(&self.path, &data).await {
            let records = data.records.entry(user.clone()).or_default();
            match previous {
                Some(previous) => {
                    records.insert(storage_key, previous);
                }
                None => {
                    records.remove(&storage_key);
                }
            }
            return Err(err);
        }

        info!(%user, key = %storage_key, "saved month record");
        Ok(())
    }

    async fn fetch_all_records(
        &self,
        user: &UserId,
    ) -> Result<Vec<(MonthKey, MonthRecord)>, GridError> {
        let data = self.data.lock().await;
        let Some(records) = data.records.get(user) else {
            return Ok(Vec::new());
        };

        let mut all = Vec::with_capacity(records.len());
        for (storage_key, record) in records {
            match MonthKey::parse_storage_key(storage_key) {
                Ok(key) => all.push((key, record.clone())),
                Err(err) => warn!(%user, "skipping record '{storage_key}': {err}"),
            }
        }
        all.sort_by_key(|(key, _)| *key);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Month;
    use crate::models::Category;

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path().join("state.json"), AppData::default())
            .with_password_iterations(1_000)
    }

    fn key(month: Month, year: i32) -> MonthKey {
        MonthKey::new(month, year).unwrap()
    }

    #[tokio::test]
    async fn save_then_fetch_round_trips_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let user = UserId("u1".into());
        let key = key(Month::February, 2024);

        assert_eq!(store.fetch_month_record(&user, &key).await.unwrap(), None);

        let mut record = MonthRecord::empty(&key);
        record.days[28].set(Category::Work, Some(120));
        store.save_month_record(&user, &key, &record).await.unwrap();

        assert_eq!(
            store.fetch_month_record(&user, &key).await.unwrap(),
            Some(record.clone())
        );

        let reopened = FileStore::open(store.path().to_path_buf()).await;
        assert_eq!(
            reopened.fetch_month_record(&user, &key).await.unwrap(),
            Some(record)
        );
    }

    #[tokio::test]
    async fn save_overwrites_instead_of_merging() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let user = UserId("u1".into());
        let key = key(Month::April, 2024);

        let mut first = MonthRecord::empty(&key);
        first.days[0].set(Category::Programming, Some(30));
        first.days[1].set(Category::Fitness, Some(20));
        store.save_month_record(&user, &key, &first).await.unwrap();

        let mut second = first.clone();
        second.days[0].set(Category::Programming, None);
        store.save_month_record(&user, &key, &second).await.unwrap();

        let loaded = store.fetch_month_record(&user, &key).await.unwrap().unwrap();
        assert_eq!(loaded.days[0].programming, None);
        assert_eq!(loaded.days[1].fitness, Some(20));
    }

    #[tokio::test]
    async fn save_rejects_wrong_length() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let user = UserId("u1".into());
        let record = MonthRecord::empty(&key(Month::January, 2024));

        let err = store
            .save_month_record(&user, &key(Month::February, 2024), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, GridError::Validation(_)));
    }

    #[tokio::test]
    async fn records_are_scoped_per_user_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let alice = UserId("alice".into());
        let bob = UserId("bob".into());

        for key in [
            key(Month::January, 2024),
            key(Month::November, 2023),
            key(Month::December, 2023),
        ] {
            store
                .save_month_record(&alice, &key, &MonthRecord::empty(&key))
                .await
                .unwrap();
        }

        let keys: Vec<_> = store
            .fetch_all_records(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|(key, _)| key.storage_key())
            .collect();
        assert_eq!(keys, ["November_2023", "December_2023", "January_2024"]);
        assert!(store.fetch_all_records(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accounts_verify_and_reject_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let account = store
            .create_user("Ada@example.com", "hunter2", Role::Admin)
            .await
            .unwrap();
        assert!(store.has_users().await);

        let verified = store
            .verify_credentials("ada@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(verified.id, account.id);
        assert_eq!(verified.password_iterations, 1_000);
        assert_ne!(verified.password_hash, "hunter2");
        assert!(store.verify_credentials("ada@example.com", "wrong").await.is_none());
        assert_eq!(store.find_user(&account.id).await.unwrap().role, Role::Admin);

        let err = store
            .create_user("ADA@example.com", "other", Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, GridError::Conflict(_)));

        let err = store.create_user("", "pw", Role::User).await.unwrap_err();
        assert_eq!(err, GridError::Validation("Please fill in all fields.".into()));
    }

    #[tokio::test]
    async fn accounts_keep_their_iteration_count_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create_user("ada", "hunter2", Role::User).await.unwrap();

        let reopened = FileStore::open(store.path().to_path_buf())
            .await
            .with_password_iterations(5_000);
        let account = reopened.verify_credentials("ada", "hunter2").await.unwrap();
        assert_eq!(account.password_iterations, 1_000);
    }
}
