use crate::auth::DEFAULT_PASSWORD_ITERATIONS;
use crate::errors::GridError;
use crate::models::{MonthRecord, Role, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub salt: String,
    pub password_hash: String,
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,
    #[serde(default)]
    pub role: Role,
}

fn default_password_iterations() -> u32 {
    DEFAULT_PASSWORD_ITERATIONS
}

/// Everything persisted in the data file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    /// Accounts keyed by lowercase username.
    #[serde(default)]
    pub users: BTreeMap<String, UserAccount>,
    /// Month records per user, keyed by storage key (`January_2024`).
    #[serde(default)]
    pub records: BTreeMap<UserId, BTreeMap<String, MonthRecord>>,
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file {}: {err}", path.display());
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), GridError> {
    let payload =
        serde_json::to_vec_pretty(data).map_err(|err| GridError::Submission(err.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| GridError::Submission(err.to_string()))?;
    }
    fs::write(path, payload)
        .await
        .map_err(|err| GridError::Submission(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_empty_data() {
        let dir = tempfile::tempdir().unwrap();
        let data = load_data(&dir.path().join("absent.json")).await;
        assert!(data.users.is_empty());
        assert!(data.records.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").await.unwrap();
        let data = load_data(&path).await;
        assert!(data.records.is_empty());
    }

    #[tokio::test]
    async fn persist_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/state.json");
        let mut data = AppData::default();
        data.records
            .entry(UserId("u1".into()))
            .or_default()
            .insert("May_2024".into(), MonthRecord::default());

        persist_data(&path, &data).await.unwrap();
        let loaded = load_data(&path).await;
        assert!(loaded.records[&UserId("u1".into())].contains_key("May_2024"));
    }
}
