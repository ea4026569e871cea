//! HTTP client for a running `study_time` server.

use crate::auth::{Authenticator, Session};
use crate::calendar::MonthKey;
use crate::errors::{GridError, Notification};
use crate::models::{
    LoginResponse, MeResponse, MonthRecord, MonthlyPoint, SaveRecordRequest, StoredRecord,
    SummaryResponse, UserId,
};
use crate::store::RecordStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Talks to the server on behalf of one logged-in session. The record
/// operations always send that session, so [`Authenticator::current_user`]
/// refuses any other one instead of resolving a user the store cannot act
/// for.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    session: Session,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self, GridError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| GridError::Retrieval(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Logs in and returns a store bound to the new session.
    pub async fn login(
        base_url: impl Into<String>,
        username: &str,
        password: &str,
    ) -> Result<Self, GridError> {
        let mut store = Self::new(base_url, Session::new(String::new()))?;
        let response = store
            .client
            .post(store.url("/api/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(|err| GridError::Retrieval(err.to_string()))?;
        let login: LoginResponse = read_json(response, GridError::Retrieval).await?;
        store.session = Session::new(login.token);
        Ok(store)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn logout(&self) -> Result<(), GridError> {
        let response = self
            .authorized(self.client.post(self.url("/api/logout")), &self.session)
            .send()
            .await
            .map_err(|err| GridError::Submission(err.to_string()))?;
        check_status(response, GridError::Submission).await.map(|_| ())
    }

    pub async fn monthly_stats(&self) -> Result<Vec<MonthlyPoint>, GridError> {
        self.get_json("/api/stats/monthly").await
    }

    pub async fn total_hours(&self) -> Result<f64, GridError> {
        let summary: SummaryResponse = self.get_json("/api/stats/summary").await?;
        Ok(summary.total_hours)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn record_url(key: &MonthKey) -> String {
        format!("/api/records/{}/{}", key.month, key.year)
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request.bearer_auth(session.token())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GridError> {
        let response = self
            .authorized(self.client.get(self.url(path)), &self.session)
            .send()
            .await
            .map_err(|err| GridError::Retrieval(err.to_string()))?;
        read_json(response, GridError::Retrieval).await
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn fetch_month_record(
        &self,
        user: &UserId,
        key: &MonthKey,
    ) -> Result<Option<MonthRecord>, GridError> {
        let response = self
            .authorized(self.client.get(self.url(&Self::record_url(key))), &self.session)
            .query(&[("user_id", user.as_str())])
            .send()
            .await
            .map_err(|err| GridError::Retrieval(err.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let stored: StoredRecord = read_json(response, GridError::Retrieval).await?;
        Ok(Some(MonthRecord { days: stored.days }))
    }

    async fn save_month_record(
        &self,
        user: &UserId,
        key: &MonthKey,
        record: &MonthRecord,
    ) -> Result<(), GridError> {
        let body = SaveRecordRequest {
            user_id: Some(user.clone()),
            days: record.days.clone(),
        };
        let response = self
            .authorized(self.client.put(self.url(&Self::record_url(key))), &self.session)
            .json(&body)
            .send()
            .await
            .map_err(|err| GridError::Submission(err.to_string()))?;
        check_status(response, GridError::Submission).await.map(|_| ())
    }

    async fn fetch_all_records(
        &self,
        user: &UserId,
    ) -> Result<Vec<(MonthKey, MonthRecord)>, GridError> {
        let response = self
            .authorized(self.client.get(self.url("/api/records")), &self.session)
            .query(&[("user_id", user.as_str())])
            .send()
            .await
            .map_err(|err| GridError::Retrieval(err.to_string()))?;
        let stored: Vec<StoredRecord> = read_json(response, GridError::Retrieval).await?;
        Ok(stored
            .into_iter()
            .map(|record| (record.key, MonthRecord { days: record.days }))
            .collect())
    }
}

#[async_trait]
impl Authenticator for HttpStore {
    async fn current_user(&self, session: &Session) -> Result<UserId, GridError> {
        if session.token().is_empty() {
            return Err(GridError::Authentication);
        }
        if session != &self.session {
            return Err(GridError::Forbidden(
                "session differs from the one this store is bound to".into(),
            ));
        }
        let response = self
            .authorized(self.client.get(self.url("/api/me")), session)
            .send()
            .await
            .map_err(|err| GridError::Retrieval(err.to_string()))?;
        let me: MeResponse = read_json(response, GridError::Retrieval).await?;
        Ok(me.user_id)
    }
}

/// Maps non-success responses onto the error taxonomy. `fallback` builds
/// the error for transport and server failures.
async fn check_status(
    response: Response,
    fallback: fn(String) -> GridError,
) -> Result<Response, GridError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<Notification>().await {
        Ok(note) => note.message,
        Err(_) => status.to_string(),
    };
    Err(match status {
        StatusCode::UNAUTHORIZED => GridError::Authentication,
        StatusCode::FORBIDDEN => GridError::Forbidden(message),
        StatusCode::NOT_FOUND => GridError::NotFound(message),
        StatusCode::BAD_REQUEST => GridError::Validation(message),
        StatusCode::CONFLICT => GridError::Conflict(message),
        _ => fallback(message),
    })
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    fallback: fn(String) -> GridError,
) -> Result<T, GridError> {
    check_status(response, fallback)
        .await?
        .json::<T>()
        .await
        .map_err(|err| GridError::Retrieval(format!("malformed response: {err}")))
}
