use crate::auth::{Authenticator, Session};
use crate::calendar::{MonthKey, previous_months};
use crate::errors::{AppError, GridError, Notification};
use crate::grid::MonthlyGrid;
use crate::models::{
    GridResponse, LoginRequest, LoginResponse, MeResponse, MonthOption, MonthRecord, MonthlyPoint,
    MonthsQuery, NewUserRequest, OwnerQuery, Role, SaveRecordRequest, StoredRecord,
    SummaryResponse, UserId,
};
use crate::state::AppState;
use crate::stats::{aggregate_across_months, total_hours};
use crate::store::RecordStore;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::Html,
    Json,
};
use chrono::Local;
use tracing::{info, warn};

const MAX_MONTHS: usize = 120;

pub async fn index() -> Html<String> {
    Html(render_index(&current_month()))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(GridError::Validation("Please fill in all fields.".into()).into());
    }
    let Some(account) = state
        .store
        .verify_credentials(&payload.username, &payload.password)
        .await
    else {
        warn!("rejected login for {}", payload.username.trim());
        return Err(AppError::unauthorized("Invalid email or password"));
    };

    let session = state.sessions.open(account.id.clone()).await;
    info!(user = %account.id, "logged in");
    Ok(Json(LoginResponse {
        token: session.token().to_string(),
        user_id: account.id,
        role: account.role,
    }))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(session) = session_from(&headers) {
        state.sessions.close(&session).await;
    }
    StatusCode::NO_CONTENT
}

pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    let account = state
        .store
        .find_user(&user)
        .await
        .ok_or(GridError::Authentication)?;
    Ok(Json(MeResponse {
        user_id: account.id,
        username: account.username,
        role: account.role,
    }))
}

pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewUserRequest>,
) -> Result<(StatusCode, Json<MeResponse>), AppError> {
    let user = authenticate(&state, &headers).await?;
    let is_admin = state
        .store
        .find_user(&user)
        .await
        .is_some_and(|account| account.role == Role::Admin);
    if !is_admin {
        return Err(GridError::Forbidden("only admins can create users".into()).into());
    }

    let account = state
        .store
        .create_user(&payload.username, &payload.password, payload.role)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MeResponse {
            user_id: account.id,
            username: account.username,
            role: account.role,
        }),
    ))
}

pub async fn months(Query(query): Query<MonthsQuery>) -> Json<Vec<MonthOption>> {
    let count = query.count.unwrap_or(12).min(MAX_MONTHS);
    let options = previous_months(Local::now().date_naive(), count)
        .into_iter()
        .map(|key| MonthOption {
            label: key.to_string(),
            days: key.days_in_month(),
            key,
        })
        .collect();
    Json(options)
}

pub async fn get_grid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((month, year)): Path<(String, String)>,
) -> Result<Json<GridResponse>, AppError> {
    let key = MonthKey::parse(&month, &year)?;
    let session = session_from(&headers).ok_or(GridError::Authentication)?;

    let mut grid = MonthlyGrid::new(state.store.clone(), state.sessions.clone(), key);
    grid.load(&session, key).await?;

    Ok(Json(GridResponse {
        key,
        summary: grid.summary(),
        days: grid.record().days.clone(),
    }))
}

pub async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Vec<StoredRecord>>, AppError> {
    let user = authenticate_owner(&state, &headers, owner.user_id.as_ref()).await?;
    let records = state
        .store
        .fetch_all_records(&user)
        .await?
        .into_iter()
        .map(|(key, record)| StoredRecord {
            key,
            days: record.days,
        })
        .collect();
    Ok(Json(records))
}

pub async fn get_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((month, year)): Path<(String, String)>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<StoredRecord>, AppError> {
    let key = MonthKey::parse(&month, &year)?;
    let user = authenticate_owner(&state, &headers, owner.user_id.as_ref()).await?;
    let record = state
        .store
        .fetch_month_record(&user, &key)
        .await?
        .ok_or_else(|| GridError::NotFound(format!("no record for {key}")))?;
    Ok(Json(StoredRecord {
        key,
        days: record.days,
    }))
}

pub async fn put_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((month, year)): Path<(String, String)>,
    Json(payload): Json<SaveRecordRequest>,
) -> Result<Json<Notification>, AppError> {
    let key = MonthKey::parse(&month, &year)?;
    let user = authenticate_owner(&state, &headers, payload.user_id.as_ref()).await?;
    let record = MonthRecord { days: payload.days };
    state.store.save_month_record(&user, &key, &record).await?;
    Ok(Json(Notification::success("Data saved successfully!")))
}

pub async fn monthly_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MonthlyPoint>>, AppError> {
    let user = authenticate(&state, &headers).await?;
    let records = state.store.fetch_all_records(&user).await?;
    Ok(Json(aggregate_across_months(
        records.iter().map(|(key, record)| (key, record)),
    )))
}

pub async fn summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SummaryResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;
    let records = state.store.fetch_all_records(&user).await?;
    Ok(Json(SummaryResponse {
        total_hours: total_hours(records.iter().map(|(_, record)| record)),
    }))
}

fn session_from(headers: &HeaderMap) -> Option<Session> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(Session::from_authorization)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserId, GridError> {
    let session = session_from(headers).ok_or(GridError::Authentication)?;
    state.sessions.current_user(&session).await
}

/// Authenticates and, when the client names an owner, checks it is the
/// session's user.
async fn authenticate_owner(
    state: &AppState,
    headers: &HeaderMap,
    owner: Option<&UserId>,
) -> Result<UserId, GridError> {
    let user = authenticate(state, headers).await?;
    match owner {
        Some(owner) if owner != &user => Err(GridError::Forbidden(
            "records belong to another user".into(),
        )),
        _ => Ok(user),
    }
}

fn current_month() -> MonthKey {
    MonthKey::containing(Local::now().date_naive())
}
