use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/me", get(handlers::me))
        .route("/api/users", post(handlers::create_user))
        .route("/api/months", get(handlers::months))
        .route("/api/grid/:month/:year", get(handlers::get_grid))
        .route("/api/records", get(handlers::list_records))
        .route(
            "/api/records/:month/:year",
            get(handlers::get_record).put(handlers::put_record),
        )
        .route("/api/stats/monthly", get(handlers::monthly_stats))
        .route("/api/stats/summary", get(handlers::summary))
        .with_state(state)
}
