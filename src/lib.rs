pub mod app;
pub mod auth;
pub mod calendar;
pub mod client;
pub mod config;
pub mod errors;
pub mod grid;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod ui;

pub use app::router;
pub use client::HttpStore;
pub use config::Config;
pub use grid::MonthlyGrid;
pub use state::AppState;
pub use store::{FileStore, RecordStore};
