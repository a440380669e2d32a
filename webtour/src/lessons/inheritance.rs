use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use serde_json::json;

use crate::http::{render, App, AppError, AppState};

pub fn app() -> App {
    App::new()
        .route("/", get(home))
        .route("/new", get(new_page))
}

async fn home(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render(&state, "inheritance/index", json!({}))
}

async fn new_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render(&state, "inheritance/new", json!({}))
}
