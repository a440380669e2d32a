use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use serde_json::json;

use crate::http::{render, App, AppError, AppState};

pub fn app() -> App {
    App::new()
        .route("/", get(home))
        .route("/user/{name}", get(user))
        .route("/python", get(code))
}

async fn home(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render(&state, "templates/index", json!({}))
}

async fn user(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Html<String>, AppError> {
    render(
        &state,
        "templates/user",
        json!({ "name": name, "role": "user", "age": 21 }),
    )
}

async fn code(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render(&state, "templates/code", json!({ "x": 10 }))
}
