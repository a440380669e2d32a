use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Form;
use maud::html;
use serde_json::json;
use tracing::info;

use crate::http::{markup, render_page, required, App, AppError, AppState, FormData, Session};

pub fn app() -> App {
    App::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login))
        .route("/user", get(user))
        .route("/logout", get(logout))
}

async fn home() -> Redirect {
    Redirect::to("/login")
}

async fn login_page(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, AppError> {
    if session.contains("user") {
        return Ok(Redirect::to("/user").into_response());
    }
    let page = render_page(&state, &mut session, "sessions/index", json!({}))?;
    Ok((session, page).into_response())
}

async fn login(
    mut session: Session,
    Form(form): Form<FormData>,
) -> Result<(Session, Redirect), AppError> {
    let name = required(&form, "name")?;
    session.insert("user", name);
    info!(user = %name, "logged in");
    Ok((session, Redirect::to("/user")))
}

async fn user(session: Session) -> Response {
    match session.get("user") {
        Some(user) => markup(html! { h1 { "Hi " (user) "!" } }).into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

async fn logout(mut session: Session) -> (Session, Redirect) {
    if let Some(user) = session.remove("user") {
        info!(user = %user, "logged out");
    }
    (session, Redirect::to("/login"))
}
