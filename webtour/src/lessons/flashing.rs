use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Form;
use serde_json::json;
use tracing::info;

use crate::http::{render_page, required, App, AppError, AppState, FormData, Session};

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
        session.flash("info", "Already logged in");
        return Ok((session, Redirect::to("/user")).into_response());
    }
    let page = render_page(&state, &mut session, "flashing/index", json!({}))?;
    Ok((session, page).into_response())
}

async fn login(
    mut session: Session,
    Form(form): Form<FormData>,
) -> Result<(Session, Redirect), AppError> {
    let name = required(&form, "name")?;
    session.set_permanent(true);
    session.insert("user", name);
    session.flash("info", "Login successfully");
    info!(user = %name, "logged in");
    Ok((session, Redirect::to("/user")))
}

async fn user(State(state): State<AppState>, mut session: Session) -> Result<Response, AppError> {
    let Some(user) = session.get("user").map(String::from) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let page = render_page(&state, &mut session, "flashing/user", json!({ "user": user }))?;
    Ok((session, page).into_response())
}

async fn logout(mut session: Session) -> (Session, Redirect) {
    // Read the name before it leaves the session; anonymous logout is a plain redirect.
    if let Some(user) = session.remove("user") {
        session.flash(
            "info",
            format!("You've been logged out successfully, {user} !"),
        );
        info!(user = %user, "logged out");
    }
    (session, Redirect::to("/login"))
}
