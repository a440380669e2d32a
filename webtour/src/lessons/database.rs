use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Form;
use maud::html;
use serde_json::json;
use tracing::info;

use crate::http::{
    field, markup, render_page, required, App, AppError, AppState, FormData, Session,
};

pub fn app() -> App {
    App::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login))
        .route("/user", get(user_page).post(update_user))
        .route("/display", get(display))
        .route("/logout", get(logout))
}

async fn home(session: Session) -> Html<String> {
    match session.get("user") {
        Some(user) => markup(html! { h1 { "Welcome " (user) } }),
        None => markup(html! { h1 { "Welcome, Please login" } }),
    }
}

async fn login_page(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, AppError> {
    if session.contains("user") {
        return Ok(Redirect::to("/user").into_response());
    }
    let page = render_page(&state, &mut session, "database/login", json!({}))?;
    Ok((session, page).into_response())
}

async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<FormData>,
) -> Result<(Session, Redirect), AppError> {
    let name = required(&form, "name")?;
    let users = state.users()?;

    session.set_permanent(true);
    session.insert("user", name);
    match users.find_by_name(name).await? {
        Some(found) => {
            if let Some(email) = found.email {
                session.insert("email", email);
            }
        }
        None => {
            let created = users.insert(name, "").await?;
            info!(id = created.id, user = %created.name, "new user registered");
        }
    }

    Ok((session, Redirect::to("/user")))
}

async fn user_page(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, AppError> {
    let Some(user) = session.get("user").map(String::from) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let email = session.get("email").map(String::from);
    let page = render_page(
        &state,
        &mut session,
        "database/user",
        json!({ "user": user, "email": email }),
    )?;
    Ok((session, page).into_response())
}

async fn update_user(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<FormData>,
) -> Result<Response, AppError> {
    let Some(user) = session.get("user").map(String::from) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let email = field(&form, "email")?;
    let users = state.users()?;

    session.insert("email", email);
    // A session can outlive its row (e.g. a fresh database); recreate it instead of failing.
    match users.find_by_name(&user).await? {
        Some(found) => {
            users.update_email(found, email).await?;
        }
        None => {
            users.insert(&user, email).await?;
        }
    }
    info!(user = %user, "email updated");

    let page = render_page(
        &state,
        &mut session,
        "database/user",
        json!({ "user": user, "email": email }),
    )?;
    Ok((session, page).into_response())
}

async fn display(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<(Session, Html<String>), AppError> {
    let users = state.users()?.all().await?;
    let page = render_page(&state, &mut session, "database/display", json!({ "users": users }))?;
    Ok((session, page))
}

/// The session only ever holds `user` and `email` here, so logging out drops it.
async fn logout(mut session: Session) -> (Session, Redirect) {
    session.clear();
    (session, Redirect::to("/login"))
}
