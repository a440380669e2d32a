use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use axum::routing::get;
use axum::Form;
use maud::html;
use serde_json::json;
use tracing::debug;

use crate::http::{markup, render, required, user_url, App, AppError, AppState, FormData};

pub fn app() -> App {
    App::new()
        .route("/", get(login_form).post(login))
        .route("/user/{usr}", get(user))
}

async fn login_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render(&state, "methods/index", json!({}))
}

async fn login(Form(form): Form<FormData>) -> Result<Redirect, AppError> {
    let name = required(&form, "name")?;
    debug!(user = %name, "login form submitted");
    Ok(Redirect::to(&user_url(name)))
}

async fn user(Path(usr): Path<String>) -> Html<String> {
    markup(html! { h1 { "Hi " (usr) "!" } })
}
