use axum::extract::Path;
use axum::response::{Html, Redirect};
use axum::routing::get;
use maud::html;

use crate::http::{markup, user_url, App};

pub fn app() -> App {
    App::new()
        .route("/", get(home))
        .route("/user/{name}", get(user))
        .route("/admin", get(admin))
        .route("/premium-user", get(premium))
}

async fn home() -> Html<&'static str> {
    Html("Hello world, This is main page <h1>HOMEPAGE</h1>")
}

async fn user(Path(name): Path<String>) -> Html<String> {
    markup(html! { "Hello " (name) "!" })
}

async fn admin() -> Redirect {
    Redirect::to("/")
}

async fn premium() -> Redirect {
    Redirect::to(&user_url("Samm"))
}
