use axum::response::Html;
use axum::routing::get;

use crate::http::{App, Blueprint, MountError};

use super::admin;

pub fn app() -> Result<App, MountError> {
    App::new()
        .route("/", get(home))
        .route("/home", get(home))
        .register_blueprint(side(), "/route/side")?
        .register_blueprint(admin::blueprint(), "/admin")
}

fn side() -> Blueprint {
    Blueprint::new("side")
        .static_folder("./static/side")
        .template_folder("side")
        .route("/", get(side_page))
        .route("/check", get(check))
}

async fn home() -> Html<&'static str> {
    Html("<h1>Homepage</h1>")
}

async fn side_page() -> Html<&'static str> {
    Html("<h1>Sidepage</h1>")
}

async fn check() -> Html<&'static str> {
    Html("<h1>Okay 👍</h1>")
}
