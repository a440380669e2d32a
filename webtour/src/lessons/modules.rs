use axum::response::Html;
use axum::routing::get;

use crate::http::{App, MountError};

use super::admin;

pub fn app() -> Result<App, MountError> {
    App::new()
        .route("/", get(home))
        .register_blueprint(admin::blueprint(), "/admin")
}

async fn home() -> Html<&'static str> {
    Html("<h1>Homepage</h1>")
}
