//! The admin blueprint, shared by the blueprint and module lessons.

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Extension;

use crate::http::{AppError, AppState, Blueprint, BlueprintScope};
use crate::views::Context;

pub fn blueprint() -> Blueprint {
    Blueprint::new("admin")
        .static_folder("./static/admin")
        .template_folder("admin")
        .route("/", get(admin_page))
}

async fn admin_page(
    State(state): State<AppState>,
    Extension(scope): Extension<BlueprintScope>,
) -> Result<Html<String>, AppError> {
    let page = state
        .views
        .render_scoped(scope.template_folder.as_deref(), "index", &Context::default())?;
    Ok(Html(page))
}
