use axum::response::Html;
use maud::Markup;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;

use crate::views::Context;

use super::error::AppError;
use super::session::Session;
use super::state::AppState;

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Full-page render. Drains the session's flash queue into the view.
pub fn render_page(
    state: &AppState,
    session: &mut Session,
    view: &str,
    vars: Value,
) -> Result<Html<String>, AppError> {
    let ctx = Context::new(vars).with_flashes(session.take_flashes());
    Ok(Html(state.views.render(view, &ctx)?))
}

/// Render for lessons that have no session.
pub fn render(state: &AppState, view: &str, vars: Value) -> Result<Html<String>, AppError> {
    Ok(Html(state.views.render(view, &Context::new(vars))?))
}

pub fn markup(page: Markup) -> Html<String> {
    Html(page.into_string())
}

/// `/user/{name}` with the name encoded as a single path segment.
pub fn user_url(name: &str) -> String {
    format!(
        "/user/{}",
        utf8_percent_encode(name, PATH_SEGMENT_ENCODE_SET)
    )
}
