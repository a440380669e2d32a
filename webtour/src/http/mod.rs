//! HTTP layer: application builder, blueprints, sessions, and error pages.
//!
//! Lessons build their routes on top of [`App`] and [`Blueprint`]; handlers
//! extract a [`Session`] and return it next to the response to persist changes.

mod app;
mod error;
mod form;
mod responses;
mod session;
mod state;

#[cfg(test)]
mod tests;

pub use app::{App, Blueprint, BlueprintScope, MountError};
pub use error::AppError;
pub use form::{field, required, FormData};
pub use responses::{markup, render, render_page, user_url};
pub use session::Session;
pub use state::AppState;
