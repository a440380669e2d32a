use std::sync::Arc;

use axum_extra::extract::cookie::Key;

use crate::config::SessionConfig;
use crate::store::UserStore;
use crate::views::Views;

use super::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub cookie_key: Key,
    pub session: Arc<SessionConfig>,
    pub views: Arc<Views>,
    pub users: Option<UserStore>,
}

impl AppState {
    pub fn new(cookie_key: Key, session: SessionConfig, views: Views) -> Self {
        Self {
            cookie_key,
            session: Arc::new(session),
            views: Arc::new(views),
            users: None,
        }
    }

    pub fn with_users(mut self, users: UserStore) -> Self {
        self.users = Some(users);
        self
    }

    pub fn users(&self) -> Result<&UserStore, AppError> {
        self.users.as_ref().ok_or(AppError::StoreUnavailable)
    }
}
