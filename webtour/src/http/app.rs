//! Application builder and blueprints.
//!
//! A [`Blueprint`] is a named group of routes with its own static folder and
//! template scope. Blueprints are built on their own and mounted onto an
//! [`App`] under a URL prefix. All routes are flattened into one axum router at
//! startup; nothing is mounted or unmounted afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::header::HeaderName;
use axum::response::Redirect;
use axum::routing::{any, MethodRouter};
use axum::{Extension, Router};
use thiserror::Error;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::GlobalKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::config::RateLimitConfig;

use super::error::{method_not_allowed, not_found};
use super::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountError {
    #[error("blueprint {0} is already registered")]
    DuplicateBlueprint(String),
    #[error("route {0} is registered more than once")]
    RouteConflict(String),
    #[error("route path {0} must start with '/'")]
    InvalidPath(String),
    #[error("invalid rate limit configuration")]
    RateLimit,
}

/// Attached to every request routed into a blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintScope {
    pub name: String,
    pub template_folder: Option<String>,
}

pub struct Blueprint {
    name: String,
    static_folder: Option<PathBuf>,
    template_folder: Option<String>,
    routes: Vec<(String, MethodRouter<AppState>)>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            static_folder: None,
            template_folder: None,
            routes: Vec::new(),
        }
    }

    pub fn static_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_folder = Some(path.into());
        self
    }

    /// View scope searched before the global views, e.g. `admin` for `admin/index`.
    pub fn template_folder(mut self, scope: impl Into<String>) -> Self {
        self.template_folder = Some(scope.into());
        self
    }

    pub fn route(mut self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.routes.push((String::from(path), method_router));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> BlueprintScope {
        BlueprintScope {
            name: self.name.clone(),
            template_folder: self.template_folder.clone(),
        }
    }
}

pub struct App {
    routes: Vec<(String, MethodRouter<AppState>)>,
    static_mounts: Vec<(String, PathBuf)>,
    blueprints: BTreeMap<String, String>,
    rate_limit: Option<RateLimitConfig>,
}

impl App {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            static_mounts: Vec::new(),
            blueprints: BTreeMap::new(),
            rate_limit: None,
        }
    }

    pub fn route(mut self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.routes.push((String::from(path), method_router));
        self
    }

    pub fn static_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_mounts
            .push((String::from("/static"), path.into()));
        self
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Mounts every route of `blueprint` under `url_prefix`.
    pub fn register_blueprint(
        mut self,
        blueprint: Blueprint,
        url_prefix: &str,
    ) -> Result<Self, MountError> {
        if self.blueprints.contains_key(blueprint.name()) {
            return Err(MountError::DuplicateBlueprint(blueprint.name));
        }

        let prefix = url_prefix.trim_end_matches('/');
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(MountError::InvalidPath(String::from(url_prefix)));
        }

        let scope = blueprint.scope();
        for (path, method_router) in blueprint.routes {
            let full = join_path(prefix, &path)?;
            self.routes
                .push((full, method_router.layer(Extension(scope.clone()))));
        }
        if let Some(folder) = blueprint.static_folder {
            self.static_mounts.push((format!("{prefix}/static"), folder));
        }

        debug!(blueprint = %scope.name, prefix = %prefix, "blueprint registered");
        self.blueprints.insert(scope.name, String::from(prefix));
        Ok(self)
    }

    /// Mounted blueprints by name, with their URL prefix.
    pub fn blueprints(&self) -> &BTreeMap<String, String> {
        &self.blueprints
    }

    pub fn into_router(self, state: AppState) -> Result<Router, MountError> {
        let mut seen = BTreeSet::new();
        for (path, _) in &self.routes {
            if !path.starts_with('/') {
                return Err(MountError::InvalidPath(path.clone()));
            }
            if !seen.insert(route_key(path)) {
                return Err(MountError::RouteConflict(path.clone()));
            }
        }
        check_static_mounts(&self.routes, &self.static_mounts)?;

        let mut router = Router::new();
        for (path, method_router) in self.routes {
            if let Some(bare) = slash_redirect_source(&path) {
                if !seen.contains(&route_key(bare)) {
                    let target = path.clone();
                    router = router.route(
                        bare,
                        any(move || {
                            let target = target.clone();
                            async move { Redirect::permanent(&target) }
                        }),
                    );
                }
            }
            router = router.route(&path, method_router);
        }
        for (path, folder) in self.static_mounts {
            router = router.nest_service(&path, ServeDir::new(folder));
        }

        let mut router = router
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed);

        if let Some(limit) = self.rate_limit {
            let governor_conf = Arc::new(
                GovernorConfigBuilder::default()
                    .per_millisecond(limit.replenish_ms)
                    .burst_size(limit.burst)
                    .key_extractor(GlobalKeyExtractor)
                    .finish()
                    .ok_or(MountError::RateLimit)?,
            );
            router = router.layer(GovernorLayer::new(governor_conf));
        }

        Ok(router
            .layer(SetRequestIdLayer::new(
                HeaderName::from_static(REQUEST_ID_HEADER),
                MakeRequestUuid::default(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                REQUEST_ID_HEADER,
            )))
            .layer(TraceLayer::new_for_http())
            .with_state(state))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Static mounts own their path and everything below it.
fn check_static_mounts(
    routes: &[(String, MethodRouter<AppState>)],
    mounts: &[(String, PathBuf)],
) -> Result<(), MountError> {
    let mut mounted = BTreeSet::new();
    for (mount, _) in mounts {
        if !mounted.insert(mount.as_str()) {
            return Err(MountError::RouteConflict(mount.clone()));
        }
        let nested = format!("{mount}/");
        if let Some((path, _)) = routes
            .iter()
            .find(|(path, _)| path == mount || path.starts_with(&nested))
        {
            return Err(MountError::RouteConflict(path.clone()));
        }
    }
    Ok(())
}

/// Route shape as the router sees it: `/user/{a}` and `/user/{b}` are the same route.
fn route_key(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") && segment.ends_with('}') {
                "{*}"
            } else if segment.starts_with('{')
                && segment.ends_with('}')
                && !segment.starts_with("{{")
            {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn join_path(prefix: &str, path: &str) -> Result<String, MountError> {
    if !path.starts_with('/') {
        return Err(MountError::InvalidPath(String::from(path)));
    }
    Ok(format!("{prefix}{path}"))
}

/// `/admin/` is also reachable as `/admin` through a permanent redirect.
fn slash_redirect_source(path: &str) -> Option<&str> {
    if path.len() > 1 && path.ends_with('/') {
        Some(path.trim_end_matches('/')).filter(|bare| !bare.is_empty())
    } else {
        None
    }
}
