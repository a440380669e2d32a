//! Named HTML views rendered with maud.
//!
//! Handlers never build markup by hand: they pick a view name and hand over a
//! JSON object of variables. Views that share chrome call [`layout`], which is
//! how page inheritance is expressed (title block, flash banners, content block).
//! Every interpolated value is escaped by maud.

use std::collections::HashMap;

use maud::{html, Markup, DOCTYPE};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::flash::FlashMessage;

pub type ViewFn = fn(&Context) -> Result<Markup, RenderError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("unknown view {0}")]
    UnknownView(String),
    #[error("view {view} is missing variable {name}")]
    MissingVariable { view: String, name: String },
    #[error("variable {name} has the wrong type for view {view}")]
    InvalidVariable { view: String, name: String },
}

/// Variables and drained flash messages for one render.
#[derive(Debug, Clone, Default)]
pub struct Context {
    view: String,
    vars: Map<String, Value>,
    flashes: Vec<FlashMessage>,
}

impl Context {
    /// Non-object values are treated as an empty variable set.
    pub fn new(vars: Value) -> Self {
        let vars = match vars {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            view: String::new(),
            vars,
            flashes: Vec::new(),
        }
    }

    pub fn with_flashes(mut self, flashes: Vec<FlashMessage>) -> Self {
        self.flashes = flashes;
        self
    }

    pub fn flashes(&self) -> &[FlashMessage] {
        &self.flashes
    }

    pub fn get(&self, name: &str) -> Result<&Value, RenderError> {
        self.vars
            .get(name)
            .ok_or_else(|| RenderError::MissingVariable {
                view: self.view.clone(),
                name: String::from(name),
            })
    }

    pub fn str(&self, name: &str) -> Result<&str, RenderError> {
        self.get(name)?
            .as_str()
            .ok_or_else(|| self.invalid(name))
    }

    /// Missing and `null` both read as absent.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.vars.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Result<i64, RenderError> {
        self.get(name)?
            .as_i64()
            .ok_or_else(|| self.invalid(name))
    }

    pub fn list(&self, name: &str) -> Result<&[Value], RenderError> {
        self.get(name)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.invalid(name))
    }

    fn invalid(&self, name: &str) -> RenderError {
        RenderError::InvalidVariable {
            view: self.view.clone(),
            name: String::from(name),
        }
    }
}

#[derive(Clone)]
pub struct Views {
    views: HashMap<String, ViewFn>,
}

impl std::fmt::Debug for Views {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.views.keys().collect();
        names.sort();
        f.debug_struct("Views").field("views", &names).finish()
    }
}

impl Views {
    pub fn empty() -> Self {
        Self {
            views: HashMap::new(),
        }
    }

    /// Every view used by the lessons.
    pub fn builtin() -> Self {
        let mut views = Self::empty();
        views.register("templates/index", templates_index);
        views.register("templates/user", templates_user);
        views.register("templates/code", templates_code);
        views.register("inheritance/index", inheritance_index);
        views.register("inheritance/new", inheritance_new);
        views.register("methods/index", login_form);
        views.register("sessions/index", login_form);
        views.register("flashing/index", login_form);
        views.register("flashing/user", flashing_user);
        views.register("database/login", login_form);
        views.register("database/user", database_user);
        views.register("database/display", database_display);
        views.register("admin/index", admin_index);
        views
    }

    pub fn register(&mut self, name: impl Into<String>, view: ViewFn) {
        self.views.insert(name.into(), view);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    pub fn render(&self, name: &str, ctx: &Context) -> Result<String, RenderError> {
        let view = self
            .views
            .get(name)
            .ok_or_else(|| RenderError::UnknownView(String::from(name)))?;
        let mut ctx = ctx.clone();
        ctx.view = String::from(name);
        Ok(view(&ctx)?.into_string())
    }

    /// Looks up `"{scope}/{name}"` first, then falls back to `name`.
    pub fn render_scoped(
        &self,
        scope: Option<&str>,
        name: &str,
        ctx: &Context,
    ) -> Result<String, RenderError> {
        if let Some(scope) = scope {
            let scoped = format!("{}/{name}", scope.trim_end_matches('/'));
            if self.contains(&scoped) {
                return self.render(&scoped, ctx);
            }
        }
        self.render(name, ctx)
    }
}

impl Default for Views {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Base page shared by every view that extends it.
pub fn layout(title: &str, flashes: &[FlashMessage], content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                nav {
                    a href="/" { "Home" }
                    " | "
                    a href="/login" { "Login" }
                    " | "
                    a href="/logout" { "Logout" }
                }
                @for flash in flashes {
                    div class={ "flash flash-" (flash.category) } role="alert" {
                        (flash.message)
                    }
                }
                main { (content) }
            }
        }
    }
}

fn templates_index(_ctx: &Context) -> Result<Markup, RenderError> {
    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head { title { "Home page" } }
            body { h1 { "Home page" } p { "Rendered from a named view." } }
        }
    })
}

fn templates_user(ctx: &Context) -> Result<Markup, RenderError> {
    let name = ctx.str("name")?;
    let role = ctx.str("role")?;
    let age = ctx.int("age")?;
    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head { title { "User" } }
            body {
                h1 { "Hello " (name) "!" }
                p { "Role: " (role) }
                p { "Age: " (age) }
            }
        }
    })
}

fn templates_code(ctx: &Context) -> Result<Markup, RenderError> {
    let x = ctx.int("x")?;
    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head { title { "Python" } }
            body {
                h1 { "Counting to " (x) }
                ul {
                    @for i in 0..x {
                        li { (i) }
                    }
                }
            }
        }
    })
}

fn inheritance_index(ctx: &Context) -> Result<Markup, RenderError> {
    Ok(layout(
        "Home page",
        ctx.flashes(),
        html! {
            h1 { "Home page" }
            p { "This page extends the base layout." }
        },
    ))
}

fn inheritance_new(ctx: &Context) -> Result<Markup, RenderError> {
    Ok(layout(
        "New page",
        ctx.flashes(),
        html! {
            h1 { "New page" }
            p { "Same layout, different content block." }
        },
    ))
}

fn login_form(ctx: &Context) -> Result<Markup, RenderError> {
    Ok(layout(
        "Login",
        ctx.flashes(),
        html! {
            h1 { "Login" }
            form method="post" {
                label for="name" { "Name" }
                input type="text" id="name" name="name" required;
                button type="submit" { "Submit" }
            }
        },
    ))
}

fn flashing_user(ctx: &Context) -> Result<Markup, RenderError> {
    let user = ctx.str("user")?;
    Ok(layout(
        "User",
        ctx.flashes(),
        html! {
            h1 { "Hi " (user) "!" }
        },
    ))
}

fn database_user(ctx: &Context) -> Result<Markup, RenderError> {
    let user = ctx.str("user")?;
    let email = ctx.opt_str("email").unwrap_or_default();
    Ok(layout(
        "User",
        ctx.flashes(),
        html! {
            h1 { "Hi " (user) "!" }
            form method="post" {
                label for="email" { "Email" }
                input type="email" id="email" name="email" value=(email);
                button type="submit" { "Save" }
            }
        },
    ))
}

fn database_display(ctx: &Context) -> Result<Markup, RenderError> {
    let users = ctx.list("users")?;
    Ok(layout(
        "Users",
        ctx.flashes(),
        html! {
            h1 { "Users" }
            table {
                thead { tr { th { "Id" } th { "Name" } th { "Email" } } }
                tbody {
                    @for user in users {
                        tr {
                            td { (user.get("id").and_then(Value::as_i64).unwrap_or_default()) }
                            td { (user.get("name").and_then(Value::as_str).unwrap_or_default()) }
                            td { (user.get("email").and_then(Value::as_str).unwrap_or_default()) }
                        }
                    }
                }
            }
        },
    ))
}

fn admin_index(_ctx: &Context) -> Result<Markup, RenderError> {
    Ok(html! {
        h1 { "Admin's page" }
    })
}
