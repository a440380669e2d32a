//! The lessons, one router each. Only one lesson is served per process.

mod admin;
mod basics;
mod blueprints;
mod database;
mod flashing;
mod inheritance;
mod methods;
mod modules;
mod sessions;
mod templates;

use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::http::{App, MountError};

const DAY: u64 = 24 * 3600;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lesson {
    /// Plain routes, path parameters and redirects.
    #[default]
    Basics,
    /// Views rendered with variables.
    Templates,
    /// Pages sharing one base layout.
    Inheritance,
    /// GET and POST on the same path.
    Methods,
    /// Login and logout kept in a signed session cookie.
    Sessions,
    /// Permanent sessions and flash messages.
    Flashing,
    /// Users persisted in SQLite.
    Database,
    /// Route groups mounted under prefixes.
    Blueprints,
    /// A blueprint defined in its own module.
    Modules,
}

impl Lesson {
    pub fn name(self) -> &'static str {
        match self {
            Lesson::Basics => "basics",
            Lesson::Templates => "templates",
            Lesson::Inheritance => "inheritance",
            Lesson::Methods => "methods",
            Lesson::Sessions => "sessions",
            Lesson::Flashing => "flashing",
            Lesson::Database => "database",
            Lesson::Blueprints => "blueprints",
            Lesson::Modules => "modules",
        }
    }

    pub fn default_session_lifetime(self) -> Duration {
        match self {
            Lesson::Flashing => Duration::from_secs(7 * DAY),
            Lesson::Database => Duration::from_secs(10 * DAY),
            _ => Duration::from_secs(31 * DAY),
        }
    }

    pub fn uses_store(self) -> bool {
        matches!(self, Lesson::Database)
    }

    pub fn app(self) -> Result<App, MountError> {
        match self {
            Lesson::Basics => Ok(basics::app()),
            Lesson::Templates => Ok(templates::app()),
            Lesson::Inheritance => Ok(inheritance::app()),
            Lesson::Methods => Ok(methods::app()),
            Lesson::Sessions => Ok(sessions::app()),
            Lesson::Flashing => Ok(flashing::app()),
            Lesson::Database => Ok(database::app()),
            Lesson::Blueprints => blueprints::app(),
            Lesson::Modules => modules::app(),
        }
    }
}
