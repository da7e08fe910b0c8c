use std::fmt;

use serde::{Deserialize, Serialize};

pub mod dashboard;
pub mod errors;
pub mod packets;
pub mod recorder;
pub mod session;

pub use errors::*;

/// A discrete motion token understood by the rover controller.
///
/// The vocabulary (directional moves, `STOP`, `AUTO`, `MANUAL`, ...) is owned
/// by the controller; the client treats tokens as opaque strings and only
/// special-cases `STOP` as the resting command for recordings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
    pub fn new<T: Into<String>>(token: T) -> Self {
        Self(token.into())
    }

    /// The resting command. Recordings start from it and are padded with it.
    pub fn stop() -> Self {
        Self("STOP".to_string())
    }

    pub fn auto() -> Self {
        Self("AUTO".to_string())
    }

    pub fn manual() -> Self {
        Self("MANUAL".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Command {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}
