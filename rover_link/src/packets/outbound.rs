use serde::{Deserialize, Serialize};

use crate::Command;

/// A request sent to the rover controller. The wire format is an internally
/// tagged JSON object; tag and field names match the controller's vocabulary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "accion")]
pub enum Request {
    #[serde(rename = "mover")]
    Move {
        #[serde(rename = "comando")]
        command: Command,
    },
    #[serde(rename = "velocidad")]
    Speed {
        #[serde(rename = "modo")]
        mode: SpeedMode,
    },
    #[serde(rename = "guardar_demo")]
    SaveDemo {
        #[serde(rename = "nombre")]
        name: String,
        #[serde(rename = "pasos")]
        steps: Vec<Step>,
    },
    #[serde(rename = "ejecutar_demo")]
    RunDemo {
        #[serde(rename = "nombre")]
        name: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    #[serde(rename = "MID")]
    Mid,
    #[serde(rename = "HIGH")]
    High,
}

/// One entry of a recorded demo: a command and how long it was held.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Step {
    #[serde(rename = "cmd")]
    pub command: Command,
    #[serde(rename = "time")]
    pub duration_ms: u64,
}

impl Step {
    pub fn new(command: Command, duration_ms: u64) -> Self {
        Self {
            command,
            duration_ms,
        }
    }
}

/// An ordered step sequence produced by the recorder, always terminated by a
/// synthetic `{STOP, 500}` pad.
pub type Recording = Vec<Step>;
