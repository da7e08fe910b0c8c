use serde::Deserialize;
use serde_json::Value;

use crate::errors::LinkError;
use crate::Command;

/// A raw frame from the controller. The controller does not tag its messages
/// with a type discriminant; the shape is decided by which fields are present,
/// so every field here is optional.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct InboundFrame {
    pub status: Option<String>,
    #[serde(rename = "ultimo_comando")]
    pub last_command: Option<String>,
    #[serde(rename = "comando")]
    pub command: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: Option<String>,
    #[serde(rename = "valor")]
    pub value: Option<Value>,
    #[serde(rename = "mensaje")]
    pub message: Option<String>,
}

/// A classified message from the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// The command currently being executed. At least one of the two fields
    /// is present; `command` is the fresher one when both are.
    CommandEcho {
        last_command: Option<Command>,
        command: Option<Command>,
    },
    Telemetry {
        value: f64,
        band: TelemetryBand,
    },
    DemoSaved {
        message: String,
    },
    DemoFinished,
}

/// Presentation band for a telemetry reading. Color mapping belongs to the
/// presentation layer; the client only decides the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryBand {
    Critical,
    Warning,
    Nominal,
}

impl TelemetryBand {
    pub fn classify(value: f64) -> Self {
        if value < 20.0 {
            TelemetryBand::Critical
        } else if value < 50.0 {
            TelemetryBand::Warning
        } else {
            TelemetryBand::Nominal
        }
    }
}

impl InboundFrame {
    pub fn parse(raw: &str) -> Result<Self, LinkError> {
        serde_json::from_str(raw).map_err(|e| LinkError::MalformedInboundPayload(e.to_string()))
    }

    /// Evaluates every shape predicate independently and returns one message
    /// per match. The predicates are non-exclusive: a frame carrying both a
    /// status field and a telemetry field yields both messages. A frame
    /// matching nothing yields an empty list, which the caller treats as a
    /// diagnostic, not an error.
    pub fn classify(&self) -> Vec<InboundMessage> {
        let mut matched = Vec::new();

        let echo_status = matches!(self.status.as_deref(), Some("ok") | Some("ejecutando_paso"));
        if echo_status && (self.last_command.is_some() || self.command.is_some()) {
            matched.push(InboundMessage::CommandEcho {
                last_command: self.last_command.clone().map(Command::new),
                command: self.command.clone().map(Command::new),
            });
        }

        if self.kind.as_deref() == Some("sensor") {
            if let Some(value) = self.value.as_ref().and_then(numeric) {
                matched.push(InboundMessage::Telemetry {
                    value,
                    band: TelemetryBand::classify(value),
                });
            }
        }

        if self.status.as_deref() == Some("demo_guardada") {
            matched.push(InboundMessage::DemoSaved {
                message: self.message.clone().unwrap_or_default(),
            });
        }

        if self.status.as_deref() == Some("demo_finalizada") {
            matched.push(InboundMessage::DemoFinished);
        }

        matched
    }
}

// `valor` arrives as a JSON number or as a numeric string depending on the
// controller's sampling path.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
