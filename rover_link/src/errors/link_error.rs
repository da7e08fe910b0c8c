use std::error::Error;
use std::fmt;

/// Failure conditions of the control client. None of these are fatal: the
/// session retries forever, the recorder rejects bad transitions, and the
/// caller decides what to surface to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A send was attempted while the transport was down. The request is
    /// dropped, never queued.
    NotConnected,
    FailedToSend(String),
    Serialization(String),
    /// An inbound frame was not valid JSON. The frame is dropped and the
    /// read loop keeps going.
    MalformedInboundPayload(String),
    /// `stop()` with no recording in progress.
    NotRecording,
    /// `start()` while a recording is in progress.
    AlreadyRecording,
    /// A demo save or run was attempted with a blank name.
    EmptyDemoName,
    DashboardFetch(String),
}

impl Error for LinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LinkError::NotConnected => write!(f, "not connected to the controller"),
            LinkError::FailedToSend(ref msg) => write!(f, "send error: {}", msg),
            LinkError::Serialization(ref msg) => write!(f, "serialization error: {}", msg),
            LinkError::MalformedInboundPayload(ref msg) => {
                write!(f, "malformed inbound payload: {}", msg)
            }
            LinkError::NotRecording => write!(f, "no recording in progress"),
            LinkError::AlreadyRecording => write!(f, "a recording is already in progress"),
            LinkError::EmptyDemoName => write!(f, "demo name must not be empty"),
            LinkError::DashboardFetch(ref msg) => write!(f, "dashboard fetch failed: {}", msg),
        }
    }
}
