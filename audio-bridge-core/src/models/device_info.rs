use serde::{Deserialize, Serialize};

/// What kind of endpoint a source or device is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// A realtime audio-graph host (e.g. a JACK server).
    Host,
    /// A synthetic generator driven by its own thread.
    Generator,
    Hardware,
    File,
    Null,
}

/// A frame source or output device, as shown in logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub id: String,
    pub name: String,
    pub kind: EndpointKind,
}

impl EndpointInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: EndpointKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}
