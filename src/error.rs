use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Layout must never start from partial data.
    #[error("graph data incomplete: {what}")]
    DataIncomplete { what: String },
}

impl GraphError {
    pub fn incomplete(what: impl Into<String>) -> Self {
        Self::DataIncomplete { what: what.into() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("edge references unknown node `{id}`")]
    UnknownNode { id: String },
    #[error("node `{id}` appears more than once")]
    DuplicateNode { id: String },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {what}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no {what} in data source")]
    Missing { what: String },
    #[error("no profile known for commit reference `{reference}`")]
    MissingProfile { reference: String },
}

/// Two or more free bodies share a position after seeding. Recovered by
/// re-seeding inside the simulation and never returned to callers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{coincident} bodies share a position")]
pub(crate) struct DegenerateGeometry {
    pub(crate) coincident: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
