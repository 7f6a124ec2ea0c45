use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed trace {path}: field '{field}' {reason}")]
    MalformedTrace {
        path: String,
        field: String,
        reason: String,
    },

    #[error(
        "Could not find artifact for contract '{contract}' at {path}. \
         Make sure `forge build` was run and that abisync is invoked from the project root \
         (current directory: {cwd})."
    )]
    ArtifactNotFound {
        contract: String,
        path: String,
        cwd: String,
    },

    #[error("Invalid artifact for contract '{contract}' at {path}: {reason}")]
    InvalidArtifact {
        contract: String,
        path: String,
        reason: String,
    },

    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry error: {0}")]
    Registry(String),
}

impl Error {
    /// Build a [`Error::MalformedTrace`] for a trace file
    pub fn malformed(
        path: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedTrace {
            path: path.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
