use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersonError {
    #[error("person profile directory {0} does not exist")]
    MissingDir(std::path::PathBuf),

    #[error("failed to read profile {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write profile {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown person key {0}")]
    UnknownPerson(String),

    #[error("could not acquire write lock on {0}")]
    Locked(std::path::PathBuf),
}
