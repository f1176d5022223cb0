use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot read {what} input file {path:?}: {source}")]
    InputRead {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: binrw::Error,
    },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Region {region} is empty: its indicator map sums to zero")]
    EmptyRegion { region: usize },

    #[error("Singular transfer matrix: {0}")]
    SingularMatrix(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Cannot write output file {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: binrw::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Which stage of a GTM run produces this kind of failure
    pub fn stage(&self) -> &'static str {
        use Error::*;
        match self {
            InputRead { .. }                           => "input",
            DimensionMismatch(_) | InvalidParameter(_) => "validation",
            EmptyRegion { .. }                         => "regions",
            Numerical(_)                               => "transfer matrix",
            SingularMatrix(_)                          => "solver",
            Output { .. } | Io(_)                      => "output",
            Config(_)                                  => "configuration",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
