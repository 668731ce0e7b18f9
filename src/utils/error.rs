use anyhow::anyhow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidConfig(anyhow::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Logging(anyhow::Error),
    #[error("{kind:?}: {source}")]
    WithKind { kind: ErrorKind, source: anyhow::Error },
    #[error(transparent)]
    Others(#[from] anyhow::Error),
}

/// A type alias that forces the usage of the custom error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Which output path an error came from; purely for reporting.
#[derive(Debug, Clone, Copy)]
pub enum ErrorKind {
    InvalidConfig,
    ConfigDump,
    ResultsJson,
    JobsCsv,
}

/// Attach an [`ErrorKind`] to any error on its way up.
pub trait Kind<T> {
    fn kind(self, kind: ErrorKind) -> Result<T>;
}

impl<T, E> Kind<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn kind(self, kind: ErrorKind) -> Result<T> {
        self.map_err(|err| match kind {
            ErrorKind::InvalidConfig => Error::InvalidConfig(err.into()),
            _ => Error::WithKind { kind, source: err.into() },
        })
    }
}

impl From<tracing::subscriber::SetGlobalDefaultError> for Error {
    fn from(err: tracing::subscriber::SetGlobalDefaultError) -> Self {
        Self::Logging(anyhow::Error::from(err))
    }
}

impl From<tracing_subscriber::util::TryInitError> for Error {
    fn from(err: tracing_subscriber::util::TryInitError) -> Self {
        Self::Logging(anyhow::Error::from(err))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(anyhow::Error::from(err))
    }
}

impl From<rand_distr::NormalError> for Error {
    fn from(err: rand_distr::NormalError) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}

impl From<rand_distr::WeibullError> for Error {
    fn from(err: rand_distr::WeibullError) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}

impl Error {
    pub fn adhoc(msg: &'static str) -> Self {
        Self::Others(anyhow!(msg))
    }

    pub fn invalid_config(msg: &'static str) -> Self {
        Self::InvalidConfig(anyhow!(msg))
    }
}
