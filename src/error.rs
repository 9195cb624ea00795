use std::io;
use std::result;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to process URL in request: {0}")]
    InvalidUrl(String),
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("unsupported qop option: {0}")]
    UnsupportedQop(String),
    #[error("missing \"{0}\" in header: {1}")]
    MissingRequired(&'static str, String),
    #[error("invalid header syntax: {0}")]
    InvalidHeaderSyntax(String),
    #[error("response carries no WWW-Authenticate header")]
    MissingChallenge,
    #[error("authorization value is not a valid header: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    /// True for failures that belong to the I/O class: the request could not be
    /// addressed, or the transport / body source failed.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::InvalidUrl(_) | Error::Io(_))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::InvalidUrl(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use std::io;

    #[test]
    fn test_io_classification() {
        assert!(Error::InvalidUrl("data:,x".into()).is_io());
        assert!(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).is_io());
        assert!(!Error::UnsupportedAlgorithm("sha-256".into()).is_io());

        let converted: io::Error = Error::InvalidUrl("data:,x".into()).into();
        assert_eq!(converted.kind(), io::ErrorKind::InvalidInput);
        assert!(converted.to_string().starts_with("unable to process URL"));

        let converted: io::Error = Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).into();
        assert_eq!(converted.kind(), io::ErrorKind::BrokenPipe);
    }
}
