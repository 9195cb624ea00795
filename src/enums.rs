use crate::{Error, Result};
use std::fmt::{self, Display, Formatter};
use std::io;
use std::str::FromStr;

use digest::{Digest, DynDigest};
use md5::Md5;

/// Digest algorithm named by the challenge.
///
/// Only the MD5 family is supported; anything else is rejected when parsed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Algorithm {
    Md5,
    Md5Sess,
}

impl Algorithm {
    /// True for the `-sess` variant, where HA1 also binds the server and client nonce
    pub fn is_session(self) -> bool {
        self == Algorithm::Md5Sess
    }

    /// Fresh hasher for the digest primitive behind this algorithm
    pub fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            Algorithm::Md5 | Algorithm::Md5Sess => Box::new(Md5::new()),
        }
    }

    /// Hash a byte buffer in one shot, returning lowercase hex
    pub fn hash(self, bytes: &[u8]) -> String {
        let mut hash = self.hasher();
        hash.update(bytes);
        hex::encode(hash.finalize())
    }

    /// Calculate a hash of string's bytes using the selected algorithm
    pub fn hash_str(self, s: &str) -> String {
        self.hash(s.as_bytes())
    }

    /// A sink that feeds everything written to it into a fresh hasher
    pub fn sink(self) -> HashSink {
        HashSink(self.hasher())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Parse the `algorithm` directive, ignoring case
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "md5-sess" => Ok(Algorithm::Md5Sess),
            _ => Err(Error::UnsupportedAlgorithm(s.into())),
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Md5
    }
}

impl Display for Algorithm {
    /// Lowercase form, as echoed in the Authorization header
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Md5 => "md5",
            Algorithm::Md5Sess => "md5-sess",
        })
    }
}

/// Streaming input for a hash; finalize with [`HashSink::finish`].
pub struct HashSink(Box<dyn DynDigest>);

impl HashSink {
    pub fn finish(self) -> String {
        hex::encode(self.0.finalize())
    }
}

impl io::Write for HashSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// QOP field values
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Qop {
    Auth,
    AuthInt,
}

impl FromStr for Qop {
    type Err = Error;

    /// Parse from "auth" or "auth-int" as used in HTTP headers
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auth" => Ok(Qop::Auth),
            "auth-int" => Ok(Qop::AuthInt),
            _ => Err(Error::UnsupportedQop(s.into())),
        }
    }
}

impl Display for Qop {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Qop::Auth => "auth",
            Qop::AuthInt => "auth-int",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Algorithm, Qop};
    use crate::Error;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn test_algorithm_parse() {
        assert_eq!(Algorithm::from_str("MD5").unwrap(), Algorithm::Md5);
        assert_eq!(Algorithm::from_str("md5").unwrap(), Algorithm::Md5);
        assert_eq!(Algorithm::from_str("MD5-sess").unwrap(), Algorithm::Md5Sess);
        assert_eq!(Algorithm::from_str("md5-SESS").unwrap(), Algorithm::Md5Sess);

        match Algorithm::from_str("SHA-256") {
            Err(Error::UnsupportedAlgorithm(name)) => assert_eq!(name, "SHA-256"),
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(Algorithm::default().to_string(), "md5");
        assert_eq!(Algorithm::Md5Sess.to_string(), "md5-sess");
        assert!(Algorithm::Md5Sess.is_session());
        assert!(!Algorithm::Md5.is_session());
    }

    #[test]
    fn test_md5_primitive() {
        assert_eq!(Algorithm::Md5.hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            Algorithm::Md5.hash_str("The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
        // every call starts from a clean state
        assert_eq!(Algorithm::Md5.hash(b"abc"), Algorithm::Md5.hash(b"abc"));
    }

    #[test]
    fn test_sink_matches_one_shot() {
        let mut sink = Algorithm::Md5.sink();
        sink.write_all(b"The quick brown fox ").unwrap();
        sink.write_all(b"jumps over the lazy dog").unwrap();
        assert_eq!(sink.finish(), "9e107d9d372bb6826bd81d3542a419d6");
    }

    #[test]
    fn test_qop_parse() {
        assert_eq!(Qop::from_str("auth").unwrap(), Qop::Auth);
        assert_eq!(Qop::from_str("auth-int").unwrap(), Qop::AuthInt);
        assert!(matches!(Qop::from_str("auth-conf"), Err(Error::UnsupportedQop(_))));
        assert_eq!(Qop::AuthInt.to_string(), "auth-int");
    }
}
