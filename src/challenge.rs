use crate::codec;
use crate::{Algorithm, Error, Qop, Result};
use std::str::FromStr;

/// Authentication scheme handled by this crate
pub const SCHEME: &str = "Digest";

/// qop directives as offered by the server, lower-cased, in offer order, without
/// duplicates. A challenge without `qop` yields the single token [`QopDirectives::MISSING`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct QopDirectives(Vec<String>);

impl QopDirectives {
    /// Placeholder token standing for "the server sent no qop" (RFC 2069 mode)
    pub const MISSING: &'static str = "missing";

    /// Parse the raw `qop` directive value (if any)
    pub fn parse(raw: Option<&str>) -> Self {
        let mut tokens: Vec<String> = vec![];
        for token in raw.unwrap_or_default().split(',') {
            let token = token.trim().to_ascii_lowercase();
            if token.is_empty() || tokens.contains(&token) {
                continue;
            }
            tokens.push(token);
        }

        if tokens.is_empty() {
            tokens.push(Self::MISSING.to_string());
        }

        QopDirectives(tokens)
    }

    /// The first token; it decides which formulas are used
    pub fn primary(&self) -> &str {
        // never empty, see `parse`
        self.0.first().map_or(Self::MISSING, String::as_str)
    }

    pub fn is_missing(&self) -> bool {
        self.primary() == Self::MISSING
    }

    /// The qop mode selected by the primary token, `None` if the server sent no qop
    ///
    /// # Errors
    /// If the primary token is neither `auth` nor `auth-int`
    pub fn selected(&self) -> Result<Option<Qop>> {
        if self.is_missing() {
            return Ok(None);
        }
        Qop::from_str(self.primary()).map(Some)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Digest challenge parsed from a `WWW-Authenticate` header value
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Challenge {
    /// Protection space announced by the server. May be absent if the client
    /// overrides it anyway.
    pub realm: Option<String>,
    /// Server nonce
    pub nonce: String,
    /// Server opaque string, echoed back when non-empty
    pub opaque: Option<String>,
    /// Lower-cased `algorithm` directive, "md5" if the server named none
    pub algorithm: String,
    pub qop: QopDirectives,
}

impl Challenge {
    /// Construct from the `WWW-Authenticate` header string
    ///
    /// # Errors
    /// If the header is malformed or lacks a nonce. The algorithm is not
    /// validated here, see [`Challenge::algorithm`].
    pub fn parse(input: &str) -> Result<Self> {
        let kv = codec::split_csl(SCHEME, input)?;

        Ok(Self {
            realm: kv.get("realm").map(str::to_owned),
            nonce: match kv.get("nonce") {
                Some(v) => v.to_owned(),
                None => return Err(Error::MissingRequired("nonce", input.into())),
            },
            opaque: kv.get("opaque").map(str::to_owned),
            algorithm: kv.get("algorithm").unwrap_or("MD5").to_ascii_lowercase(),
            qop: QopDirectives::parse(kv.get("qop")),
        })
    }

    /// Resolve the digest algorithm
    ///
    /// # Errors
    /// `UnsupportedAlgorithm` for anything outside the MD5 family
    pub fn algorithm(&self) -> Result<Algorithm> {
        Algorithm::from_str(&self.algorithm)
    }

    /// Opaque value to echo, `None` when the server sent none or an empty one
    pub fn echoed_opaque(&self) -> Option<&str> {
        self.opaque.as_deref().filter(|o| !o.is_empty())
    }
}

impl FromStr for Challenge {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        Self::parse(input)
    }
}

/// True if a `WWW-Authenticate` value announces the Digest scheme
pub fn is_digest(header: &str) -> bool {
    header.starts_with(SCHEME)
}
