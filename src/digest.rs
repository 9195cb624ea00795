use crate::codec;
use crate::nonce::{NonceGenerator, CNONCE_LEN, OPAQUE_LEN};
use crate::transport::Body;
use crate::{Algorithm, Challenge, Error, Qop, Result, SCHEME};
use std::fmt::{self, Display, Formatter};

use http::Method;

/// Nonce count sent with every response. A server nonce is never reused for a
/// second request, so it never advances.
pub const NONCE_COUNT: &str = "00000001";

/// Login credentials, optionally pinned to a realm
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
    realm: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            realm: None,
        }
    }

    /// Credentials whose `realm` replaces whatever realm the server announces
    pub fn with_realm(
        realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            realm: Some(realm.into()),
            ..Self::new(username, password)
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("realm", &self.realm)
            .finish()
    }
}

/// The parts of the challenged request that go into the digest.
///
/// Borrowed; meaningful only for the one retry it is built for.
pub struct DigestContext<'a> {
    pub method: &'a Method,
    /// Request path (not a full URL, should start with a slash)
    pub uri: &'a str,
    /// Request payload, digested only for `auth-int`. No body hashes as empty.
    pub body: Option<&'a dyn Body>,
}

impl<'a> DigestContext<'a> {
    /// Context for a request without a body
    pub fn new(method: &'a Method, uri: &'a str) -> Self {
        Self {
            method,
            uri,
            body: None,
        }
    }

    pub fn with_body(mut self, body: &'a dyn Body) -> Self {
        self.body = Some(body);
        self
    }
}

impl fmt::Debug for DigestContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestContext")
            .field("method", self.method)
            .field("uri", &self.uri)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Fields of the `Authorization` header answering a digest challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub username: String,
    pub realm: String,
    pub nonce: String,
    pub uri: String,
    /// Computed digest
    pub response: String,
    pub algorithm: Algorithm,
    /// Server opaque, or a client-made one if the server sent none
    pub opaque: String,
    /// qop chosen from the challenge; `None` in RFC 2069 mode, in which case
    /// `nc` and `cnonce` are left out as well
    pub qop: Option<Qop>,
    pub cnonce: String,
}

impl AuthorizationHeader {
    /// Compute the answer to `challenge`.
    ///
    /// `cnonce` is the client nonce to bind into the digest; `make_opaque` is only
    /// called when the challenge carries no usable opaque value.
    ///
    /// # Errors
    /// Unsupported algorithm or qop, a challenge without realm (and no override),
    /// or a failure while reading the body for `auth-int`.
    pub fn compute(
        credentials: &Credentials,
        challenge: &Challenge,
        context: &DigestContext<'_>,
        cnonce: &str,
        make_opaque: impl FnOnce() -> String,
    ) -> Result<Self> {
        let realm = match credentials.realm().or(challenge.realm.as_deref()) {
            Some(r) => r.to_owned(),
            None => {
                return Err(Error::MissingRequired(
                    "realm",
                    format!("nonce=\"{}\"", challenge.nonce),
                ))
            }
        };

        let h = challenge.algorithm()?;
        let qop = challenge.qop.selected()?;

        log::trace!("digest algorithm={} qop={:?}", h, qop);

        let ha1 = {
            let a1 = format!(
                "{name}:{realm}:{pw}",
                name = credentials.username,
                realm = realm,
                pw = credentials.password
            );

            if h.is_session() {
                h.hash_str(&format!(
                    "{hash}:{nonce}:{cnonce}",
                    hash = h.hash_str(&a1),
                    nonce = challenge.nonce,
                    cnonce = cnonce
                ))
            } else {
                h.hash_str(&a1)
            }
        };

        let ha2 = match qop {
            Some(Qop::AuthInt) => {
                let mut body_hash = h.sink();
                if let Some(body) = context.body {
                    body.write_to(&mut body_hash)?;
                }
                h.hash_str(&format!(
                    "{method}:{uri}:{bodyhash}",
                    method = context.method,
                    uri = context.uri,
                    bodyhash = body_hash.finish()
                ))
            }
            Some(Qop::Auth) | None => {
                h.hash_str(&format!("{method}:{uri}", method = context.method, uri = context.uri))
            }
        };

        let response = match qop {
            Some(q) => h.hash_str(&format!(
                "{ha1}:{nonce}:{nc}:{cnonce}:{qop}:{ha2}",
                ha1 = ha1,
                nonce = challenge.nonce,
                nc = NONCE_COUNT,
                cnonce = cnonce,
                qop = q,
                ha2 = ha2
            )),
            None => h.hash_str(&format!(
                "{ha1}:{nonce}:{ha2}",
                ha1 = ha1,
                nonce = challenge.nonce,
                ha2 = ha2
            )),
        };

        let opaque = match challenge.echoed_opaque() {
            Some(o) => o.to_owned(),
            None => make_opaque(),
        };

        Ok(AuthorizationHeader {
            username: credentials.username.clone(),
            realm,
            nonce: challenge.nonce.clone(),
            uri: context.uri.to_owned(),
            response,
            algorithm: h,
            opaque,
            qop,
            cnonce: cnonce.to_owned(),
        })
    }

    /// Header fields in the order they are sent
    pub fn directives(&self) -> Vec<(&'static str, String)> {
        let mut d = vec![
            ("username", self.username.clone()),
            ("realm", self.realm.clone()),
            ("nonce", self.nonce.clone()),
            ("uri", self.uri.clone()),
            ("response", self.response.clone()),
        ];

        if let Some(qop) = self.qop {
            d.push(("qop", qop.to_string()));
            d.push(("nc", NONCE_COUNT.to_owned()));
            d.push(("cnonce", self.cnonce.clone()));
        }

        d.push(("algorithm", self.algorithm.to_string()));
        d.push(("opaque", self.opaque.clone()));
        d
    }

    /// Produce a header string (also accessible through the Display trait)
    pub fn to_header_string(&self) -> String {
        let directives = self.directives();
        codec::merge_csl(SCHEME, directives.iter().map(|(n, v)| (*n, v.as_str())))
    }
}

impl Display for AuthorizationHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_string())
    }
}

/// Answers digest challenges for one set of credentials, drawing client nonces
/// (and fallback opaque values) from the given generator.
#[derive(Debug)]
pub struct DigestResponseBuilder<'a> {
    credentials: &'a Credentials,
    nonces: &'a NonceGenerator,
}

impl<'a> DigestResponseBuilder<'a> {
    pub fn new(credentials: &'a Credentials, nonces: &'a NonceGenerator) -> Self {
        Self { credentials, nonces }
    }

    /// Compute the `Authorization` header for `challenge` with a fresh cnonce
    pub fn respond(
        &self,
        challenge: &Challenge,
        context: &DigestContext<'_>,
    ) -> Result<AuthorizationHeader> {
        let cnonce = self.nonces.make_nonce(CNONCE_LEN);
        AuthorizationHeader::compute(self.credentials, challenge, context, &cnonce, || {
            self.nonces.make_nonce(OPAQUE_LEN)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationHeader, Credentials, DigestContext, DigestResponseBuilder};
    use crate::nonce::tests::FixedRng;
    use crate::nonce::NonceGenerator;
    use crate::{codec, Algorithm, Challenge, Error, Qop};
    use http::Method;
    use std::io;
    use std::str::FromStr;

    fn md5(s: &str) -> String {
        Algorithm::Md5.hash_str(s)
    }

    fn no_opaque() -> String {
        panic!("opaque should have been echoed")
    }

    #[test]
    fn test_rfc2069() {
        let src = r#"
    Digest
        realm="testrealm@host.com",
        nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093",
        opaque="5ccc069c403ebaf9f0171e9517f40e41"
    "#;

        let credentials = Credentials::new("Mufasa", "CircleOfLife");
        let context = DigestContext::new(&Method::GET, "/dir/index.html");

        let prompt = Challenge::from_str(src).unwrap();
        let answer =
            AuthorizationHeader::compute(&credentials, &prompt, &context, "ignored", no_opaque)
                .unwrap();

        // The RFC has a wrong hash in the example, see errata
        let str = answer.to_string().replace(", ", ",\n  ");
        assert_eq!(
            str,
            r#"
Digest username="Mufasa",
  realm="testrealm@host.com",
  nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093",
  uri="/dir/index.html",
  response="1949323746fe6a43ef61f9606e7febea",
  algorithm=md5,
  opaque="5ccc069c403ebaf9f0171e9517f40e41"
"#
            .trim()
        );
    }

    #[test]
    fn test_rfc2617() {
        let src = r#"
    Digest
        realm="testrealm@host.com",
        qop="auth,auth-int",
        nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093",
        opaque="5ccc069c403ebaf9f0171e9517f40e41"
    "#;

        let credentials = Credentials::new("Mufasa", "Circle Of Life");
        let context = DigestContext::new(&Method::GET, "/dir/index.html");

        let prompt = Challenge::from_str(src).unwrap();
        let answer =
            AuthorizationHeader::compute(&credentials, &prompt, &context, "0a4f113b", no_opaque)
                .unwrap();

        let str = answer.to_string().replace(", ", ",\n  ");

        assert_eq!(
            str,
            r#"
Digest username="Mufasa",
  realm="testrealm@host.com",
  nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093",
  uri="/dir/index.html",
  response="6629fae49393a05397450978507c4ef1",
  qop=auth,
  nc=00000001,
  cnonce="0a4f113b",
  algorithm=md5,
  opaque="5ccc069c403ebaf9f0171e9517f40e41"
"#
            .trim()
        );
    }

    #[test]
    fn test_plain_ha1() {
        let credentials = Credentials::new("u", "p");
        let context = DigestContext::new(&Method::GET, "/x");
        let prompt = Challenge::parse(r#"Digest realm="r", nonce="n""#).unwrap();

        let answer =
            AuthorizationHeader::compute(&credentials, &prompt, &context, "c", || "o".into())
                .unwrap();
        let again =
            AuthorizationHeader::compute(&credentials, &prompt, &context, "c", || "o".into())
                .unwrap();
        assert_eq!(answer, again);

        let ha1 = md5("u:r:p");
        let ha2 = md5("GET:/x");
        assert_eq!(answer.response, md5(&format!("{}:n:{}", ha1, ha2)));
        assert_eq!(answer.algorithm, Algorithm::Md5);
        assert_eq!(answer.qop, None);

        let header = answer.to_string();
        assert!(!header.contains("qop="));
        assert!(!header.contains("nc="));
        assert!(!header.contains("cnonce="));
        assert!(header.contains("algorithm=md5"));
    }

    #[test]
    fn test_md5_sess() {
        let credentials = Credentials::new("u", "p");
        let context = DigestContext::new(&Method::POST, "/enroll");
        let prompt =
            Challenge::parse(r#"Digest realm="r", nonce="n", qop="auth", algorithm=MD5-sess"#)
                .unwrap();

        let answer =
            AuthorizationHeader::compute(&credentials, &prompt, &context, "cn", || "o".into())
                .unwrap();

        let ha1 = md5(&format!("{}:n:cn", md5("u:r:p")));
        let ha2 = md5("POST:/enroll");
        assert_eq!(
            answer.response,
            md5(&format!("{}:n:00000001:cn:auth:{}", ha1, ha2))
        );
        assert!(answer.to_string().contains("algorithm=md5-sess"));
    }

    #[test]
    fn test_auth_int() {
        let credentials = Credentials::new("u", "p");
        let body = b"csr-bytes".to_vec();
        let context = DigestContext::new(&Method::POST, "/enroll").with_body(&body);
        let prompt = Challenge::parse(r#"Digest realm="r", nonce="n", qop="auth-int,auth""#)
            .unwrap();

        let answer =
            AuthorizationHeader::compute(&credentials, &prompt, &context, "cn", || "o".into())
                .unwrap();

        let ha2 = md5(&format!("POST:/enroll:{}", md5("csr-bytes")));
        assert_eq!(
            answer.response,
            md5(&format!("{}:n:00000001:cn:auth-int:{}", md5("u:r:p"), ha2))
        );
        assert_eq!(answer.qop, Some(Qop::AuthInt));
        assert!(answer.to_string().contains("qop=auth-int, nc=00000001, cnonce=\"cn\""));

        // no body digests as the empty string
        let bare = DigestContext::new(&Method::POST, "/enroll");
        let answer =
            AuthorizationHeader::compute(&credentials, &prompt, &bare, "cn", || "o".into())
                .unwrap();
        let ha2 = md5(&format!("POST:/enroll:{}", md5("")));
        assert_eq!(
            answer.response,
            md5(&format!("{}:n:00000001:cn:auth-int:{}", md5("u:r:p"), ha2))
        );
    }

    #[test]
    fn test_auth_int_body_failure() {
        struct Broken;

        impl crate::Body for Broken {
            fn write_to(&self, _: &mut dyn io::Write) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, "body gone"))
            }
        }

        let credentials = Credentials::new("u", "p");
        let context = DigestContext::new(&Method::POST, "/enroll").with_body(&Broken);
        let prompt = Challenge::parse(r#"Digest realm="r", nonce="n", qop="auth-int""#).unwrap();

        let err = AuthorizationHeader::compute(&credentials, &prompt, &context, "cn", || "o".into())
            .unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_first_qop_wins() {
        let credentials = Credentials::new("u", "p");
        let context = DigestContext::new(&Method::GET, "/");
        let prompt =
            Challenge::parse(r#"Digest realm="r", nonce="n", qop="auth,auth,auth-int""#).unwrap();

        let answer =
            AuthorizationHeader::compute(&credentials, &prompt, &context, "cn", || "o".into())
                .unwrap();
        assert_eq!(answer.qop, Some(Qop::Auth));
        assert_eq!(
            answer.response,
            md5(&format!("{}:n:00000001:cn:auth:{}", md5("u:r:p"), md5("GET:/")))
        );
    }

    #[test]
    fn test_realm_override() {
        let credentials = Credentials::with_realm("mine", "u", "p");
        let context = DigestContext::new(&Method::GET, "/");
        let prompt = Challenge::parse(r#"Digest realm="theirs", nonce="n""#).unwrap();

        let answer =
            AuthorizationHeader::compute(&credentials, &prompt, &context, "cn", || "o".into())
                .unwrap();
        assert_eq!(answer.realm, "mine");
        assert_eq!(
            answer.response,
            md5(&format!("{}:n:{}", md5("u:mine:p"), md5("GET:/")))
        );

        // an override also covers a challenge without realm
        let prompt = Challenge::parse(r#"Digest nonce="n""#).unwrap();
        assert!(
            AuthorizationHeader::compute(&credentials, &prompt, &context, "cn", || "o".into())
                .is_ok()
        );
        assert!(matches!(
            AuthorizationHeader::compute(
                &Credentials::new("u", "p"),
                &prompt,
                &context,
                "cn",
                || "o".into()
            ),
            Err(Error::MissingRequired("realm", _))
        ));
    }

    #[test]
    fn test_rejects_unsupported() {
        let credentials = Credentials::new("u", "p");
        let context = DigestContext::new(&Method::GET, "/");

        let prompt = Challenge::parse(r#"Digest realm="r", nonce="n", algorithm=SHA-256"#).unwrap();
        assert!(matches!(
            AuthorizationHeader::compute(&credentials, &prompt, &context, "cn", || "o".into()),
            Err(Error::UnsupportedAlgorithm(a)) if a == "sha-256"
        ));

        let prompt = Challenge::parse(r#"Digest realm="r", nonce="n", qop="auth-conf""#).unwrap();
        assert!(matches!(
            AuthorizationHeader::compute(&credentials, &prompt, &context, "cn", || "o".into()),
            Err(Error::UnsupportedQop(_))
        ));
    }

    #[test]
    fn test_opaque() {
        let credentials = Credentials::new("u", "p");
        let context = DigestContext::new(&Method::GET, "/");
        let nonces = NonceGenerator::from_entropy();
        let builder = DigestResponseBuilder::new(&credentials, &nonces);

        let prompt = Challenge::parse(r#"Digest realm="r", nonce="n", opaque="""#).unwrap();
        let answer = builder.respond(&prompt, &context).unwrap();
        assert_eq!(answer.opaque.len(), 40);
        assert!(answer.opaque.chars().all(|c| c.is_ascii_hexdigit()));

        let prompt = Challenge::parse(r#"Digest realm="r", nonce="n""#).unwrap();
        assert_eq!(builder.respond(&prompt, &context).unwrap().opaque.len(), 40);

        let prompt = Challenge::parse(r#"Digest realm="r", nonce="n", opaque="srv""#).unwrap();
        assert_eq!(builder.respond(&prompt, &context).unwrap().opaque, "srv");
    }

    #[test]
    fn test_builder_uses_injected_source() {
        let credentials = Credentials::new("user", "pass");
        let nonces = NonceGenerator::new(FixedRng::new(&[0xa5]));
        let context = DigestContext::new(&Method::GET, "/path");
        let prompt =
            Challenge::parse(r#"Digest realm="test", nonce="abc", qop="auth", algorithm="MD5""#)
                .unwrap();

        let answer = DigestResponseBuilder::new(&credentials, &nonces)
            .respond(&prompt, &context)
            .unwrap();

        let cnonce = "a5".repeat(10);
        assert_eq!(answer.cnonce, cnonce);
        assert_eq!(answer.opaque, "a5".repeat(20));
        assert_eq!(
            answer.response,
            md5(&format!(
                "{}:abc:00000001:{}:auth:{}",
                md5("user:test:pass"),
                cnonce,
                md5("GET:/path")
            ))
        );

        // the header round-trips through the directive codec
        let fields = codec::split_csl("Digest", &answer.to_string()).unwrap();
        assert_eq!(fields.get("cnonce"), Some(cnonce.as_str()));
        assert_eq!(fields.get("nc"), Some("00000001"));
        assert_eq!(fields.get("response"), Some(answer.response.as_str()));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let c = Credentials::with_realm("r", "u", "hunter2");
        assert!(!format!("{:?}", c).contains("hunter2"));
    }
}
