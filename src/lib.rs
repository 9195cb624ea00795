//! This crate answers HTTP Digest Auth challenges (RFC 2617, MD5 and MD5-sess) on the
//! client side. It is meant for enrollment-style clients (e.g. EST) that send a request,
//! get a `401` with a `WWW-Authenticate: Digest ...` challenge, and must resend the
//! same request exactly once with an `Authorization` header.
//!
//! [`DigestAuth`] is attached to a [`Request`] with [`Auth::apply_auth`]. The request
//! pipeline ([`Client`]) runs it after the exchange; on a digest challenge it computes
//! the answer, resends the request without the interceptor and returns that response
//! instead. The connection itself is provided by an implementation of [`Transport`].
//!
//! # Examples
//!
//! Computing an answer directly:
//!
//! ```
//! use est_digest_auth::{AuthorizationHeader, Challenge, Credentials, DigestContext};
//! use http::Method;
//!
//! // Value from the WWW-Authenticate HTTP header (usually in a HTTP 401 response)
//! let www_authenticate = r#"Digest realm="http-auth@example.org", qop="auth, auth-int", algorithm=MD5, nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS""#;
//!
//! let credentials = Credentials::new("Mufasa", "Circle of Life");
//! let context = DigestContext::new(&Method::GET, "/dir/index.html");
//!
//! // Parse the prompt header. You can inspect the parsed object, its fields are public.
//! let challenge = Challenge::parse(www_authenticate).unwrap();
//!
//! // For this example we pass a fixed cnonce; `DigestAuth` draws a random one.
//! // The last argument is only called if the server sent no opaque value.
//! let answer = AuthorizationHeader::compute(
//!     &credentials,
//!     &challenge,
//!     &context,
//!     "f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ",
//!     || unreachable!(),
//! )
//! .unwrap();
//!
//! assert_eq!(answer.to_string(), r#"Digest username="Mufasa", realm="http-auth@example.org", nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", uri="/dir/index.html", response="8ca523f5e9506fed4657c9700eebdbec", qop=auth, nc=00000001, cnonce="f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ", algorithm=md5, opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS""#);
//! ```
//!
//! Letting the pipeline answer the challenge:
//!
//! ```no_run
//! use est_digest_auth::{Auth, Client, DigestAuth, Dispatcher, Request, Response, Transport};
//! use url::Url;
//!
//! struct MyTransport;
//!
//! impl Transport for MyTransport {
//!     fn round_trip(&self, request: Request) -> std::io::Result<Response> {
//!         unimplemented!("write the request, read the response")
//!     }
//! }
//!
//! # fn main() -> est_digest_auth::Result<()> {
//! let client = Client::new(MyTransport);
//! let auth = DigestAuth::new("estuser", "estpwd");
//!
//! let url = Url::parse("https://est.example.org/.well-known/est/simpleenroll").unwrap();
//! let request = auth.apply_auth(Request::post(url, b"...csr...".to_vec()));
//!
//! // a 401 Digest challenge is answered inside `send`
//! let response = client.send(request)?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod auth;
mod challenge;
pub mod codec;
mod digest;
mod enums;
mod error;
mod nonce;
mod transport;

pub use error::{Error, Result};

pub use crate::auth::{Auth, DigestAuth};
pub use crate::challenge::{is_digest, Challenge, QopDirectives, SCHEME};
pub use crate::digest::{
    AuthorizationHeader, Credentials, DigestContext, DigestResponseBuilder, NONCE_COUNT,
};
pub use crate::nonce::{NonceGenerator, CNONCE_LEN, OPAQUE_LEN};
pub use crate::transport::{Body, Client, Dispatcher, Interceptor, Request, Response, Transport};

pub use crate::enums::*;

/// Parse the WWW-Authenticate header value.
/// It's just a convenience method to call [`Challenge::parse()`](struct.Challenge.html#method.parse).
pub fn parse(www_authenticate: &str) -> Result<Challenge> {
    Challenge::parse(www_authenticate)
}

#[test]
fn test_parse_respond() {
    let src = r#"
    Digest
       realm="http-auth@example.org",
       qop="auth, auth-int",
       algorithm=MD5,
       nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v",
       opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS"
    "#;

    let credentials = Credentials::new("Mufasa", "Circle of Life");
    let context = DigestContext::new(&http::Method::GET, "/dir/index.html");

    let prompt = crate::parse(src).unwrap();
    let answer = AuthorizationHeader::compute(
        &credentials,
        &prompt,
        &context,
        "f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ",
        || unreachable!(),
    )
    .unwrap();

    let str = answer.to_string().replace(", ", ",\n  ");

    assert_eq!(
        str,
        r#"
Digest username="Mufasa",
  realm="http-auth@example.org",
  nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v",
  uri="/dir/index.html",
  response="8ca523f5e9506fed4657c9700eebdbec",
  qop=auth,
  nc=00000001,
  cnonce="f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ",
  algorithm=md5,
  opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS"
"#
        .trim()
    );
}
