use crate::challenge::{self, Challenge};
use crate::digest::{Credentials, DigestContext, DigestResponseBuilder};
use crate::nonce::NonceGenerator;
use crate::transport::{Dispatcher, Interceptor, Request, Response};
use crate::{Error, Result};
use std::sync::Arc;

use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use http::StatusCode;

/// Client authentication scheme
pub trait Auth {
    /// Prepare `request` for sending: add credentials up front, or attach an
    /// interceptor that answers the server's challenge.
    fn apply_auth(&self, request: Request) -> Request;
}

/// HTTP Digest authentication.
///
/// Attached to a request, it watches for a `401` with a Digest challenge and
/// answers it by sending the request once more with an `Authorization` header.
/// The retry carries no interceptor, so a second `401` goes back to the caller.
///
/// Cheap to clone; clones share the credentials and nonce generator.
#[derive(Debug, Clone)]
pub struct DigestAuth {
    credentials: Arc<Credentials>,
    nonces: Arc<NonceGenerator>,
}

impl DigestAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::from_credentials(Credentials::new(username, password))
    }

    /// Like [`DigestAuth::new`], but `realm` overrides the realm the server announces
    pub fn with_realm(
        realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::from_credentials(Credentials::with_realm(realm, username, password))
    }

    pub fn from_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
            nonces: Arc::new(NonceGenerator::from_entropy()),
        }
    }

    /// Use `nonces` instead of the entropy-seeded default
    pub fn with_nonce_generator(mut self, nonces: NonceGenerator) -> Self {
        self.nonces = Arc::new(nonces);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Answer the challenge in `response` and return the response to the retry.
    ///
    /// `response` is closed before anything else happens.
    ///
    /// # Errors
    /// `InvalidUrl` if the request URL has no path, `UnsupportedAlgorithm` /
    /// `UnsupportedQop` for challenges this client cannot answer, and whatever the
    /// dispatcher fails with.
    pub fn handle_challenge(
        &self,
        dispatcher: &dyn Dispatcher,
        mut response: Response,
    ) -> Result<Response> {
        response.close();

        let header = response
            .header(&WWW_AUTHENTICATE)
            .ok_or(Error::MissingChallenge)?
            .to_owned();
        let request = response.into_request();

        let challenge = Challenge::parse(&header)?;
        let uri = request.path()?;

        let mut context = DigestContext::new(request.method(), &uri);
        if let Some(body) = request.body() {
            context = context.with_body(body);
        }

        let answer = DigestResponseBuilder::new(&self.credentials, &self.nonces)
            .respond(&challenge, &context)
            .map_err(|e| {
                if matches!(e, Error::UnsupportedAlgorithm(_) | Error::UnsupportedQop(_)) {
                    log::warn!("cannot answer digest challenge for {}: {}", request.url(), e);
                }
                e
            })?;

        let mut retry = request.with_interceptor(None);
        retry.set_header(AUTHORIZATION, &answer.to_header_string())?;

        log::debug!("retrying {} {} with digest credentials", retry.method(), retry.url());
        dispatcher.send(retry)
    }
}

impl Auth for DigestAuth {
    fn apply_auth(&self, request: Request) -> Request {
        request.with_interceptor(Some(Arc::new(self.clone())))
    }
}

impl Interceptor for DigestAuth {
    fn intercept(&self, dispatcher: &dyn Dispatcher, response: Response) -> Result<Response> {
        let challenged = response.status() == StatusCode::UNAUTHORIZED
            && response
                .header(&WWW_AUTHENTICATE)
                .map_or(false, challenge::is_digest);

        if !challenged {
            return Ok(response);
        }

        log::debug!("digest challenge from {}", response.request().url());
        self.handle_challenge(dispatcher, response)
    }
}
