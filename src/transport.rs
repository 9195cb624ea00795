//! The slice of an HTTP client the authenticator needs: a cloneable request,
//! a response that owns its connection, and a pipeline that runs a response
//! interceptor after the exchange.

use crate::{Error, Result};
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use url::Url;

/// Request payload that can be written out more than once (sent, then digested
/// for `auth-int`, then sent again).
pub trait Body: Send + Sync {
    fn write_to(&self, sink: &mut dyn io::Write) -> io::Result<()>;
}

impl Body for Vec<u8> {
    fn write_to(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        sink.write_all(self)
    }
}

impl Body for String {
    fn write_to(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        sink.write_all(self.as_bytes())
    }
}

impl Body for &'static [u8] {
    fn write_to(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        sink.write_all(self)
    }
}

impl Body for &'static str {
    fn write_to(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        sink.write_all(self.as_bytes())
    }
}

/// Post-response hook attached to a request.
///
/// Called by the pipeline with the response to the request it was attached to;
/// whatever it returns becomes the caller's response.
pub trait Interceptor: Send + Sync {
    fn intercept(&self, dispatcher: &dyn Dispatcher, response: Response) -> Result<Response>;
}

/// Sends a request through the full pipeline, interceptor included
pub trait Dispatcher {
    fn send(&self, request: Request) -> Result<Response>;
}

/// One request/response exchange over the wire. Connection handling, TLS and
/// timeouts live behind this trait.
pub trait Transport {
    fn round_trip(&self, request: Request) -> io::Result<Response>;
}

#[derive(Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Arc<dyn Body>>,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            interceptor: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url, body: impl Body + 'static) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_body(mut self, body: impl Body + 'static) -> Self {
        self.body = Some(Arc::new(body));
        self
    }

    /// Copy of this request with `interceptor` attached (or removed, for `None`)
    pub fn with_interceptor(&self, interceptor: Option<Arc<dyn Interceptor>>) -> Self {
        Self {
            interceptor,
            ..self.clone()
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Path component of the target URL, as used for the digest `uri`
    ///
    /// # Errors
    /// `InvalidUrl` if the URL has no hierarchical path (e.g. `data:` URLs)
    pub fn path(&self) -> Result<String> {
        if self.url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(self.url.to_string()));
        }
        Ok(self.url.path().to_owned())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<()> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(())
    }

    pub fn body(&self) -> Option<&dyn Body> {
        self.body.as_deref()
    }

    /// Stream the body (if any) into `sink`
    pub fn write_body(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        match &self.body {
            Some(body) => body.write_to(sink),
            None => Ok(()),
        }
    }

    pub fn interceptor(&self) -> Option<&Arc<dyn Interceptor>> {
        self.interceptor.as_ref()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .field("intercepted", &self.interceptor.is_some())
            .finish()
    }
}

/// Response together with the request that produced it and the live
/// connection its body is read from.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    request: Request,
    source: Option<Box<dyn Read + Send>>,
}

impl Response {
    pub fn new(
        request: Request,
        status: StatusCode,
        headers: HeaderMap,
        source: Box<dyn Read + Send>,
    ) -> Self {
        Self {
            status,
            headers,
            request,
            source: Some(source),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The request this is the response to
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    /// Body reader, `None` once the response is closed
    pub fn body(&mut self) -> Option<&mut (dyn Read + Send + 'static)> {
        self.source.as_deref_mut()
    }

    /// Release the connection. Idempotent.
    pub fn close(&mut self) {
        self.source = None;
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("request", &self.request)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Request pipeline: run the exchange, then hand the response to the request's
/// interceptor, if it has one.
#[derive(Debug)]
pub struct Client<T> {
    transport: T,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Dispatcher for Client<T> {
    fn send(&self, request: Request) -> Result<Response> {
        let interceptor = request.interceptor().cloned();
        let response = self.transport.round_trip(request)?;

        match interceptor {
            Some(interceptor) => interceptor.intercept(self, response),
            None => Ok(response),
        }
    }
}
