//! Transport contract: the doer, its middleware chain, and transport options.
//!
//! # Design
//! The client never performs I/O itself. It assembles a raw
//! `http::Request<Vec<u8>>`, hands it to a [`Doer`] together with an empty
//! `http::Response<Vec<u8>>`, and reads whatever the doer filled in. Any type
//! that can perform a round trip can be plugged in; [`UreqDoer`] is the
//! default.
//!
//! Middleware is a separate capability: a doer that can host a middleware
//! chain exposes it through [`Doer::as_middleware_host`]. Asking for
//! middleware on a doer that cannot host it is a configuration error at
//! client construction.
//!
//! [`UreqDoer`]: crate::transport::UreqDoer

use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::error::TransportError;

/// Request handed to the transport.
pub type RawRequest = http::Request<Vec<u8>>;

/// Response filled in by the transport.
pub type RawResponse = http::Response<Vec<u8>>;

/// Performs one HTTP round trip.
///
/// Implementations fill `resp` and return `Ok(())`, or return an error. On
/// error `resp` may be partially filled; the client still hands it back to
/// the caller.
pub trait Doer: Send + Sync {
    fn perform(
        &self,
        ctx: &Context,
        req: &mut RawRequest,
        resp: &mut RawResponse,
    ) -> Result<(), TransportError>;

    /// Middleware capability, if this doer can host a chain.
    fn as_middleware_host(&mut self) -> Option<&mut dyn MiddlewareHost> {
        None
    }
}

/// A doer that can wrap its round trip in a middleware chain.
pub trait MiddlewareHost {
    /// Append `middlewares` to the chain. Called once, at client construction.
    fn use_middleware(&mut self, middlewares: Vec<Arc<dyn Middleware>>);
}

/// Wraps a round trip; call `next.run(..)` to continue down the chain.
pub trait Middleware: Send + Sync {
    fn handle(
        &self,
        ctx: &Context,
        req: &mut RawRequest,
        resp: &mut RawResponse,
        next: Next<'_>,
    ) -> Result<(), TransportError>;
}

type Endpoint<'a> =
    dyn Fn(&Context, &mut RawRequest, &mut RawResponse) -> Result<(), TransportError> + Sync + 'a;

/// The remainder of a middleware chain followed by the real round trip.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    endpoint: &'a Endpoint<'a>,
}

impl<'a> Next<'a> {
    pub fn new(middlewares: &'a [Arc<dyn Middleware>], endpoint: &'a Endpoint<'a>) -> Self {
        Self {
            middlewares,
            endpoint,
        }
    }

    pub fn run(
        self,
        ctx: &Context,
        req: &mut RawRequest,
        resp: &mut RawResponse,
    ) -> Result<(), TransportError> {
        match self.middlewares.split_first() {
            Some((first, rest)) => first.handle(ctx, req, resp, Next::new(rest, self.endpoint)),
            None => (self.endpoint)(ctx, req, resp),
        }
    }
}

/// Doer built from a closure. See [`doer_fn`].
pub struct DoerFn<F>(F);

/// Turn a closure into a [`Doer`].
///
/// ```ignore
/// let doer = doer_fn(|_ctx: &Context, _req: &mut RawRequest, resp: &mut RawResponse| {
///     *resp.status_mut() = http::StatusCode::NO_CONTENT;
///     Ok(())
/// });
/// ```
pub fn doer_fn<F>(f: F) -> DoerFn<F>
where
    F: Fn(&Context, &mut RawRequest, &mut RawResponse) -> Result<(), TransportError>
        + Send
        + Sync,
{
    DoerFn(f)
}

impl<F> Doer for DoerFn<F>
where
    F: Fn(&Context, &mut RawRequest, &mut RawResponse) -> Result<(), TransportError>
        + Send
        + Sync,
{
    fn perform(
        &self,
        ctx: &Context,
        req: &mut RawRequest,
        resp: &mut RawResponse,
    ) -> Result<(), TransportError> {
        (self.0)(ctx, req, resp)
    }
}

/// Middleware built from a closure. See [`middleware_fn`].
pub struct MiddlewareFn<F>(F);

pub fn middleware_fn<F>(f: F) -> MiddlewareFn<F>
where
    F: Fn(&Context, &mut RawRequest, &mut RawResponse, Next<'_>) -> Result<(), TransportError>
        + Send
        + Sync,
{
    MiddlewareFn(f)
}

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(&Context, &mut RawRequest, &mut RawResponse, Next<'_>) -> Result<(), TransportError>
        + Send
        + Sync,
{
    fn handle(
        &self,
        ctx: &Context,
        req: &mut RawRequest,
        resp: &mut RawResponse,
        next: Next<'_>,
    ) -> Result<(), TransportError> {
        (self.0)(ctx, req, resp, next)
    }
}

/// Options for the default transport, forwarded at client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOption {
    /// Upper bound for a whole round trip.
    Timeout(Duration),
    ConnectTimeout(Duration),
    MaxRedirects(u32),
    UserAgent(String),
    /// `false` disables connection reuse.
    KeepAlive(bool),
}

/// Per-request transport options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    Timeout(Duration),
    ConnectTimeout(Duration),
    /// Free-form metadata for middleware.
    Tag(String, String),
}

/// Per-request options as stored in the raw request's extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub tags: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn apply(&mut self, option: &RequestOption) {
        match option {
            RequestOption::Timeout(d) => self.timeout = Some(*d),
            RequestOption::ConnectTimeout(d) => self.connect_timeout = Some(*d),
            RequestOption::Tag(k, v) => self.tags.push((k.clone(), v.clone())),
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// `Host` override recorded on the raw request's extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOverride(pub String);
