//! Client: resolved configuration plus the hook pipeline around the transport.
//!
//! # Design
//! `Client` is a cheap handle over shared, read-only state. Each call starts
//! with [`Client::new_request`], is filled in through the request setters,
//! and ends in [`Request::execute`], which runs:
//!
//! 1. pre-request hooks: `parse_request_url`, `parse_request_header`,
//!    `create_http_request`;
//! 2. the transport (`Doer::perform`), the only blocking point;
//! 3. body extraction, with gzip inflation when the server compressed it;
//! 4. post-response hooks: `parse_response_body`.
//!
//! A pre-request failure stops before the transport is called. A transport
//! failure skips the post-response hooks but still returns the response.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use flate2::read::GzDecoder;
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH};
use http::HeaderMap;

use crate::codec::{default_request_body_bind, BoundBody};
use crate::doer::{Doer, RawResponse};
use crate::error::{ClientError, ExecuteError};
use crate::hooks::{
    create_http_request, parse_request_header, parse_request_url, parse_response_body,
    AfterResponseFn, BeforeRequestFn,
};
use crate::options::{
    default_response_result_decider, BindRequestBodyFn, ClientConfig, ClientOption,
    ResponseResultDecider,
};
use crate::request::Request;
use crate::response::Response;
use crate::transport::UreqDoer;

/// Shared HTTP client runtime.
///
/// `Clone + Send + Sync`; clones share configuration and transport.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    host_url: String,
    doer: Box<dyn Doer>,
    header: HeaderMap,
    bind_request_body: BindRequestBodyFn,
    response_result_decider: ResponseResultDecider,
    before_request: Vec<BeforeRequestFn>,
    after_response: Vec<AfterResponseFn>,
}

impl Client {
    /// Build a client for `base_url`. `base_url` is applied after `options`,
    /// so it wins over any `with_base_url` among them.
    pub fn new(
        base_url: &str,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self, ClientError> {
        let options = options
            .into_iter()
            .chain(std::iter::once(crate::options::with_base_url(base_url)));
        Self::from_config(ClientConfig::from_options(options))
    }

    /// Fill defaults for everything the options left empty and install the
    /// middleware chain on the transport.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let ClientConfig {
            host_url,
            doer,
            header,
            request_body_bind,
            response_result_decider,
            middlewares,
            transport_options,
        } = config;

        let mut doer: Box<dyn Doer> = match doer {
            Some(doer) => doer,
            None => Box::new(UreqDoer::new(&transport_options)),
        };

        if !middlewares.is_empty() {
            let host = doer.as_middleware_host().ok_or_else(|| {
                ClientError::Config(
                    "transport does not support middleware, choose a transport that does"
                        .to_string(),
                )
            })?;
            host.use_middleware(middlewares);
        }

        let bind_request_body: BindRequestBodyFn = match request_body_bind {
            Some(binder) => binder,
            None => Arc::new(default_request_body_bind),
        };
        let response_result_decider: ResponseResultDecider = match response_result_decider {
            Some(decider) => decider,
            None => Arc::new(default_response_result_decider),
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                host_url: host_url.trim_end_matches('/').to_string(),
                doer,
                header,
                bind_request_body,
                response_result_decider,
                before_request: vec![
                    parse_request_url as BeforeRequestFn,
                    parse_request_header,
                    create_http_request,
                ],
                after_response: vec![parse_response_body as AfterResponseFn],
            }),
        })
    }

    /// Start a new request bound to this client.
    pub fn new_request(&self) -> Request {
        Request::new(self.clone())
    }

    /// Base URL without trailing slash.
    pub fn host_url(&self) -> &str {
        &self.inner.host_url
    }

    pub fn default_header(&self) -> &HeaderMap {
        &self.inner.header
    }

    pub fn bind_request_body(&self, req: &mut Request) -> Result<BoundBody, ClientError> {
        (self.inner.bind_request_body)(self, req)
    }

    pub fn is_error_response(&self, status: u16, raw: &RawResponse) -> bool {
        (self.inner.response_result_decider)(status, raw)
    }

    pub(crate) fn execute(&self, mut req: Request) -> Result<Response, ExecuteError> {
        for hook in &self.inner.before_request {
            hook(self, &mut req)?;
        }

        let mut raw_request = match req.raw_request.take() {
            Some(raw) => raw,
            None => {
                return Err(ClientError::Config(
                    "pre-request hooks produced no transport request".to_string(),
                )
                .into())
            }
        };

        tracing::debug!(method = %req.method, url = %req.url, "sending request");
        let mut raw_response = RawResponse::default();
        let result = self
            .inner
            .doer
            .perform(&req.ctx, &mut raw_request, &mut raw_response);
        req.raw_request = Some(raw_request);

        let mut response = Response::new(req, raw_response);
        if let Err(e) = result {
            tracing::warn!(error = %e, "transport failed");
            return Err(ExecuteError::with_response(e.into(), response));
        }

        let body = decode_body(&response.raw_response)?;
        response.set_body(body);
        tracing::debug!(
            status = response.status_code(),
            size = response.size(),
            "received response"
        );

        for hook in &self.inner.after_response {
            if let Err(e) = hook(self, &mut response) {
                return Err(ExecuteError::with_response(e, response));
            }
        }
        Ok(response)
    }
}

/// Copy the body out of `raw`, inflating it when it is gzip-encoded with a
/// non-zero length.
fn decode_body(raw: &RawResponse) -> Result<Vec<u8>, ClientError> {
    let headers = raw.headers();
    let gzipped = headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"));
    let empty = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        == Some(0);

    if !gzipped || empty {
        return Ok(raw.body().clone());
    }

    tracing::debug!(compressed = raw.body().len(), "gunzipping response body");
    let mut body = Vec::new();
    GzDecoder::new(raw.body().as_slice())
        .read_to_end(&mut body)
        .map_err(ClientError::Gunzip)?;
    Ok(body)
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host_url", &self.inner.host_url)
            .field("header", &self.inner.header)
            .finish_non_exhaustive()
    }
}
