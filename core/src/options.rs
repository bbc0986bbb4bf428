//! Client options.
//!
//! A [`ClientConfig`] starts blank and is filled by applying
//! [`ClientOption`]s in order; later options overwrite earlier ones, except
//! middleware and transport options which accumulate. Fields still empty at
//! construction get their defaults from [`Client::from_config`].
//!
//! [`Client::from_config`]: crate::client::Client::from_config

use std::fmt;
use std::sync::Arc;

use http::HeaderMap;

use crate::client::Client;
use crate::codec::BoundBody;
use crate::doer::{Doer, Middleware, RawResponse, TransportOption};
use crate::error::ClientError;
use crate::request::Request;

/// Decides whether a response status is an error.
pub type ResponseResultDecider = Arc<dyn Fn(u16, &RawResponse) -> bool + Send + Sync>;

/// Converts the request body into a content type and payload.
pub type BindRequestBodyFn =
    Arc<dyn Fn(&Client, &mut Request) -> Result<BoundBody, ClientError> + Send + Sync>;

/// Statuses above 399 are errors.
pub fn default_response_result_decider(status: u16, _raw: &RawResponse) -> bool {
    status > 399
}

/// Configuration assembled from options, consumed by client construction.
#[derive(Default)]
pub struct ClientConfig {
    pub(crate) host_url: String,
    pub(crate) doer: Option<Box<dyn Doer>>,
    pub(crate) header: HeaderMap,
    pub(crate) request_body_bind: Option<BindRequestBodyFn>,
    pub(crate) response_result_decider: Option<ResponseResultDecider>,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    pub(crate) transport_options: Vec<TransportOption>,
}

impl ClientConfig {
    pub fn from_options(options: impl IntoIterator<Item = ClientOption>) -> Self {
        let mut config = Self::default();
        for option in options {
            option.apply(&mut config);
        }
        config
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    pub fn header(&self) -> &HeaderMap {
        &self.header
    }

    pub fn transport_options(&self) -> &[TransportOption] {
        &self.transport_options
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host_url", &self.host_url)
            .field("header", &self.header)
            .field("custom_doer", &self.doer.is_some())
            .field("custom_binder", &self.request_body_bind.is_some())
            .field("custom_decider", &self.response_result_decider.is_some())
            .field("middlewares", &self.middlewares.len())
            .field("transport_options", &self.transport_options)
            .finish()
    }
}

/// One configuration step.
pub struct ClientOption(Box<dyn FnOnce(&mut ClientConfig) + Send>);

impl ClientOption {
    pub fn new(f: impl FnOnce(&mut ClientConfig) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    fn apply(self, config: &mut ClientConfig) {
        (self.0)(config);
    }
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientOption(..)")
    }
}

/// Absolute URL prepended to relative request URLs.
pub fn with_base_url(url: impl Into<String>) -> ClientOption {
    let url = url.into();
    ClientOption::new(move |c| c.host_url = url)
}

/// Options for the default transport. Ignored when a transport is injected.
pub fn with_transport_options(options: impl IntoIterator<Item = TransportOption>) -> ClientOption {
    let options: Vec<_> = options.into_iter().collect();
    ClientOption::new(move |c| c.transport_options.extend(options))
}

/// Append a middleware. The transport must be a middleware host.
pub fn with_middleware(middleware: impl Middleware + 'static) -> ClientOption {
    let middleware: Arc<dyn Middleware> = Arc::new(middleware);
    ClientOption::new(move |c| c.middlewares.push(middleware))
}

/// Use `doer` instead of the default transport.
pub fn with_transport(doer: impl Doer + 'static) -> ClientOption {
    let doer: Box<dyn Doer> = Box::new(doer);
    ClientOption::new(move |c| c.doer = Some(doer))
}

/// Headers sent with every request unless the request sets the same name.
pub fn with_header(header: HeaderMap) -> ClientOption {
    ClientOption::new(move |c| c.header = header)
}

pub fn with_response_result_decider(
    decider: impl Fn(u16, &RawResponse) -> bool + Send + Sync + 'static,
) -> ClientOption {
    let decider: ResponseResultDecider = Arc::new(decider);
    ClientOption::new(move |c| c.response_result_decider = Some(decider))
}

pub fn with_body_binder(
    binder: impl Fn(&Client, &mut Request) -> Result<BoundBody, ClientError> + Send + Sync + 'static,
) -> ClientOption {
    let binder: BindRequestBodyFn = Arc::new(binder);
    ClientOption::new(move |c| c.request_body_bind = Some(binder))
}
