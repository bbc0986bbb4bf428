//! Typed HTTP client runtime and the `life` service client built on it.
//!
//! # Overview
//! A [`Client`] holds a base URL, default headers, a body binder, a result
//! decider and a transport ([`Doer`]). Each call builds a [`Request`]
//! fluently and executes it through a fixed hook pipeline: URL resolution,
//! header merge, raw request construction, transport round trip, gzip
//! inflation and body decoding into typed receptors.
//!
//! # Design
//! - The transport is a trait object. [`UreqDoer`] is the default and hosts a
//!   middleware chain; tests plug in closures through [`doer_fn`].
//! - Decoded payloads live in the request's receptors and are read back with
//!   [`Response::result`] / [`Response::error`].
//! - Failures after the round trip carry the response in [`ExecuteError`].
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod codec;
pub mod context;
pub mod doer;
pub mod error;
pub mod hooks;
pub mod options;
pub mod param;
pub mod request;
pub mod response;
pub mod service;
pub mod sniff;
pub mod transport;
pub mod types;

pub use crate::client::Client;
pub use crate::codec::{Body, BoundBody, Encode, Shape};
pub use crate::context::Context;
pub use crate::doer::{
    doer_fn, middleware_fn, Doer, Middleware, MiddlewareHost, Next, RawRequest, RawResponse,
    RequestOption, RequestOptions, TransportOption,
};
pub use crate::error::{ClientError, ExecuteError, TransportError};
pub use crate::options::{
    with_base_url, with_body_binder, with_header, with_middleware, with_response_result_decider,
    with_transport, with_transport_options, ClientConfig, ClientOption,
};
pub use crate::param::{dereference_value, ParamValues, QueryValues, ToParam};
pub use crate::request::Request;
pub use crate::response::Response;
pub use crate::service::{IdlClient, LifeClient, DEFAULT_HOST_URL};
pub use crate::transport::UreqDoer;
pub use crate::types::{Req, Resp};
