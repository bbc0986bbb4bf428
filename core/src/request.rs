//! Per-call request builder.

use std::collections::HashMap;
use std::fmt;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::codec::{Body, Receptor, Slot};
use crate::context::Context;
use crate::doer::{RawRequest, RequestOption};
use crate::error::{ClientError, ExecuteError};
use crate::param::{ParamValues, QueryValues, ToParam};
use crate::response::Response;

/// A single request, built fluently and consumed by [`execute`](Request::execute).
///
/// Created by [`Client::new_request`]. Setters take and return `self`.
/// Header names or values that fail validation are remembered and reported
/// by `execute` before anything is sent.
#[must_use = "Request does nothing until .execute() is called"]
pub struct Request {
    pub(crate) url: String,
    pub(crate) method: Method,
    pub(crate) query_param: QueryValues,
    pub(crate) header: HeaderMap,
    pub(crate) request_options: Vec<RequestOption>,
    pub(crate) body_param: Option<Body>,
    pub(crate) raw_request: Option<RawRequest>,
    pub(crate) ctx: Context,
    pub(crate) path_params: HashMap<String, String>,
    pub(crate) result: Option<Box<dyn Receptor>>,
    pub(crate) error: Option<Box<dyn Receptor>>,
    client: Client,
    build_error: Option<ClientError>,
}

impl Request {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            url: String::new(),
            method: Method::GET,
            query_param: QueryValues::new(),
            header: HeaderMap::new(),
            request_options: Vec::new(),
            body_param: None,
            raw_request: None,
            ctx: Context::background(),
            path_params: HashMap::new(),
            result: None,
            error: None,
            client,
            build_error: None,
        }
    }

    pub fn set_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Set `header`, replacing earlier values. Sequences set one value per
    /// element; absent values leave the header untouched.
    pub fn set_header(mut self, header: &str, value: impl ToParam) -> Self {
        if self.build_error.is_some() {
            return self;
        }
        if let Err(e) = self.try_set_header(header, value.to_param()) {
            self.build_error = Some(e);
        }
        self
    }

    fn try_set_header(&mut self, header: &str, value: ParamValues) -> Result<(), ClientError> {
        let values = match value {
            ParamValues::Absent => return Ok(()),
            ParamValues::One(v) => vec![v],
            ParamValues::Many(vs) => vs,
        };
        let name = HeaderName::try_from(header)?;
        let values = values
            .iter()
            .map(|v| HeaderValue::try_from(v.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        self.header.remove(&name);
        for value in values {
            self.header.append(name.clone(), value);
        }
        Ok(())
    }

    pub fn set_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToParam,
    {
        for (k, v) in headers {
            self = self.set_header(k.as_ref(), v);
        }
        self
    }

    /// Set query `param`. A sequence adds every element under `param`; any
    /// other value replaces what was there; absent values are skipped.
    pub fn set_query_param(mut self, param: &str, value: impl ToParam) -> Self {
        match value.to_param() {
            ParamValues::Absent => {}
            ParamValues::One(v) => self.query_param.set(param, v),
            ParamValues::Many(vs) => {
                for v in vs {
                    self.query_param.add(param, v);
                }
            }
        }
        self
    }

    pub fn set_query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToParam,
    {
        for (k, v) in params {
            self = self.set_query_param(k.as_ref(), v);
        }
        self
    }

    /// Value substituted for `:param` in the URL template.
    pub fn set_path_param(mut self, param: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(param.into(), value.into());
        self
    }

    pub fn set_path_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.path_params.insert(k.into(), v.into());
        }
        self
    }

    pub fn set_body_param(mut self, body: impl Into<Body>) -> Self {
        self.body_param = Some(body.into());
        self
    }

    /// Decode successful responses into a `T`, readable afterwards through
    /// [`Response::result`].
    pub fn set_result<T: DeserializeOwned + Send + Sync + 'static>(mut self) -> Self {
        self.result = Some(Box::new(Slot::<T>::new()));
        self
    }

    /// Decode error responses into an `E`, readable afterwards through
    /// [`Response::error`].
    pub fn set_error<E: DeserializeOwned + Send + Sync + 'static>(mut self) -> Self {
        self.error = Some(Box::new(Slot::<E>::new()));
        self
    }

    pub fn set_request_option(mut self, option: RequestOption) -> Self {
        self.request_options.push(option);
        self
    }

    pub fn set_request_options(mut self, options: impl IntoIterator<Item = RequestOption>) -> Self {
        self.request_options.extend(options);
        self
    }

    /// Record method and URL template, then run the client pipeline.
    pub fn execute(mut self, method: Method, url: &str) -> Result<Response, ExecuteError> {
        if let Some(e) = self.build_error.take() {
            return Err(e.into());
        }
        self.method = method;
        self.url = url.to_owned();
        let client = self.client.clone();
        client.execute(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URL template before the pipeline runs, resolved URL afterwards.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn header(&self) -> &HeaderMap {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderMap {
        &mut self.header
    }

    pub fn query_params(&self) -> &QueryValues {
        &self.query_param
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    pub fn body_param(&self) -> Option<&Body> {
        self.body_param.as_ref()
    }

    pub fn request_options(&self) -> &[RequestOption] {
        &self.request_options
    }

    /// Transport request, available once the pre-request hooks have run.
    pub fn raw_request(&self) -> Option<&RawRequest> {
        self.raw_request.as_ref()
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query_param)
            .field("header", &self.header)
            .field("path_params", &self.path_params)
            .field("body", &self.body_param)
            .field("result", &self.result.as_ref().map(|r| r.type_name()))
            .field("error", &self.error.as_ref().map(|r| r.type_name()))
            .finish_non_exhaustive()
    }
}
