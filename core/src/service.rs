//! Typed client for the `life` service.
//!
//! Every method sends `POST /life/clientN` with `q1`/`q2` in the query,
//! `h1`/`h2` as headers and the whole `Req` as the JSON body, and decodes
//! the reply into a `Resp`.

use http::Method;

use crate::client::Client;
use crate::codec::Body;
use crate::context::Context;
use crate::doer::RequestOption;
use crate::error::{ClientError, ExecuteError};
use crate::options::ClientOption;
use crate::param::dereference_value;
use crate::response::Response;
use crate::types::{Req, Resp};

/// Address of a locally running `life` service.
pub const DEFAULT_HOST_URL: &str = "http://127.0.0.1:8899";

pub trait LifeClient: Send + Sync {
    fn biz_method2(
        &self,
        ctx: &Context,
        req: &Req,
        options: Vec<RequestOption>,
    ) -> Result<(Resp, Response), ExecuteError>;

    fn biz_method3(
        &self,
        ctx: &Context,
        req: &Req,
        options: Vec<RequestOption>,
    ) -> Result<(Resp, Response), ExecuteError>;

    fn biz_method4(
        &self,
        ctx: &Context,
        req: &Req,
        options: Vec<RequestOption>,
    ) -> Result<(Resp, Response), ExecuteError>;
}

/// [`LifeClient`] over the generic runtime client.
#[derive(Debug, Clone)]
pub struct IdlClient {
    client: Client,
}

struct Call<'a> {
    url: &'static str,
    query: [(&'static str, Option<String>); 2],
    path: [(&'static str, Option<&'a String>); 2],
}

impl IdlClient {
    pub fn new(
        host_url: &str,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::new(host_url, options)?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn call(
        &self,
        ctx: &Context,
        req: &Req,
        options: Vec<RequestOption>,
        call: Call<'_>,
    ) -> Result<(Resp, Response), ExecuteError> {
        let path = call
            .path
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v.clone())));

        let mut response = self
            .client
            .new_request()
            .set_context(ctx.clone())
            .set_query_params(call.query)
            .set_path_params(path)
            .set_body_param(Body::record(req.clone()))
            .set_headers([
                ("h1", req.header_string.clone()),
                ("h2", req.mix_string.clone()),
            ])
            .set_request_options(options)
            .set_result::<Resp>()
            .execute(Method::POST, call.url)?;

        let resp = response.take_result::<Resp>().unwrap_or_default();
        Ok((resp, response))
    }
}

impl LifeClient for IdlClient {
    fn biz_method2(
        &self,
        ctx: &Context,
        req: &Req,
        options: Vec<RequestOption>,
    ) -> Result<(Resp, Response), ExecuteError> {
        self.call(
            ctx,
            req,
            options,
            Call {
                url: "/life/client1",
                query: [
                    ("q1", dereference_value(&req.query_string)),
                    ("q2", dereference_value(&req.mix_string)),
                ],
                path: [
                    ("p1", req.query_string.as_ref()),
                    ("p2", req.mix_string.as_ref()),
                ],
            },
        )
    }

    fn biz_method3(
        &self,
        ctx: &Context,
        req: &Req,
        options: Vec<RequestOption>,
    ) -> Result<(Resp, Response), ExecuteError> {
        self.call(
            ctx,
            req,
            options,
            Call {
                url: "/life/client2",
                query: [
                    ("q1", req.query_string.clone()),
                    ("q2", req.mix_string.clone()),
                ],
                path: [
                    ("p1", req.path_string.as_ref()),
                    ("p2", req.mix_string.as_ref()),
                ],
            },
        )
    }

    fn biz_method4(
        &self,
        ctx: &Context,
        req: &Req,
        options: Vec<RequestOption>,
    ) -> Result<(Resp, Response), ExecuteError> {
        self.call(
            ctx,
            req,
            options,
            Call {
                url: "/life/client3",
                query: [
                    ("q1", dereference_value(&req.query_string)),
                    ("q2", req.mix_string.clone()),
                ],
                path: [
                    ("p1", req.path_string.as_ref()),
                    ("p2", req.mix_string.as_ref()),
                ],
            },
        )
    }
}
