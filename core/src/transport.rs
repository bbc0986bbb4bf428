//! Default transport backed by a blocking `ureq` agent.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use http::header::HOST;
use http::HeaderValue;
use ureq::Agent;

use crate::codec::is_payload_supported;
use crate::context::Context;
use crate::doer::{
    Doer, HostOverride, Middleware, MiddlewareHost, Next, RawRequest, RawResponse,
    RequestOptions, TransportOption,
};
use crate::error::TransportError;

const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Agent settings folded from [`TransportOption`]s; the last option of each
/// kind wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub max_redirects: u32,
    pub user_agent: Option<String>,
    pub keep_alive: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: None,
            keep_alive: true,
        }
    }
}

impl TransportSettings {
    pub fn from_options(options: &[TransportOption]) -> Self {
        let mut settings = Self::default();
        for option in options {
            match option {
                TransportOption::Timeout(d) => settings.timeout = Some(*d),
                TransportOption::ConnectTimeout(d) => settings.connect_timeout = Some(*d),
                TransportOption::MaxRedirects(n) => settings.max_redirects = *n,
                TransportOption::UserAgent(ua) => settings.user_agent = Some(ua.clone()),
                TransportOption::KeepAlive(on) => settings.keep_alive = *on,
            }
        }
        settings
    }

    fn agent(&self) -> Agent {
        let mut builder = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(self.timeout)
            .timeout_connect(self.connect_timeout)
            .max_redirects(self.max_redirects);
        if let Some(ua) = &self.user_agent {
            builder = builder.user_agent(ua.as_str());
        }
        if !self.keep_alive {
            builder = builder
                .max_idle_connections(0)
                .max_idle_connections_per_host(0);
        }
        builder.build().new_agent()
    }
}

/// Blocking HTTP transport with a middleware chain.
///
/// Cancellation and deadlines are checked before the round trip starts; the
/// remaining deadline also caps the agent timeout, so an in-flight call ends
/// no later than the context does.
pub struct UreqDoer {
    agent: Agent,
    settings: TransportSettings,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl UreqDoer {
    pub fn new(options: &[TransportOption]) -> Self {
        let settings = TransportSettings::from_options(options);
        Self {
            agent: settings.agent(),
            settings,
            middlewares: Vec::new(),
        }
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    fn round_trip(
        &self,
        ctx: &Context,
        req: &mut RawRequest,
        resp: &mut RawResponse,
    ) -> Result<(), TransportError> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        if ctx.is_expired() {
            return Err(TransportError::DeadlineExceeded);
        }

        let options = req
            .extensions()
            .get::<RequestOptions>()
            .cloned()
            .unwrap_or_default();
        let timeout = match (options.timeout, ctx.remaining()) {
            (Some(t), Some(r)) => Some(t.min(r)),
            (t, r) => t.or(r),
        };

        let mut builder = http::Request::builder()
            .method(req.method().clone())
            .uri(req.uri().clone())
            .version(req.version());
        for (name, value) in req.headers() {
            builder = builder.header(name, value);
        }
        if let Some(HostOverride(host)) = req.extensions().get::<HostOverride>() {
            let value = HeaderValue::try_from(host.as_str())
                .map_err(|e| TransportError::Failed(Box::new(e)))?;
            if let Some(headers) = builder.headers_mut() {
                headers.insert(HOST, value);
            }
        }

        tracing::debug!(method = %req.method(), uri = %req.uri(), ?timeout, "ureq round trip");
        let result = if req.body().is_empty() && !is_payload_supported(req.method()) {
            let request = builder
                .body(())
                .map_err(|e| TransportError::Failed(Box::new(e)))?;
            self.send(request, timeout, options.connect_timeout)
        } else {
            let request = builder
                .body(req.body().as_slice())
                .map_err(|e| TransportError::Failed(Box::new(e)))?;
            self.send(request, timeout, options.connect_timeout)
        };

        let mut response = result.map_err(|e| {
            if ctx.is_cancelled() {
                TransportError::Cancelled
            } else {
                TransportError::from(e)
            }
        })?;

        *resp.status_mut() = response.status();
        *resp.version_mut() = response.version();
        *resp.headers_mut() = response.headers().clone();

        let mut body = Vec::new();
        response
            .body_mut()
            .as_reader()
            .read_to_end(&mut body)
            .map_err(|e| TransportError::Failed(Box::new(e)))?;
        *resp.body_mut() = body;

        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        Ok(())
    }

    fn send<S: ureq::AsSendBody>(
        &self,
        request: http::Request<S>,
        timeout: Option<Duration>,
        connect_timeout: Option<Duration>,
    ) -> Result<http::Response<ureq::Body>, ureq::Error> {
        if timeout.is_none() && connect_timeout.is_none() {
            return self.agent.run(request);
        }
        let mut config = self.agent.configure_request(request);
        if timeout.is_some() {
            config = config.timeout_global(timeout);
        }
        if connect_timeout.is_some() {
            config = config.timeout_connect(connect_timeout);
        }
        self.agent.run(config.build())
    }
}

impl Doer for UreqDoer {
    fn perform(
        &self,
        ctx: &Context,
        req: &mut RawRequest,
        resp: &mut RawResponse,
    ) -> Result<(), TransportError> {
        let endpoint = |ctx: &Context, req: &mut RawRequest, resp: &mut RawResponse| {
            self.round_trip(ctx, req, resp)
        };
        Next::new(&self.middlewares, &endpoint).run(ctx, req, resp)
    }

    fn as_middleware_host(&mut self) -> Option<&mut dyn MiddlewareHost> {
        Some(self)
    }
}

impl MiddlewareHost for UreqDoer {
    fn use_middleware(&mut self, middlewares: Vec<Arc<dyn Middleware>>) {
        self.middlewares.extend(middlewares);
    }
}

impl std::fmt::Debug for UreqDoer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqDoer")
            .field("settings", &self.settings)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use http::StatusCode;

    use crate::doer::{middleware_fn, RequestOption};

    fn raw(uri: &str) -> RawRequest {
        http::Request::builder().uri(uri).body(Vec::new()).unwrap()
    }

    #[test]
    fn settings_fold_last_wins() {
        let settings = TransportSettings::from_options(&[
            TransportOption::Timeout(Duration::from_secs(5)),
            TransportOption::UserAgent("a".into()),
            TransportOption::Timeout(Duration::from_secs(1)),
            TransportOption::KeepAlive(false),
            TransportOption::MaxRedirects(0),
        ]);
        assert_eq!(settings.timeout, Some(Duration::from_secs(1)));
        assert_eq!(settings.connect_timeout, None);
        assert_eq!(settings.user_agent.as_deref(), Some("a"));
        assert_eq!(settings.max_redirects, 0);
        assert!(!settings.keep_alive);
    }

    #[test]
    fn defaults_keep_connections() {
        let doer = UreqDoer::new(&[]);
        assert_eq!(doer.settings(), &TransportSettings::default());
        assert!(doer.settings().keep_alive);
    }

    #[test]
    fn cancelled_context_fails_before_sending() {
        let doer = UreqDoer::new(&[]);
        let ctx = Context::background();
        ctx.cancel();
        let err = doer
            .perform(&ctx, &mut raw("http://127.0.0.1:9/"), &mut RawResponse::default())
            .unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
    }

    #[test]
    fn expired_deadline_fails_before_sending() {
        let doer = UreqDoer::new(&[]);
        let ctx = Context::background().with_timeout(Duration::ZERO);
        let err = doer
            .perform(&ctx, &mut raw("http://127.0.0.1:9/"), &mut RawResponse::default())
            .unwrap_err();
        assert!(matches!(err, TransportError::DeadlineExceeded));
    }

    #[test]
    fn middleware_runs_in_order_and_can_answer() {
        let log: Arc<Mutex<Vec<String>>> = Arc::default();
        let outer_log = Arc::clone(&log);
        let inner_log = Arc::clone(&log);

        let outer: Arc<dyn Middleware> = Arc::new(middleware_fn(
            move |ctx: &Context, req: &mut RawRequest, resp: &mut RawResponse, next: Next<'_>| {
                outer_log.lock().unwrap().push("outer".into());
                next.run(ctx, req, resp)
            },
        ));
        let inner: Arc<dyn Middleware> = Arc::new(middleware_fn(
            move |_: &Context, req: &mut RawRequest, resp: &mut RawResponse, _: Next<'_>| {
                let tag = req
                    .extensions()
                    .get::<RequestOptions>()
                    .and_then(|o| o.tag("route"))
                    .unwrap_or("none")
                    .to_owned();
                inner_log.lock().unwrap().push(tag);
                *resp.status_mut() = StatusCode::ACCEPTED;
                Ok(())
            },
        ));

        let mut doer = UreqDoer::new(&[]);
        doer.as_middleware_host()
            .unwrap()
            .use_middleware(vec![outer, inner]);

        let mut req = raw("http://127.0.0.1:9/");
        let mut options = RequestOptions::default();
        options.apply(&RequestOption::Tag("route".into(), "cached".into()));
        req.extensions_mut().insert(options);

        let mut resp = RawResponse::default();
        doer.perform(&Context::background(), &mut req, &mut resp)
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(*log.lock().unwrap(), ["outer", "cached"]);
    }
}
