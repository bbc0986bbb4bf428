//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the typed `life`
//! client over real HTTP through the default ureq transport. Validates that
//! URL resolution, header merge, body binding and result decoding work with
//! the actual server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::{HeaderMap, HeaderValue, Method};
use life_client::{
    middleware_fn, with_header, with_middleware, with_transport_options, ClientError, Context,
    ExecuteError, IdlClient, LifeClient, Next, RawRequest, RawResponse, Req, RequestOption,
    RequestOptions, Resp, Response, TransportError, TransportOption,
};

type BizMethod =
    fn(&IdlClient, &Context, &Req, Vec<RequestOption>) -> Result<(Resp, Response), ExecuteError>;

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn full_req() -> Req {
    Req {
        query_string: Some("query value".to_string()),
        mix_string: Some("mix".to_string()),
        header_string: Some("header".to_string()),
        path_string: Some("path".to_string()),
    }
}

#[test]
fn every_method_round_trips() {
    let addr = start_server();
    let client = IdlClient::new(&format!("http://{addr}"), []).unwrap();
    let ctx = Context::background();
    let req = full_req();

    let calls: [(&str, BizMethod); 3] = [
        ("biz_method2", IdlClient::biz_method2),
        ("biz_method3", IdlClient::biz_method3),
        ("biz_method4", IdlClient::biz_method4),
    ];
    for (method, call) in calls {
        let (resp, raw) = call(&client, &ctx, &req, Vec::new()).unwrap();
        assert_eq!(raw.status_code(), 200, "{method}");
        assert_eq!(resp.query_string.as_deref(), Some("query value"), "{method}");
        assert_eq!(resp.mix_string.as_deref(), Some("mix"), "{method}");
        assert_eq!(resp.header_string.as_deref(), Some("header"), "{method}");

        let echoed: Req = serde_json::from_str(resp.body.as_deref().unwrap()).unwrap();
        assert_eq!(echoed, req, "{method}");
    }
}

#[test]
fn absent_fields_stay_absent() {
    let addr = start_server();
    let client = IdlClient::new(&format!("http://{addr}"), []).unwrap();

    let (resp, _) = client
        .biz_method3(&Context::background(), &Req::default(), Vec::new())
        .unwrap();
    assert!(resp.query_string.is_none());
    assert!(resp.mix_string.is_none());
    assert!(resp.header_string.is_none());
    assert_eq!(resp.body.as_deref(), Some("{}"));
}

#[test]
fn default_header_reaches_server() {
    let addr = start_server();
    let mut defaults = HeaderMap::new();
    defaults.insert("h1", HeaderValue::from_static("from-default"));
    let client = IdlClient::new(&format!("http://{addr}"), [with_header(defaults)]).unwrap();

    let (resp, _) = client
        .biz_method2(&Context::background(), &Req::default(), Vec::new())
        .unwrap();
    assert_eq!(resp.header_string.as_deref(), Some("from-default"));

    // A request header replaces the default.
    let (resp, _) = client
        .biz_method2(&Context::background(), &full_req(), Vec::new())
        .unwrap();
    assert_eq!(resp.header_string.as_deref(), Some("header"));
}

#[test]
fn middleware_sees_tags_and_status() {
    let addr = start_server();
    let seen: Arc<Mutex<Vec<(Option<String>, u16)>>> = Arc::default();
    let sink = Arc::clone(&seen);

    let mw = middleware_fn(
        move |ctx: &Context, req: &mut RawRequest, resp: &mut RawResponse, next: Next<'_>| {
            let tag = req
                .extensions()
                .get::<RequestOptions>()
                .and_then(|o| o.tag("caller"))
                .map(str::to_owned);
            let result = next.run(ctx, req, resp);
            sink.lock().unwrap().push((tag, resp.status().as_u16()));
            result
        },
    );
    let client = IdlClient::new(
        &format!("http://{addr}"),
        [
            with_middleware(mw),
            with_transport_options([TransportOption::Timeout(Duration::from_secs(5))]),
        ],
    )
    .unwrap();

    client
        .biz_method4(
            &Context::background(),
            &full_req(),
            vec![RequestOption::Tag("caller".into(), "it".into())],
        )
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), [(Some("it".to_string()), 200)]);
}

#[test]
fn unknown_route_is_a_status_error() {
    let addr = start_server();
    let client = IdlClient::new(&format!("http://{addr}"), []).unwrap();

    let err = client
        .client()
        .new_request()
        .set_body_param(life_client::Body::record(full_req()))
        .execute(Method::POST, "/life/client9")
        .unwrap_err();
    assert!(matches!(err.error(), ClientError::Status { status: 404, .. }));
    assert_eq!(err.to_string(), r#"{"status_code":404,"body":""}"#);
    assert_eq!(err.response().map(|r| r.status_code()), Some(404));
}

#[test]
fn cancelled_context_never_reaches_server() {
    let addr = start_server();
    let client = IdlClient::new(&format!("http://{addr}"), []).unwrap();
    let ctx = Context::background();
    ctx.cancel();

    let err = client.biz_method2(&ctx, &full_req(), Vec::new()).unwrap_err();
    assert!(matches!(
        err.error(),
        ClientError::Transport(TransportError::Cancelled)
    ));
    assert!(err.response().is_some());
}

#[test]
fn connection_refused_is_a_transport_failure() {
    // Bind then drop to get a port with nothing listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = IdlClient::new(&format!("http://{addr}"), []).unwrap();

    let err = client
        .biz_method2(&Context::background(), &full_req(), Vec::new())
        .unwrap_err();
    assert!(matches!(
        err.error(),
        ClientError::Transport(TransportError::Failed(_))
    ));
}
