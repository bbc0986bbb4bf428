use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Req, Resp};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn life_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
        .header("h1", "header-value")
        .header("h2", "mix")
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn client1_echoes_query_header_and_body() {
    let resp = app()
        .oneshot(life_request(
            "/life/client1?q1=a&q2=b",
            r#"{"QueryString":"a","MixString":"b"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Resp = body_json(resp).await;
    assert_eq!(echo.query_string.as_deref(), Some("a"));
    assert_eq!(echo.mix_string.as_deref(), Some("b"));
    assert_eq!(echo.header_string.as_deref(), Some("header-value"));

    let body: Req = serde_json::from_str(echo.body.as_deref().unwrap()).unwrap();
    assert_eq!(body.query_string.as_deref(), Some("a"));
    assert_eq!(body.mix_string.as_deref(), Some("b"));
}

#[tokio::test]
async fn every_route_is_registered() {
    for uri in ["/life/client1", "/life/client2", "/life/client3"] {
        let resp = app().oneshot(life_request(uri, "{}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let echo: Resp = body_json(resp).await;
        assert!(echo.query_string.is_none(), "{uri}");
        assert_eq!(echo.body.as_deref(), Some("{}"), "{uri}");
    }
}

#[tokio::test]
async fn percent_encoded_query_is_decoded() {
    let resp = app()
        .oneshot(life_request("/life/client2?q1=a%20b%26c", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Resp = body_json(resp).await;
    assert_eq!(echo.query_string.as_deref(), Some("a b&c"));
}

// --- rejections ---

#[tokio::test]
async fn get_is_not_allowed() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/life/client1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app()
        .oneshot(life_request("/life/client9", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let resp = app()
        .oneshot(life_request("/life/client3", r#"{"QueryString":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_content_type_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/life/client1")
                .body("{}".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// --- register onto an existing router ---

#[tokio::test]
async fn register_keeps_existing_routes() {
    use axum::routing::get;

    let router = mock_server::register(axum::Router::new().route("/ping", get(|| async { "pong" })));

    let resp = router
        .clone()
        .oneshot(Request::builder().uri("/ping").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "pong");

    let resp = router
        .oneshot(life_request("/life/client1?q1=x", "{}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Resp = body_json(resp).await;
    assert_eq!(echo.query_string.as_deref(), Some("x"));
}
