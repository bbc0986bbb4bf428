use std::collections::HashMap;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Req {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_string: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Mount the `life` routes on `router`.
pub fn register(router: Router) -> Router {
    let life = Router::new()
        .route("/client1", post(biz_method2))
        .route("/client2", post(biz_method3))
        .route("/client3", post(biz_method4));
    router.nest("/life", life)
}

pub fn app() -> Router {
    register(Router::new())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn biz_method2(
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<Req>,
) -> Result<Json<Resp>, StatusCode> {
    echo("client1", query, headers, req)
}

async fn biz_method3(
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<Req>,
) -> Result<Json<Resp>, StatusCode> {
    echo("client2", query, headers, req)
}

async fn biz_method4(
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<Req>,
) -> Result<Json<Resp>, StatusCode> {
    echo("client3", query, headers, req)
}

/// Reflect `q1`, `q2`, `h1` and the decoded body back to the caller.
fn echo(
    route: &str,
    mut query: HashMap<String, String>,
    headers: HeaderMap,
    req: Req,
) -> Result<Json<Resp>, StatusCode> {
    let header_string = match headers.get("h1") {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| StatusCode::BAD_REQUEST)?
                .to_owned(),
        ),
        None => None,
    };
    let body = serde_json::to_string(&req).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    tracing::debug!(route, ?query, "life request");

    Ok(Json(Resp {
        query_string: query.remove("q1"),
        mix_string: query.remove("q2"),
        header_string,
        body: Some(body),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn req_reads_pascal_case() {
        let req: Req =
            serde_json::from_str(r#"{"QueryString":"q","PathString":"p"}"#).unwrap();
        assert_eq!(req.query_string.as_deref(), Some("q"));
        assert_eq!(req.path_string.as_deref(), Some("p"));
        assert!(req.mix_string.is_none());
    }

    #[test]
    fn echo_copies_query_header_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert("h1", "hv".parse().unwrap());
        let query = HashMap::from([
            ("q1".to_string(), "a".to_string()),
            ("q2".to_string(), "b".to_string()),
        ]);
        let req = Req {
            mix_string: Some("m".into()),
            ..Req::default()
        };

        let Json(resp) = echo("client1", query, headers, req).unwrap();
        assert_eq!(resp.query_string.as_deref(), Some("a"));
        assert_eq!(resp.mix_string.as_deref(), Some("b"));
        assert_eq!(resp.header_string.as_deref(), Some("hv"));
        assert_eq!(resp.body.as_deref(), Some(r#"{"MixString":"m"}"#));
    }

    #[test]
    fn echo_without_inputs_is_mostly_empty() {
        let Json(resp) = echo("client2", HashMap::new(), HeaderMap::new(), Req::default()).unwrap();
        assert!(resp.query_string.is_none());
        assert!(resp.header_string.is_none());
        assert_eq!(resp.body.as_deref(), Some("{}"));
    }
}
