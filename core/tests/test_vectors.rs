//! Run the request pipeline against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector describes inputs, a simulated transport response and the
//! expected outcome. The transport is a closure, so no network is involved.
//! Decoded results are compared as parsed JSON to avoid false negatives from
//! field ordering.

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use http::{HeaderName, HeaderValue, Method, StatusCode};
use life_client::{
    doer_fn, with_transport, Client, ClientError, Context, RawRequest, RawResponse, Resp,
};

fn capture_client(base_url: &str) -> Client {
    let doer = doer_fn(|_: &Context, _: &mut RawRequest, _: &mut RawResponse| Ok(()));
    Client::new(base_url, [with_transport(doer)]).unwrap()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

// ---------------------------------------------------------------------------
// URL resolution
// ---------------------------------------------------------------------------

#[test]
fn resolve_url_vectors() {
    let raw = include_str!("../../test-vectors/resolve_url.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let client = capture_client(case["base_url"].as_str().unwrap());

        let path_params: BTreeMap<String, String> =
            serde_json::from_value(case["path_params"].clone()).unwrap();
        let query: BTreeMap<String, Vec<String>> =
            serde_json::from_value(case["query"].clone()).unwrap();

        let mut req = client.new_request().set_path_params(path_params);
        for (key, values) in query {
            req = req.set_query_param(&key, values);
        }

        let res = req
            .execute(Method::GET, case["template"].as_str().unwrap())
            .unwrap_or_else(|e| panic!("{name}: {e}"));

        let expected = case["expected_url"].as_str().unwrap();
        assert_eq!(res.request().url(), expected, "{name}: resolved url");
        assert_eq!(
            res.request().raw_request().unwrap().uri().to_string(),
            expected,
            "{name}: transport uri"
        );
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

#[test]
fn parse_response_vectors() {
    let raw = include_str!("../../test-vectors/parse_response.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap().to_owned();

        let status = StatusCode::from_u16(case["status"].as_u64().unwrap() as u16).unwrap();
        let headers: Vec<(String, String)> =
            serde_json::from_value(case["headers"].clone()).unwrap();
        let plain = case["body"].as_str().unwrap().as_bytes().to_vec();
        let body = if case["gzip"].as_bool().unwrap() {
            gzip(&plain)
        } else {
            plain
        };

        let doer = doer_fn(move |_: &Context, _: &mut RawRequest, resp: &mut RawResponse| {
            *resp.status_mut() = status;
            for (k, v) in &headers {
                resp.headers_mut().append(
                    HeaderName::try_from(k.as_str()).unwrap(),
                    HeaderValue::try_from(v.as_str()).unwrap(),
                );
            }
            *resp.body_mut() = body.clone();
            Ok(())
        });
        let client = Client::new("http://api.local", [with_transport(doer)]).unwrap();

        let receptors: Vec<String> = serde_json::from_value(case["receptors"].clone()).unwrap();
        let mut req = client.new_request();
        if receptors.iter().any(|r| r == "result") {
            req = req.set_result::<Resp>();
        }
        if receptors.iter().any(|r| r == "error") {
            req = req.set_error::<serde_json::Value>();
        }

        let expected = &case["expected"];
        let outcome = req.execute(Method::GET, "/life");

        if !expected["ok"].as_bool().unwrap() {
            let err = outcome.expect_err(&name);
            if let Some(message) = expected["message"].as_str() {
                assert_eq!(err.to_string(), message, "{name}: message");
            }
            if expected["kind"] == "decode" {
                assert!(
                    matches!(err.error(), ClientError::Decode { .. }),
                    "{name}: {err}"
                );
            }
            assert!(err.response().is_some(), "{name}: response kept");
            continue;
        }

        let res = outcome.unwrap_or_else(|e| panic!("{name}: {e}"));
        let result = res
            .result::<Resp>()
            .map(|r| serde_json::to_value(r).unwrap())
            .unwrap_or(serde_json::Value::Null);
        assert_eq!(result, expected["result"], "{name}: result");

        let error = res
            .error::<serde_json::Value>()
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        assert_eq!(error, expected["error"], "{name}: error");

        if let Some(text) = expected["text"].as_str() {
            assert_eq!(res.text(), text, "{name}: text");
        }
    }
}
