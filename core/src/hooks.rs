//! Pre-request and post-response hooks.
//!
//! The client runs the pre-request hooks in order (URL resolution, header
//! merge, raw request construction) before the transport is called, and the
//! post-response hooks (body parsing) afterwards. The first hook to fail
//! stops its list.

use http::header::{CONTENT_TYPE, HOST};
use http::HeaderValue;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use url::Url;

use crate::client::Client;
use crate::codec::{is_json_type, is_xml_type};
use crate::doer::{HostOverride, RawRequest, RequestOptions};
use crate::error::ClientError;
use crate::request::Request;
use crate::response::Response;

pub type BeforeRequestFn = fn(&Client, &mut Request) -> Result<(), ClientError>;
pub type AfterResponseFn = fn(&Client, &mut Response) -> Result<(), ClientError>;

/// Bytes escaped inside one path segment. Sub-delimiters `$ & + : = @` pass
/// through unchanged; `/ ; , ?` do not, so a value never splits a segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Substitute path parameters, make the URL absolute against the client
/// base URL, and append the query string.
///
/// The URL is assembled as text. `Url::parse` only validates it, so dot
/// segments from the template or from a parameter value reach the transport
/// as written.
pub fn parse_request_url(client: &Client, req: &mut Request) -> Result<(), ClientError> {
    let mut url = req.url.clone();
    // Longest names first so `:id` never rewrites the prefix of `:idx`.
    let mut params: Vec<(&String, &String)> = req.path_params.iter().collect();
    params.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
    for (name, value) in params {
        let escaped = utf8_percent_encode(value, PATH_SEGMENT).to_string();
        url = url.replace(&format!(":{name}"), &escaped);
    }

    match Url::parse(&url) {
        Ok(_) => {}
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if !url.starts_with('/') {
                url.insert(0, '/');
            }
            url = format!("{}{}", client.host_url(), url);
            if let Err(source) = Url::parse(&url) {
                return Err(ClientError::InvalidUrl { url, source });
            }
        }
        Err(source) => return Err(ClientError::InvalidUrl { url, source }),
    }

    if !req.query_param.is_empty() {
        append_query(&mut url, &req.query_param.encode());
    }

    req.url = url;
    Ok(())
}

fn append_query(url: &mut String, encoded: &str) {
    let fragment = url.find('#').map(|at| url.split_off(at));
    match url.find('?') {
        Some(at) if !url[at + 1..].trim().is_empty() => url.push('&'),
        Some(at) => url.truncate(at + 1),
        None => url.push('?'),
    }
    url.push_str(encoded);
    if let Some(fragment) = fragment {
        url.push_str(&fragment);
    }
}

/// Merge the client default headers with the request headers. A header set
/// on the request replaces every default value under the same name.
pub fn parse_request_header(client: &Client, req: &mut Request) -> Result<(), ClientError> {
    let mut merged = client.default_header().clone();
    for name in req.header.keys() {
        merged.remove(name);
        for value in req.header.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }
    req.header = merged;
    Ok(())
}

/// Bind the body and build the transport request.
pub fn create_http_request(client: &Client, req: &mut Request) -> Result<(), ClientError> {
    let bound = client.bind_request_body(req)?;
    if !bound.content_type.trim().is_empty() {
        req.header
            .insert(CONTENT_TYPE, HeaderValue::try_from(bound.content_type.as_str())?);
    }

    let mut raw: RawRequest = http::Request::builder()
        .method(req.method.clone())
        .uri(req.url.as_str())
        .body(bound.body)?;

    for (name, value) in &req.header {
        raw.headers_mut().append(name.clone(), value.clone());
    }

    let mut options = RequestOptions::default();
    for option in &req.request_options {
        options.apply(option);
    }
    raw.extensions_mut().insert(options);

    if let Some(host) = req.header.get(HOST).and_then(|h| h.to_str().ok()) {
        if !host.is_empty() {
            raw.extensions_mut().insert(HostOverride(host.to_owned()));
        }
    }

    req.raw_request = Some(raw);
    Ok(())
}

#[derive(Serialize)]
struct StatusDiagnostic<'a> {
    status_code: u16,
    body: &'a str,
}

/// Decode the response body into the request's result or error receptor.
///
/// `204 No Content` is left alone. When the decider flags the status and the
/// request has no error receptor, the failure is reported as
/// [`ClientError::Status`] carrying `{"status_code":..,"body":".."}`.
pub fn parse_response_body(client: &Client, res: &mut Response) -> Result<(), ClientError> {
    let status = res.status_code();
    if status == http::StatusCode::NO_CONTENT.as_u16() {
        return Ok(());
    }

    let content_type = res
        .header()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    if client.is_error_response(status, &res.raw_response) {
        match res.request.error.as_mut() {
            Some(receptor) => {
                if is_json_type(&content_type) || is_xml_type(&content_type) {
                    receptor.decode(&content_type, &res.body_bytes)?;
                }
                Ok(())
            }
            None => {
                let body = String::from_utf8_lossy(&res.body_bytes);
                let message = serde_json::to_string(&StatusDiagnostic {
                    status_code: status,
                    body: &body,
                })
                .map_err(|e| ClientError::Encode {
                    format: "json",
                    source: e.into(),
                })?;
                tracing::warn!(status, "response flagged as error without an error receptor");
                Err(ClientError::Status { status, message })
            }
        }
    } else {
        if let Some(receptor) = res.request.result.as_mut() {
            if is_json_type(&content_type) || is_xml_type(&content_type) {
                receptor.decode(&content_type, &res.body_bytes)?;
            }
        }
        Ok(())
    }
}
