//! Content negotiation: body shapes, content-type detection, JSON and XML
//! encoding of request bodies and decoding of responses into receptors.
//!
//! # Design
//! Callers hand the request a [`Body`] that says what shape the value has
//! (record, map, sequence, text, bytes, scalar). The shape drives both the
//! detected content type and whether the value is encoded at all:
//!
//! - JSON content types encode records, maps and sequences.
//! - XML content types encode records only.
//! - Every other combination sends an empty body, including text and byte
//!   bodies. Callers that need to send raw text or bytes install their own
//!   binder with [`with_body_binder`](crate::options::with_body_binder).

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::LazyLock;

use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::Client;
use crate::error::{BoxError, ClientError};
use crate::request::Request;
use crate::sniff;

pub const PLAIN_TEXT_TYPE: &str = "text/plain; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

static JSON_CHECK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(application|text)/(json|.*\+json|json-.*)(; |$)")
        .expect("static regex should not panic")
});

static XML_CHECK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(application|text)/(xml|.*\+xml)(; |$)")
        .expect("static regex should not panic")
});

/// Whether `ct` names a JSON media type (`application/json`, `*+json`, ...).
pub fn is_json_type(ct: &str) -> bool {
    JSON_CHECK.is_match(ct)
}

/// Whether `ct` names an XML media type (`application/xml`, `*+xml`, ...).
pub fn is_xml_type(ct: &str) -> bool {
    XML_CHECK.is_match(ct)
}

/// A value that can be written as JSON or XML.
///
/// Implemented for every `Serialize + Send + Sync` type.
pub trait Encode: Send + Sync {
    fn encode_json(&self) -> Result<Vec<u8>, BoxError>;
    fn encode_xml(&self) -> Result<Vec<u8>, BoxError>;
}

impl<T: Serialize + Send + Sync> Encode for T {
    fn encode_json(&self) -> Result<Vec<u8>, BoxError> {
        serde_json::to_vec(self).map_err(Into::into)
    }

    fn encode_xml(&self) -> Result<Vec<u8>, BoxError> {
        quick_xml::se::to_string(self)
            .map(String::into_bytes)
            .map_err(Into::into)
    }
}

/// Shape of a request body value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Record,
    Map,
    Sequence,
    Text,
    Bytes,
    Scalar,
}

/// Request body: a value tagged with its shape.
pub enum Body {
    /// A struct-like value with named fields.
    Record(Box<dyn Encode>),
    /// A key-value map.
    Map(Box<dyn Encode>),
    /// A list, array or tuple (not raw bytes).
    Sequence(Box<dyn Encode>),
    Text(String),
    Bytes(Vec<u8>),
    /// Numbers, booleans and anything else.
    Scalar(Box<dyn Encode>),
}

impl Body {
    pub fn record<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Body::Record(Box::new(value))
    }

    pub fn map<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Body::Map(Box::new(value))
    }

    pub fn sequence<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Body::Sequence(Box::new(value))
    }

    pub fn scalar<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Body::Scalar(Box::new(value))
    }

    pub fn shape(&self) -> Shape {
        match self {
            Body::Record(_) => Shape::Record,
            Body::Map(_) => Shape::Map,
            Body::Sequence(_) => Shape::Sequence,
            Body::Text(_) => Shape::Text,
            Body::Bytes(_) => Shape::Bytes,
            Body::Scalar(_) => Shape::Scalar,
        }
    }

    fn encoder(&self) -> Option<&dyn Encode> {
        match self {
            Body::Record(v) | Body::Map(v) | Body::Sequence(v) | Body::Scalar(v) => {
                Some(v.as_ref())
            }
            Body::Text(_) | Body::Bytes(_) => None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Body::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            other => write!(f, "{:?}(..)", other.shape()),
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(value)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Object(_) => Body::Map(Box::new(value)),
            Value::Array(_) => Body::Sequence(Box::new(value)),
            Value::String(s) => Body::Text(s),
            other => Body::Scalar(Box::new(other)),
        }
    }
}

/// Pick a content type for a body that came without a `Content-Type` header.
pub fn detect_content_type(body: Option<&Body>) -> String {
    match body.map(|b| (b.shape(), b)) {
        Some((Shape::Record | Shape::Map | Shape::Sequence, _)) => JSON_CONTENT_TYPE.to_owned(),
        Some((_, Body::Bytes(bytes))) => sniff::detect_content_type(bytes).to_owned(),
        _ => PLAIN_TEXT_TYPE.to_owned(),
    }
}

/// Whether requests with `method` carry a payload.
pub fn is_payload_supported(method: &Method) -> bool {
    !(*method == Method::HEAD
        || *method == Method::OPTIONS
        || *method == Method::GET
        || *method == Method::DELETE)
}

/// Output of a body binder: the content type to send and the encoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundBody {
    /// Empty when the binder has no opinion.
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Default body binder.
///
/// Uses the request's `Content-Type` header when present; otherwise detects
/// one from the body shape and writes it back onto the request headers.
/// Methods without a payload (GET, HEAD, OPTIONS, DELETE) bind nothing.
pub fn default_request_body_bind(
    _client: &Client,
    req: &mut Request,
) -> Result<BoundBody, ClientError> {
    if !is_payload_supported(req.method()) {
        return Ok(BoundBody::default());
    }

    let declared = req
        .header()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_default();
    let content_type = if declared.trim().is_empty() {
        let detected = detect_content_type(req.body_param());
        req.header_mut()
            .insert(CONTENT_TYPE, HeaderValue::try_from(detected.as_str())?);
        detected
    } else {
        declared
    };

    let body = match req.body_param() {
        Some(param) => encode_body(&content_type, param)?,
        None => Vec::new(),
    };

    Ok(BoundBody { content_type, body })
}

/// Encode `body` for `content_type`, or return an empty payload when the
/// combination is not one the codec writes.
pub fn encode_body(content_type: &str, body: &Body) -> Result<Vec<u8>, ClientError> {
    let shape = body.shape();
    let Some(encoder) = body.encoder() else {
        return Ok(Vec::new());
    };

    if is_json_type(content_type) && matches!(shape, Shape::Record | Shape::Map | Shape::Sequence)
    {
        encoder
            .encode_json()
            .map_err(|source| ClientError::Encode { format: "json", source })
    } else if is_xml_type(content_type) && shape == Shape::Record {
        encoder
            .encode_xml()
            .map_err(|source| ClientError::Encode { format: "xml", source })
    } else {
        Ok(Vec::new())
    }
}

/// Decode `body` as JSON or XML according to `content_type`.
///
/// Returns `Ok(None)` for content types the codec does not handle.
pub fn unmarshal_content<T: DeserializeOwned>(
    content_type: &str,
    body: &[u8],
) -> Result<Option<T>, ClientError> {
    if is_json_type(content_type) {
        serde_json::from_slice(body)
            .map(Some)
            .map_err(|e| ClientError::Decode {
                format: "json",
                source: e.into(),
            })
    } else if is_xml_type(content_type) {
        let text = std::str::from_utf8(body).map_err(|e| ClientError::Decode {
            format: "xml",
            source: e.into(),
        })?;
        quick_xml::de::from_str(text)
            .map(Some)
            .map_err(|e| ClientError::Decode {
                format: "xml",
                source: e.into(),
            })
    } else {
        Ok(None)
    }
}

/// Type-erased slot that a response body is decoded into.
pub(crate) trait Receptor: Send + Sync {
    fn decode(&mut self, content_type: &str, body: &[u8]) -> Result<(), ClientError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

pub(crate) struct Slot<T> {
    pub(crate) value: Option<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: None,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + Send + Sync + 'static> Receptor for Slot<T> {
    fn decode(&mut self, content_type: &str, body: &[u8]) -> Result<(), ClientError> {
        if let Some(value) = unmarshal_content(content_type, body)? {
            self.value = Some(value);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
