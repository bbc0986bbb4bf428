//! Executed response: raw transport response, decoded body bytes, and the
//! receptors of the request that produced it.

use std::fmt;

use http::HeaderMap;

use crate::codec::Slot;
use crate::doer::RawResponse;
use crate::request::Request;

/// Outcome of [`Request::execute`].
///
/// `body()` holds the decoded payload: when the server sent
/// `Content-Encoding: gzip` this is the inflated body, not the wire bytes.
pub struct Response {
    pub(crate) request: Request,
    pub(crate) raw_response: RawResponse,
    pub(crate) body_bytes: Vec<u8>,
    pub(crate) size: u64,
}

impl Response {
    pub(crate) fn new(request: Request, raw_response: RawResponse) -> Self {
        Self {
            request,
            raw_response,
            body_bytes: Vec::new(),
            size: 0,
        }
    }

    pub(crate) fn set_body(&mut self, body: Vec<u8>) {
        self.size = body.len() as u64;
        self.body_bytes = body;
    }

    /// HTTP status code, e.g. `200`.
    pub fn status_code(&self) -> u16 {
        self.raw_response.status().as_u16()
    }

    pub fn body(&self) -> &[u8] {
        &self.body_bytes
    }

    /// Body as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body_bytes).into_owned()
    }

    /// Length of [`body`](Response::body) in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn header(&self) -> &HeaderMap {
        self.raw_response.headers()
    }

    pub fn raw_response(&self) -> &RawResponse {
        &self.raw_response
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The decoded success payload, if the request asked for a `T` and one
    /// was decoded.
    pub fn result<T: 'static>(&self) -> Option<&T> {
        self.request
            .result
            .as_ref()?
            .as_any()
            .downcast_ref::<Slot<T>>()?
            .value
            .as_ref()
    }

    pub fn take_result<T: 'static>(&mut self) -> Option<T> {
        self.request
            .result
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<Slot<T>>()?
            .value
            .take()
    }

    /// The decoded error payload, if the request asked for an `E` and one
    /// was decoded.
    pub fn error<E: 'static>(&self) -> Option<&E> {
        self.request
            .error
            .as_ref()?
            .as_any()
            .downcast_ref::<Slot<E>>()?
            .value
            .as_ref()
    }

    pub fn take_error<E: 'static>(&mut self) -> Option<E> {
        self.request
            .error
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<Slot<E>>()?
            .value
            .take()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status_code())
            .field("size", &self.size)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
