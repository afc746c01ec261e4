//! Transport facade interface.
//!
//! The session adapter never opens sockets itself. It talks to an
//! authenticated transport implementing [`Transport`], which owns
//! connection pooling, TLS and credential handling. Requests are built
//! explicitly: the verb, headers, body, property patch payload and
//! whether the response body should even be parsed are all plain fields,
//! not behavioral overrides.

use bytes::Bytes;

use crate::error::Result;
use crate::fields::Field;
use crate::types::MultiStatus;

/// Vendor status renormalization: Exchange reports "forbidden" as 440.
///
/// Applied uniformly when a [`DavResponse`] is constructed, so no caller
/// ever sees the vendor code.
#[must_use]
pub const fn normalize_status(status: u16) -> u16 {
    if status == 440 { 403 } else { status }
}

/// WebDAV verbs used by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Plain body read.
    Get,
    /// Conditional body write.
    Put,
    /// Resource delete.
    Delete,
    /// Server-side move.
    Move,
    /// Server-side copy.
    Copy,
    /// Structured property fetch.
    PropFind,
    /// Property patch.
    PropPatch,
    /// Collection creation carrying initial properties. On the wire this
    /// is a property-patch payload sent with the MKCOL verb.
    MkCol,
    /// Structured DASL search.
    Search,
}

impl Method {
    /// Returns the wire verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Move => "MOVE",
            Self::Copy => "COPY",
            Self::PropFind => "PROPFIND",
            Self::PropPatch => "PROPPATCH",
            Self::MkCol => "MKCOL",
            Self::Search => "SEARCH",
        }
    }
}

/// One property assignment inside a property-patch payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyUpdate {
    /// Full property URI.
    pub uri: String,
    /// New value.
    pub value: String,
}

impl PropertyUpdate {
    /// Creates a property assignment.
    #[must_use]
    pub fn new(uri: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            value: value.into(),
        }
    }
}

/// An explicit request description handed to the transport.
#[derive(Debug, Clone)]
pub struct DavRequest {
    /// Verb to execute.
    pub method: Method,
    /// Absolute URL path of the target resource.
    pub url: String,
    /// Request headers in insertion order.
    pub headers: Vec<(&'static str, String)>,
    /// Request body, if any.
    pub body: Option<Bytes>,
    /// Property assignments for PROPPATCH/MKCOL payloads.
    pub patch: Vec<PropertyUpdate>,
    /// When false the transport must not attempt to parse the response
    /// body (some patch responses carry invalid XML).
    pub parse_response: bool,
}

impl DavRequest {
    /// Creates a request with no headers, body or patch payload.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            patch: Vec::new(),
            parse_response: true,
        }
    }

    /// Adds a request header.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the property patch payload.
    #[must_use]
    pub fn patch(mut self, patch: Vec<PropertyUpdate>) -> Self {
        self.patch = patch;
        self
    }

    /// Suppresses response body parsing.
    #[must_use]
    pub const fn skip_response_body(mut self) -> Self {
        self.parse_response = false;
        self
    }

    /// Returns the first value of a request header, if set.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A transport response: status, headers and body.
#[derive(Debug, Clone, Default)]
pub struct DavResponse {
    /// Response status, already renormalized (vendor 440 became 403).
    pub status: u16,
    /// Status line / reason phrase for diagnostics.
    pub reason: String,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Bytes,
}

impl DavResponse {
    /// Creates a response, applying vendor status renormalization.
    #[must_use]
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status: normalize_status(status),
            reason: reason.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the response body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the first value of a response header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true when any `Content-Encoding` header declares gzip.
    #[must_use]
    pub fn is_gzip_encoded(&self) -> bool {
        self.headers
            .iter()
            .any(|(n, v)| n.eq_ignore_ascii_case("Content-Encoding") && v == "gzip")
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Authenticated HTTP/WebDAV transport facade.
///
/// One transport serves exactly one session and is driven sequentially.
/// `execute` returns `Ok` for any HTTP exchange that completed, whatever
/// the status; errors are reserved for I/O failures. The structured
/// helpers (`propfind`, `search`) parse 207 bodies into [`MultiStatus`]
/// and translate non-207 statuses into typed errors.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Host the transport authenticated against.
    fn host(&self) -> &str;

    /// User name the transport authenticated with.
    fn username(&self) -> &str;

    /// Executes a request and returns the raw exchange outcome.
    async fn execute(&mut self, request: DavRequest) -> Result<DavResponse>;

    /// Structured property fetch at the given depth.
    ///
    /// # Errors
    /// [`crate::Error::ItemNotFound`] on 404, [`crate::Error::Transport`]
    /// on any other non-207 status.
    async fn propfind(&mut self, url: &str, depth: u32, props: &[&Field])
    -> Result<MultiStatus>;

    /// Structured DASL search rooted at the given URL.
    ///
    /// # Errors
    /// Same status mapping as [`Transport::propfind`].
    async fn search(&mut self, url: &str, query: &str) -> Result<MultiStatus>;

    /// True when the alternate authentication mode is already active.
    fn has_fallback_auth(&self) -> bool;

    /// Enables the alternate authentication mode. Applied at most once
    /// per session and never undone.
    fn enable_fallback_auth(&mut self);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn vendor_forbidden_is_renormalized() {
        assert_eq!(normalize_status(440), 403);
        assert_eq!(normalize_status(200), 200);
        let resp = DavResponse::new(440, "Login Timeout");
        assert_eq!(resp.status, 403);
    }

    #[test]
    fn request_builder_collects_headers() {
        let req = DavRequest::new(Method::Put, "/exchange/jdoe/Drafts/a.EML")
            .header("Translate", "f")
            .header("Overwrite", "f")
            .body(Bytes::from_static(b"body"));
        assert_eq!(req.get_header("translate"), Some("f"));
        assert_eq!(req.get_header("OVERWRITE"), Some("f"));
        assert!(req.parse_response);
    }

    #[test]
    fn skip_response_body_flag() {
        let req = DavRequest::new(Method::PropPatch, "/x").skip_response_body();
        assert!(!req.parse_response);
    }

    #[test]
    fn gzip_detection_is_case_insensitive_on_name() {
        let resp = DavResponse::new(200, "OK").with_header("content-encoding", "gzip");
        assert!(resp.is_gzip_encoded());
        let resp = DavResponse::new(200, "OK").with_header("Content-Encoding", "identity");
        assert!(!resp.is_gzip_encoded());
    }

    #[test]
    fn mkcol_keeps_its_own_verb() {
        assert_eq!(Method::MkCol.as_str(), "MKCOL");
        assert_eq!(Method::Search.as_str(), "SEARCH");
    }
}
