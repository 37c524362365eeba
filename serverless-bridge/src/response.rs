use crate::{Body, HeaderMap, StatusCode};

use std::borrow::Cow;

/// Canonical, platform-agnostic response produced by a [`Container`](crate::Container).
///
/// The response is consumed once by an [`Integration`](crate::Integration), which serializes it
/// into the platform-specific reply.
#[derive(Debug)]
pub struct Response {
  status: StatusCode,
  reason_phrase: Option<Cow<'static, str>>,
  headers: HeaderMap,
  body: Body,
  implicit_status: bool,
}

impl Response {
  /// Construct a response with the specified status and body and no headers.
  pub fn new(status: StatusCode, body: Body) -> Self {
    Self {
      status,
      reason_phrase: None,
      headers: HeaderMap::new(),
      body,
      implicit_status: false,
    }
  }

  /// Construct a response without explicitly choosing its status.
  ///
  /// The status is `200 OK`, or `204 No Content` for an empty body, unless the route that
  /// produced the response declares a default status (see
  /// [`Router::route_with_default_status`](crate::Router::route_with_default_status)).
  pub fn entity(body: Body) -> Self {
    let status = if matches!(body, Body::Empty) {
      StatusCode::NO_CONTENT
    } else {
      StatusCode::OK
    };
    Self {
      implicit_status: true,
      ..Self::new(status, body)
    }
  }

  /// The fixed response returned when no response could be produced: `500 Internal Server Error`
  /// with no headers and no body.
  pub fn internal_server_error() -> Self {
    Self::new(StatusCode::INTERNAL_SERVER_ERROR, Body::Empty)
  }

  /// Replace the status code.
  pub fn with_status(mut self, status: StatusCode) -> Self {
    self.status = status;
    self.implicit_status = false;
    self
  }

  /// Replace the reason phrase.
  pub fn with_reason_phrase(mut self, reason_phrase: impl Into<Cow<'static, str>>) -> Self {
    self.reason_phrase = Some(reason_phrase.into());
    self
  }

  /// Replace the response headers.
  pub fn with_headers(mut self, headers: HeaderMap) -> Self {
    self.headers = headers;
    self
  }

  /// HTTP status code.
  pub fn status(&self) -> StatusCode {
    self.status
  }

  /// Reason phrase, defaulting to the canonical reason for the status code (if any).
  pub fn reason_phrase(&self) -> Option<&str> {
    self
      .reason_phrase
      .as_deref()
      .or_else(|| self.status.canonical_reason())
  }

  /// Whether the status was chosen implicitly (see [`entity`](Response::entity)).
  pub fn has_implicit_status(&self) -> bool {
    self.implicit_status
  }

  /// HTTP response headers.
  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  /// Mutable access to the response headers.
  pub fn headers_mut(&mut self) -> &mut HeaderMap {
    &mut self.headers
  }

  /// Response body.
  pub fn body(&self) -> &Body {
    &self.body
  }

  /// Split the response into its status, reason phrase, headers, and body.
  pub fn into_parts(self) -> (StatusCode, Option<String>, HeaderMap, Body) {
    let reason_phrase = self.reason_phrase().map(str::to_owned);
    (self.status, reason_phrase, self.headers, self.body)
  }
}

impl From<http::Response<Body>> for Response {
  fn from(response: http::Response<Body>) -> Self {
    let (parts, body) = response.into_parts();
    Self::new(parts.status, body).with_headers(parts.headers)
  }
}
