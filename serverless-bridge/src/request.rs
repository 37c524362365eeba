use crate::{HeaderMap, Method};

use http::Extensions;
use url::form_urlencoded;

use std::borrow::Cow;
use std::fmt;
use std::io::{Cursor, Read};

/// Request entity stream.
///
/// The stream may interpose decoders (e.g., base64; see
/// [`decode_entity`](crate::codec::binary::decode_entity)) over the raw event body, in which case
/// decoding errors surface while reading.
pub struct Entity(Box<dyn Read + Send>);

impl Entity {
  /// Wrap a byte stream.
  pub fn new<R>(reader: R) -> Self
  where
    R: Read + Send + 'static,
  {
    Self(Box::new(reader))
  }

  /// Empty entity stream.
  pub fn empty() -> Self {
    Self::new(std::io::empty())
  }
}

impl Default for Entity {
  fn default() -> Self {
    Self::empty()
  }
}

impl From<Vec<u8>> for Entity {
  fn from(bytes: Vec<u8>) -> Self {
    Self::new(Cursor::new(bytes))
  }
}

impl Read for Entity {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
    self.0.read(buf)
  }
}

impl fmt::Debug for Entity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Entity(..)")
  }
}

/// Canonical, platform-agnostic request passed to a [`Container`](crate::Container).
///
/// A request is built once per platform event by an [`Integration`](crate::Integration) and is
/// read-only afterward, apart from consuming the entity stream. Platform-specific context (e.g.,
/// the API Gateway request context or the Lambda execution context) is attached as
/// [`extensions`](Request::extensions).
#[derive(Debug)]
pub struct Request {
  base_uri: String,
  request_uri: String,
  method: Method,
  headers: HeaderMap,
  entity: Entity,
  extensions: Extensions,
}

impl Request {
  /// Construct a new request.
  ///
  /// # Arguments
  ///
  /// * `base_uri` - Base URI against which routes are resolved (e.g., `/` or
  ///   `https://example.com/`).
  /// * `request_uri` - Request path and query (e.g., `/items?id=5`).
  /// * `method` - HTTP method.
  /// * `headers` - HTTP request headers.
  /// * `entity` - Request body stream.
  pub fn new(
    base_uri: impl Into<String>,
    request_uri: impl Into<String>,
    method: Method,
    headers: HeaderMap,
    entity: Entity,
  ) -> Self {
    Self {
      base_uri: base_uri.into(),
      request_uri: request_uri.into(),
      method,
      headers,
      entity,
      extensions: Extensions::new(),
    }
  }

  /// Base URI against which the request URI is resolved.
  pub fn base_uri(&self) -> &str {
    &self.base_uri
  }

  /// Request path and query.
  pub fn request_uri(&self) -> &str {
    &self.request_uri
  }

  /// HTTP method.
  pub fn method(&self) -> &Method {
    &self.method
  }

  /// HTTP request headers.
  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  /// Out-of-band platform context attached by the integration.
  pub fn extensions(&self) -> &Extensions {
    &self.extensions
  }

  /// Mutable access to the request extensions.
  pub fn extensions_mut(&mut self) -> &mut Extensions {
    &mut self.extensions
  }

  /// Mutable access to the request entity stream.
  pub fn entity_mut(&mut self) -> &mut Entity {
    &mut self.entity
  }

  /// Consume the request and return its entity stream.
  pub fn into_entity(self) -> Entity {
    self.entity
  }

  /// Read the remainder of the request entity stream.
  pub fn read_body(&mut self) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    self.entity.read_to_end(&mut body)?;
    Ok(body)
  }

  /// Path component of the request URI (without the query).
  pub fn path(&self) -> &str {
    self
      .request_uri
      .split_once('?')
      .map(|(path, _)| path)
      .unwrap_or(self.request_uri.as_str())
  }

  /// Raw query component of the request URI, if any.
  pub fn query(&self) -> Option<&str> {
    self.request_uri.split_once('?').map(|(_, query)| query)
  }

  /// Decoded query parameters in order of appearance.
  pub fn query_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
    self
      .query()
      .map(|query| form_urlencoded::parse(query.as_bytes()).collect())
      .unwrap_or_default()
  }

  /// Request path relative to the path of the base URI, always starting with `/`.
  ///
  /// For example, a request for `/a/b/items` against the base URI `https://example.com/a/b/`
  /// has the relative path `/items`. If the request path is not below the base path, the full
  /// request path is returned.
  pub fn relative_path(&self) -> &str {
    let base_path = uri_path(&self.base_uri).trim_end_matches('/');
    let path = self.path();
    match path.strip_prefix(base_path) {
      Some(relative) if relative.is_empty() => "/",
      Some(relative) if relative.starts_with('/') => relative,
      _ => path,
    }
  }

  /// Rewrite the base URI to `<base URI><base_path>/` so that routes resolve relative to
  /// `base_path`. The request URI is left unchanged.
  ///
  /// An empty `base_path` leaves the base URI untouched.
  pub fn rewrite_base_path(&mut self, base_path: &str) {
    if base_path.is_empty() {
      return;
    }
    self.base_uri = format!(
      "{}/{}/",
      self.base_uri.trim_end_matches('/'),
      base_path.trim_matches('/')
    );
  }
}

/// Return the path component of an absolute (`scheme://authority/path`) or path-only URI.
fn uri_path(uri: &str) -> &str {
  match uri.split_once("://") {
    Some((_, rest)) => rest.find('/').map(|idx| &rest[idx..]).unwrap_or("/"),
    None => uri,
  }
}
