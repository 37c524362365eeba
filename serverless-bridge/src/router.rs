use crate::{Body, BoxError, Container, HeaderValue, Method, Request, Response, StatusCode};

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use std::fmt;
use std::future::Future;

type Handler =
  Box<dyn Fn(Request, PathParams) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync>;

/// Values captured by the `{name}` segments of a route template, percent-decoded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParams(IndexMap<String, String>);

impl PathParams {
  /// Return the value captured by the named segment.
  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.get(name).map(String::as_str)
  }

  /// Iterate over the captured `(name, value)` pairs in template order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .0
      .iter()
      .map(|(name, value)| (name.as_str(), value.as_str()))
  }
}

#[derive(Debug)]
enum Segment {
  Literal(String),
  Capture(String),
}

struct Route {
  method: Method,
  template: String,
  segments: Vec<Segment>,
  default_status: Option<StatusCode>,
  handler: Handler,
}

impl Route {
  fn matches(&self, path_segments: &[&str]) -> Option<PathParams> {
    if self.segments.len() != path_segments.len() {
      return None;
    }
    let mut params = IndexMap::new();
    for (segment, value) in self.segments.iter().zip(path_segments) {
      match segment {
        Segment::Literal(literal) if literal == *value => {}
        Segment::Literal(_) => return None,
        Segment::Capture(name) => {
          let value = urlencoding::decode(value)
            .map(|value| value.into_owned())
            .unwrap_or_else(|_| value.to_string());
          params.insert(name.clone(), value);
        }
      }
    }
    Some(PathParams(params))
  }
}

impl fmt::Debug for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Route")
      .field("method", &self.method)
      .field("template", &self.template)
      .field("default_status", &self.default_status)
      .finish_non_exhaustive()
  }
}

fn split_path(path: &str) -> Vec<&str> {
  path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Minimal path-template [`Container`] that dispatches requests to async handlers.
///
/// Templates consist of `/`-separated literal segments and `{name}` captures (e.g.,
/// `/items/{id}`) and are matched against [`Request::relative_path`]. Routes are tried in
/// registration order.
///
/// Requests for unknown paths receive `404 Not Found`. Requests for a known path with an
/// unregistered method receive `405 Method Not Allowed` with an `Allow` header.
///
/// # Example
///
/// ```rust
/// use serverless_bridge::{Body, BoxError, Method, Response, Router, StatusCode};
///
/// let router = Router::new()
///   .route(Method::GET, "/items/{id}", |_request, params| async move {
///     Ok(Response::entity(Body::Text(format!("item {}", params.get("id").unwrap_or_default()))))
///   })
///   .route_with_default_status(
///     Method::POST,
///     "/items",
///     StatusCode::CREATED,
///     |mut request, _params| async move {
///       let body = request.read_body()?;
///       Ok::<_, BoxError>(Response::entity(Body::Binary(body)))
///     },
///   );
/// ```
#[derive(Debug, Default)]
pub struct Router {
  routes: Vec<Route>,
}

impl Router {
  /// Construct a router without any routes.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a handler for the specified method and path template.
  pub fn route<F, Fut>(self, method: Method, template: &str, handler: F) -> Self
  where
    F: Fn(Request, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
  {
    self.add_route(method, template, None, handler)
  }

  /// Register a handler whose implicit statuses (see [`Response::entity`]) are replaced with
  /// `default_status`.
  ///
  /// Responses with an explicitly chosen status are returned unchanged.
  pub fn route_with_default_status<F, Fut>(
    self,
    method: Method,
    template: &str,
    default_status: StatusCode,
    handler: F,
  ) -> Self
  where
    F: Fn(Request, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
  {
    self.add_route(method, template, Some(default_status), handler)
  }

  fn add_route<F, Fut>(
    mut self,
    method: Method,
    template: &str,
    default_status: Option<StatusCode>,
    handler: F,
  ) -> Self
  where
    F: Fn(Request, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
  {
    let segments = split_path(template)
      .into_iter()
      .map(|segment| {
        match segment
          .strip_prefix('{')
          .and_then(|segment| segment.strip_suffix('}'))
        {
          Some(name) => Segment::Capture(name.to_string()),
          None => Segment::Literal(segment.to_string()),
        }
      })
      .collect();

    self.routes.push(Route {
      method,
      template: template.to_string(),
      segments,
      default_status,
      handler: Box::new(move |request, params| handler(request, params).boxed()),
    });
    self
  }
}

#[async_trait]
impl Container for Router {
  async fn handle(&self, request: Request) -> Result<Response, BoxError> {
    let relative_path = request.relative_path().to_string();
    let path_segments = split_path(&relative_path);

    let mut allowed = Vec::new();
    for route in &self.routes {
      let Some(params) = route.matches(&path_segments) else {
        continue;
      };
      if route.method != request.method() {
        allowed.push(&route.method);
        continue;
      }

      debug!("Matched route {} {}", route.method, route.template);
      let response = (route.handler)(request, params).await?;
      return Ok(match route.default_status {
        Some(default_status) if response.has_implicit_status() => {
          response.with_status(default_status)
        }
        _ => response,
      });
    }

    if allowed.is_empty() {
      debug!("No route matches {relative_path}");
      return Ok(Response::new(StatusCode::NOT_FOUND, Body::Empty));
    }

    let allow = allowed.into_iter().unique().join(", ");
    let mut response = Response::new(StatusCode::METHOD_NOT_ALLOWED, Body::Empty);
    response
      .headers_mut()
      .insert(http::header::ALLOW, HeaderValue::try_from(allow)?);
    Ok(response)
  }
}
