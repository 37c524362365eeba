//! Shared fixtures and test containers for the `serverless-bridge` integration tests.

use serverless_bridge::async_trait::async_trait;
use serverless_bridge::{BoxError, Container, Extensions, HeaderMap, Method, Request, Response};

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Initialize `env_logger` for a test (only the first call has any effect).
pub fn init_logging() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Load a JSON event from the `fixtures` directory.
pub fn fixture(name: &str) -> serde_json::Value {
  let path = Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("fixtures")
    .join(format!("{name}.json"));
  let contents = std::fs::read_to_string(&path)
    .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
  serde_json::from_str(&contents)
    .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()))
}

/// Snapshot of a canonical request as seen by a container.
#[derive(Debug)]
pub struct RecordedRequest {
  pub method: Method,
  pub base_uri: String,
  pub request_uri: String,
  pub relative_path: String,
  pub headers: HeaderMap,
  pub body: Vec<u8>,
  pub extensions: Extensions,
}

/// Requests recorded by a [`RecordingContainer`].
#[derive(Clone, Debug, Default)]
pub struct Recorded(Arc<Mutex<Vec<RecordedRequest>>>);

impl Recorded {
  /// Remove and return every request recorded so far.
  pub fn take(&self) -> Vec<RecordedRequest> {
    std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
  }
}

/// Container that records each request and replies with a fixed response.
///
/// Failing to read the request entity (e.g., malformed base64) is returned as a container error.
pub struct RecordingContainer {
  recorded: Recorded,
  respond: Box<dyn Fn() -> Response + Send + Sync>,
}

impl RecordingContainer {
  pub fn new<F>(respond: F) -> (Self, Recorded)
  where
    F: Fn() -> Response + Send + Sync + 'static,
  {
    let recorded = Recorded::default();
    (
      Self {
        recorded: recorded.clone(),
        respond: Box::new(respond),
      },
      recorded,
    )
  }
}

#[async_trait]
impl Container for RecordingContainer {
  async fn handle(&self, mut request: Request) -> Result<Response, BoxError> {
    let body = request.read_body()?;
    let recorded = RecordedRequest {
      method: request.method().clone(),
      base_uri: request.base_uri().to_owned(),
      request_uri: request.request_uri().to_owned(),
      relative_path: request.relative_path().to_owned(),
      headers: request.headers().clone(),
      body,
      extensions: request.extensions().clone(),
    };
    self
      .recorded
      .0
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(recorded);
    Ok((self.respond)())
  }
}

/// Container whose handler always fails.
pub struct FailingContainer;

#[async_trait]
impl Container for FailingContainer {
  async fn handle(&self, _request: Request) -> Result<Response, BoxError> {
    Err("downstream failure".into())
  }
}

/// Container whose handler always panics.
pub struct PanickingContainer;

#[async_trait]
impl Container for PanickingContainer {
  async fn handle(&self, _request: Request) -> Result<Response, BoxError> {
    panic!("handler panicked")
  }
}

/// Container that fails to start.
pub struct UnstartableContainer;

#[async_trait]
impl Container for UnstartableContainer {
  async fn start(&self) -> Result<(), BoxError> {
    Err("missing configuration".into())
  }

  async fn handle(&self, _request: Request) -> Result<Response, BoxError> {
    unreachable!("container never starts")
  }
}

/// Container that panics the first time it is started and starts normally afterward.
#[derive(Default)]
pub struct PanickingStartContainer {
  panicked: AtomicBool,
}

#[async_trait]
impl Container for PanickingStartContainer {
  async fn start(&self) -> Result<(), BoxError> {
    if !self.panicked.swap(true, Ordering::SeqCst) {
      panic!("startup panicked");
    }
    Ok(())
  }

  async fn handle(&self, _request: Request) -> Result<Response, BoxError> {
    Ok(Response::new(
      serverless_bridge::StatusCode::NO_CONTENT,
      serverless_bridge::Body::Empty,
    ))
  }
}
