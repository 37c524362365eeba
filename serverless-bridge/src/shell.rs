use crate::error::format_error;
use crate::{
  AdapterError, BoxError, Container, LambdaContext, LambdaEvent, LifecycleError, Request,
  Response,
};

use backtrace::Backtrace;
use futures::FutureExt;
use log::{debug, error, info, trace};
use serde::de::DeserializeOwned;

use std::any::Any;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// Translation between one serverless platform's event/reply shapes and the canonical
/// [`Request`]/[`Response`].
///
/// Implementations are stateless apart from immutable configuration. Besides the translation
/// methods, the trait provides optional hooks that run around each invocation; the default
/// implementations are pass-through.
pub trait Integration: Send + Sync {
  /// Platform event delivered by the host (e.g., an API Gateway proxy request).
  type Event: DeserializeOwned + Debug + Send;

  /// Platform reply returned to the host.
  type Reply: Debug + Send;

  /// Convert a platform event into a canonical request.
  ///
  /// Platform context that isn't part of the canonical request (e.g., identity or stage
  /// variables) should be attached via [`Request::extensions_mut`].
  fn decode(&self, event: Self::Event) -> Result<Request, AdapterError>;

  /// Convert a canonical response into a platform reply.
  fn encode(&self, response: Response) -> Result<Self::Reply, AdapterError>;

  /// Reply returned when no response could be produced.
  fn internal_server_error(&self) -> Self::Reply;

  /// Hook invoked with each raw JSON payload before it is deserialized into
  /// [`Event`](Integration::Event).
  ///
  /// Integrations override this to drop payload entries (e.g., `null` header values) that the
  /// event type can't represent.
  fn prepare_event(&self, payload: serde_json::Value) -> serde_json::Value {
    payload
  }

  /// Hook invoked after decoding, just before the request is passed to the container.
  fn before_request(&self, request: &Request) {
    let _ = request;
  }

  /// Hook invoked with each successfully encoded reply.
  fn on_request_success(&self, reply: Self::Reply) -> Self::Reply {
    reply
  }

  /// Hook invoked whenever decoding, the container, or encoding fails.
  ///
  /// The default implementation logs the error and returns
  /// [`internal_server_error`](Integration::internal_server_error).
  fn on_request_failure(&self, err: AdapterError) -> Self::Reply {
    error!(
      "{}",
      format_error(
        &err,
        Some(&format!("AdapterError::{}", err.name())),
        err.backtrace()
      ),
    );

    self.internal_server_error()
  }
}

/// Lifecycle state of a [`Shell`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellState {
  /// No container registered.
  Uninitialized,
  /// Container registered but not started.
  Initialized,
  /// Handling events.
  Started,
  /// Shut down.
  Stopped,
}

const UNINITIALIZED: u8 = 0;
const INITIALIZED: u8 = 1;
const STARTING: u8 = 2;
const STARTED: u8 = 3;
const STOPPED: u8 = 4;

/// Entry point invoked by the serverless platform: decodes each event, passes the canonical
/// request to the container, and encodes the container's response.
///
/// The shell moves through `Uninitialized → Initialized → Started → Stopped`. The container is
/// registered exactly once and the state transitions are atomic, so a started shell may be shared
/// by concurrent invocations.
///
/// # Example
///
/// ```rust,ignore
/// let shell = Shell::new(ApiGatewayProxy::new());
/// shell.init(router)?;
/// shell.start().await?;
///
/// run_lambda(|event| shell.handle_lambda_event(event)).await
/// ```
pub struct Shell<I, C> {
  integration: I,
  container: OnceLock<C>,
  state: AtomicU8,
}

impl<I, C> Shell<I, C>
where
  I: Integration,
  C: Container,
{
  /// Construct an uninitialized shell for the specified integration.
  pub fn new(integration: I) -> Self {
    Self {
      integration,
      container: OnceLock::new(),
      state: AtomicU8::new(UNINITIALIZED),
    }
  }

  /// Integration used to translate events.
  pub fn integration(&self) -> &I {
    &self.integration
  }

  /// Current lifecycle state.
  pub fn state(&self) -> ShellState {
    match self.state.load(Ordering::Acquire) {
      UNINITIALIZED => ShellState::Uninitialized,
      INITIALIZED | STARTING => ShellState::Initialized,
      STARTED => ShellState::Started,
      _ => ShellState::Stopped,
    }
  }

  /// Register the container. May be called only once.
  pub fn init(&self, container: C) -> Result<(), LifecycleError> {
    self
      .container
      .set(container)
      .map_err(|_| LifecycleError::AlreadyInitialized)?;
    self.state.store(INITIALIZED, Ordering::Release);
    info!("Initialized shell");
    Ok(())
  }

  /// Start the container. Requires a prior call to [`init`](Shell::init) and may be called only
  /// once.
  ///
  /// If the container fails to start (or panics while starting), the shell remains initialized
  /// and `start` may be retried.
  pub async fn start(&self) -> Result<(), LifecycleError> {
    if let Err(state) = self.state.compare_exchange(
      INITIALIZED,
      STARTING,
      Ordering::AcqRel,
      Ordering::Acquire,
    ) {
      return Err(if state == UNINITIALIZED {
        LifecycleError::NotInitialized
      } else {
        LifecycleError::AlreadyStarted
      });
    }

    let Some(container) = self.container.get() else {
      self.state.store(INITIALIZED, Ordering::Release);
      return Err(LifecycleError::NotInitialized);
    };
    let started = match std::panic::AssertUnwindSafe(container.start())
      .catch_unwind()
      .await
    {
      Ok(result) => result,
      Err(panic) => Err(BoxError::from(format!(
        "container panicked while starting: {}",
        panic_string(panic)
      ))),
    };
    if let Err(err) = started {
      self.state.store(INITIALIZED, Ordering::Release);
      return Err(LifecycleError::Startup(err));
    }

    self.state.store(STARTED, Ordering::Release);
    info!("Started shell");
    Ok(())
  }

  /// Stop the container. Requires a started shell.
  pub async fn stop(&self) -> Result<(), LifecycleError> {
    self
      .state
      .compare_exchange(STARTED, STOPPED, Ordering::AcqRel, Ordering::Acquire)
      .map_err(|_| LifecycleError::NotStarted)?;

    if let Some(container) = self.container.get() {
      container.stop().await;
    }
    info!("Stopped shell");
    Ok(())
  }

  /// Handle a platform event.
  ///
  /// Any failure while decoding the event, handling the request (including panics), or encoding
  /// the response is passed to [`Integration::on_request_failure`], so the only errors returned
  /// are lifecycle errors (i.e., the shell is not started).
  pub async fn handle(&self, event: I::Event) -> Result<I::Reply, LifecycleError> {
    let container = self.started_container()?;
    Ok(self.dispatch(container, Ok(event), None).await)
  }

  /// Handle a platform event that has not yet been deserialized.
  ///
  /// A payload that doesn't match [`Integration::Event`] (e.g., `null`) results in the
  /// integration's failure reply.
  pub async fn handle_value(
    &self,
    payload: serde_json::Value,
  ) -> Result<I::Reply, LifecycleError> {
    let container = self.started_container()?;
    let event = parse_event::<I::Event>(self.integration.prepare_event(payload));
    Ok(self.dispatch(container, event, None).await)
  }

  /// Handle a raw AWS Lambda event, attaching the Lambda execution context to the request as an
  /// extension.
  pub async fn handle_lambda_event(
    &self,
    event: LambdaEvent<serde_json::Value>,
  ) -> Result<I::Reply, LifecycleError> {
    let container = self.started_container()?;
    let (payload, lambda_context) = event.into_parts();
    trace!("Lambda context: {lambda_context:#?}");
    let event = parse_event::<I::Event>(self.integration.prepare_event(payload));
    Ok(self.dispatch(container, event, Some(lambda_context)).await)
  }

  pub(crate) fn started_container(&self) -> Result<&C, LifecycleError> {
    if self.state.load(Ordering::Acquire) != STARTED {
      return Err(LifecycleError::NotStarted);
    }
    self.container.get().ok_or(LifecycleError::NotInitialized)
  }

  pub(crate) async fn dispatch(
    &self,
    container: &C,
    event: Result<I::Event, AdapterError>,
    lambda_context: Option<LambdaContext>,
  ) -> I::Reply {
    match std::panic::AssertUnwindSafe(self.process(container, event, lambda_context))
      .catch_unwind()
      .await
    {
      Ok(Ok(reply)) => self.integration.on_request_success(reply),
      Ok(Err(err)) => self.integration.on_request_failure(err),
      Err(panic) => self.integration.on_request_failure(AdapterError::Panic(
        panic_string(panic),
        // The panic doesn't give us a stack trace unless we set a panic hook, which might
        // interfere with the user's own error handling. Instead, we just capture a backtrace
        // indicating where we caught the panic.
        Backtrace::new(),
      )),
    }
  }

  async fn process(
    &self,
    container: &C,
    event: Result<I::Event, AdapterError>,
    lambda_context: Option<LambdaContext>,
  ) -> Result<I::Reply, AdapterError> {
    let event = event?;
    trace!("Event: {event:#?}");

    let mut request = self.integration.decode(event)?;
    if let Some(lambda_context) = lambda_context {
      request.extensions_mut().insert(lambda_context);
    }
    self.integration.before_request(&request);

    info!("Handling {} {}", request.method(), request.request_uri());
    debug!("Request: {request:#?}");

    let response = container
      .handle(request)
      .await
      .map_err(|err| AdapterError::Container(err, Backtrace::new()))?;
    trace!("Response: {response:#?}");

    self.integration.encode(response)
  }
}

pub(crate) fn parse_event<E>(payload: serde_json::Value) -> Result<E, AdapterError>
where
  E: DeserializeOwned,
{
  serde_path_to_error::deserialize(payload)
    .map_err(|err| AdapterError::InvalidEvent(Box::new(err), Backtrace::new()))
}

/// Extract the panic string after catching a panic.
fn panic_string(panic: Box<dyn Any + Send>) -> String {
  panic
    .downcast::<String>()
    .map(|panic| *panic)
    .or_else(|panic| panic.downcast::<&str>().map(|panic| panic.to_string()))
    .unwrap_or_else(|_| "panic payload is not a string".to_string())
}
