// Until std::error::Backtrace is fully stabilized, we can't embed a type named `Backtrace` within
// a thiserror::Error (see https://github.com/dtolnay/thiserror/issues/204).
use backtrace::Backtrace as _Backtrace;
use itertools::Itertools;
use thiserror::Error;

use std::borrow::Cow;
use std::string::FromUtf8Error;

/// Boxed error returned by a [`Container`](crate::Container).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error that occurred while translating a platform event or invoking the container.
///
/// Every variant results in the integration's internal server error reply (see
/// [`Integration::on_request_failure`](crate::Integration::on_request_failure)). None of these
/// errors are retried.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AdapterError {
  /// Container failed to handle the request.
  #[error("container failed to handle request")]
  Container(#[source] BoxError, _Backtrace),
  /// Failed to base64-encode the response body.
  #[error("failed to base64-encode response body")]
  EncodeBody(#[source] Box<std::io::Error>, _Backtrace),
  /// Platform event could not be deserialized (e.g., a `null` payload).
  #[error("failed to deserialize platform event")]
  InvalidEvent(
    #[source] Box<serde_path_to_error::Error<serde_json::Error>>,
    _Backtrace,
  ),
  /// Response body is not valid UTF-8 and the platform reply only supports text.
  #[error("response body must be UTF-8 encoded")]
  InvalidBodyUtf8(#[source] Box<FromUtf8Error>, _Backtrace),
  /// Platform event contains an invalid HTTP method.
  #[error("invalid HTTP method `{0}`")]
  InvalidMethod(
    String,
    #[source] Box<http::method::InvalidMethod>,
    _Backtrace,
  ),
  /// Platform event is missing a required field.
  #[error("platform event is missing required field `{0}`")]
  MissingEventField(Cow<'static, str>, _Backtrace),
  /// Container panicked while handling the request.
  #[error("container panicked: {0}")]
  Panic(String, _Backtrace),
}

impl AdapterError {
  /// Return the backtrace associated with the error, if known.
  pub fn backtrace(&self) -> Option<&_Backtrace> {
    match self {
      AdapterError::Container(_, backtrace)
      | AdapterError::EncodeBody(_, backtrace)
      | AdapterError::InvalidEvent(_, backtrace)
      | AdapterError::InvalidBodyUtf8(_, backtrace)
      | AdapterError::InvalidMethod(_, _, backtrace)
      | AdapterError::MissingEventField(_, backtrace)
      | AdapterError::Panic(_, backtrace) => Some(backtrace),
    }
  }

  /// Return the name of the error variant (e.g., `MissingEventField`).
  pub fn name(&self) -> &str {
    match self {
      AdapterError::Container(_, _) => "Container",
      AdapterError::EncodeBody(_, _) => "EncodeBody",
      AdapterError::InvalidEvent(_, _) => "InvalidEvent",
      AdapterError::InvalidBodyUtf8(_, _) => "InvalidBodyUtf8",
      AdapterError::InvalidMethod(_, _, _) => "InvalidMethod",
      AdapterError::MissingEventField(_, _) => "MissingEventField",
      AdapterError::Panic(_, _) => "Panic",
    }
  }

  pub(crate) fn missing_field(field: &'static str) -> Self {
    AdapterError::MissingEventField(Cow::Borrowed(field), _Backtrace::new())
  }

  pub(crate) fn invalid_method(method: &str, err: http::method::InvalidMethod) -> Self {
    AdapterError::InvalidMethod(method.to_owned(), Box::new(err), _Backtrace::new())
  }
}

/// Misuse of the [`Shell`](crate::Shell) lifecycle.
///
/// These are programming errors and are returned to the caller instead of being translated into a
/// platform reply.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LifecycleError {
  /// `init()` was called more than once.
  #[error("shell is already initialized")]
  AlreadyInitialized,
  /// `start()` was called more than once.
  #[error("shell is already started")]
  AlreadyStarted,
  /// `start()` was called before `init()`.
  #[error("shell is not initialized")]
  NotInitialized,
  /// An event was handled (or `stop()` was called) while the shell was not started.
  #[error("shell is not started")]
  NotStarted,
  /// The container failed to start.
  #[error("container failed to start")]
  Startup(#[source] BoxError),
}

/// Helper function for formatting an error as a string containing a human-readable chain of causes.
///
/// This function will walk over the chain of causes returned by
/// [`Error::source`](std::error::Error::source) and append each underlying error (using the
/// [`Display`](std::fmt::Display) trait).
///
/// # Arguments
///
/// * `err` - Error to format.
/// * `name` - Optional name of the error type/variant (e.g., `AdapterError::MissingEventField`).
/// * `backtrace` - Optional [`Backtrace`](backtrace::Backtrace) indicating where the top-level
///   error occurred.
pub fn format_error(
  err: &dyn std::error::Error,
  name: Option<&str>,
  backtrace: Option<&_Backtrace>,
) -> String {
  let err_line = name
    .map(|n| format!("{}: {}", n, err))
    .unwrap_or_else(|| err.to_string());

  let top_error = if let Some(bt) = backtrace {
    format!("{err_line}\n  stack trace:\n{}", format_backtrace(bt, 4))
  } else {
    err_line
  };

  let cause_str = ErrorCauseIterator(err.source())
    .map(|cause| format!("  caused by: {cause}"))
    .join("\n");

  if !cause_str.is_empty() {
    format!("{top_error}\n{cause_str}")
  } else {
    top_error
  }
}

struct ErrorCauseIterator<'a>(Option<&'a (dyn std::error::Error + 'static)>);

impl<'a> Iterator for ErrorCauseIterator<'a> {
  type Item = &'a (dyn std::error::Error + 'static);

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.0;
    self.0 = current.and_then(|err| err.source());
    current
  }
}

fn format_backtrace(backtrace: &_Backtrace, indent: usize) -> String {
  let indent_str = " ".repeat(indent);
  format!("{backtrace:?}")
    .lines()
    .map(|line| format!("{indent_str}{line}"))
    .join("\n")
}
