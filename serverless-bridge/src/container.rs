use crate::{BoxError, Request, Response};

use async_trait::async_trait;

/// Request-processing container that the [`Shell`](crate::Shell) delegates canonical requests to.
///
/// This is the seam to whichever web framework handles routing, content negotiation, and
/// serialization. [`Router`](crate::Router) is a minimal implementation.
///
/// This trait is intended to be used with the [`#[async_trait]`](async_trait::async_trait)
/// attribute.
#[async_trait]
pub trait Container: Send + Sync {
  /// One-time startup, invoked by [`Shell::start`](crate::Shell::start).
  async fn start(&self) -> Result<(), BoxError> {
    Ok(())
  }

  /// Handle a single request.
  ///
  /// Returning an error (or panicking) results in the integration's internal server error reply.
  async fn handle(&self, request: Request) -> Result<Response, BoxError>;

  /// One-time shutdown, invoked by [`Shell::stop`](crate::Shell::stop).
  async fn stop(&self) {}
}
