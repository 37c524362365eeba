use crate::LifecycleError;

use lambda_runtime::{service_fn, LambdaEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;

use std::future::Future;

/// Start the AWS Lambda runtime and pass each invocation to the specified dispatch function.
///
/// The dispatch function is typically one of the [`Shell`](crate::Shell) handler methods. A
/// [`LifecycleError`] (e.g., the shell was never started) is reported to Lambda as a function
/// error; every other failure has already been translated into a platform reply by the shell.
///
/// # Example
///
/// ```rust,ignore
/// use serverless_bridge::apigw::ApiGatewayProxy;
/// use serverless_bridge::{run_lambda, Router, Shell};
///
/// #[tokio::main]
/// pub async fn main() -> Result<(), lambda_runtime::Error> {
///   let shell = Shell::new(ApiGatewayProxy::new());
///   shell.init(Router::new())?;
///   shell.start().await?;
///
///   run_lambda(|event| shell.handle_lambda_event(event)).await
/// }
/// ```
pub async fn run_lambda<E, R, F, Fut>(mut dispatch_event: F) -> Result<(), lambda_runtime::Error>
where
  E: DeserializeOwned,
  R: Serialize,
  F: FnMut(LambdaEvent<E>) -> Fut,
  Fut: Future<Output = Result<R, LifecycleError>>,
{
  lambda_runtime::run(service_fn(|event: LambdaEvent<E>| dispatch_event(event))).await
}
