use serverless_bridge::apigw::ApiGatewayProxy;
use serverless_bridge::service::{Service, ServiceRequest};
use serverless_bridge::{Body, LifecycleError, Response, Shell, ShellState, StatusCode};
use serverless_bridge_test::{
  fixture, init_logging, FailingContainer, PanickingContainer, PanickingStartContainer,
  RecordingContainer, UnstartableContainer,
};

use pretty_assertions::assert_eq;

fn ok() -> Response {
  Response::new(StatusCode::OK, Body::Empty)
}

#[tokio::test]
async fn test_lifecycle_transitions() {
  init_logging();
  let shell = Shell::new(ApiGatewayProxy::new());
  assert_eq!(shell.state(), ShellState::Uninitialized);

  assert!(matches!(
    shell.start().await,
    Err(LifecycleError::NotInitialized)
  ));

  let (container, _) = RecordingContainer::new(ok);
  shell.init(container).unwrap();
  assert_eq!(shell.state(), ShellState::Initialized);

  let (second, _) = RecordingContainer::new(ok);
  assert!(matches!(
    shell.init(second),
    Err(LifecycleError::AlreadyInitialized)
  ));

  assert!(matches!(
    shell.handle_value(fixture("apigw_get_items")).await,
    Err(LifecycleError::NotStarted)
  ));

  shell.start().await.unwrap();
  assert_eq!(shell.state(), ShellState::Started);
  assert!(matches!(
    shell.start().await,
    Err(LifecycleError::AlreadyStarted)
  ));

  let reply = shell
    .handle_value(fixture("apigw_get_items"))
    .await
    .unwrap();
  assert_eq!(reply.status_code, 200);

  shell.stop().await.unwrap();
  assert_eq!(shell.state(), ShellState::Stopped);
  assert!(matches!(shell.stop().await, Err(LifecycleError::NotStarted)));
  assert!(matches!(
    shell.handle_value(fixture("apigw_get_items")).await,
    Err(LifecycleError::NotStarted)
  ));
}

#[tokio::test]
async fn test_startup_failure() {
  init_logging();
  let shell = Shell::new(ApiGatewayProxy::new());
  shell.init(UnstartableContainer).unwrap();

  let err = shell.start().await.unwrap_err();
  assert!(matches!(
    err,
    LifecycleError::Startup(ref cause) if cause.to_string() == "missing configuration"
  ));
  assert_eq!(shell.state(), ShellState::Initialized);
}

#[tokio::test]
async fn test_startup_panic() {
  init_logging();
  let shell = Shell::new(ApiGatewayProxy::new());
  shell.init(PanickingStartContainer::default()).unwrap();

  let err = shell.start().await.unwrap_err();
  assert!(matches!(
    err,
    LifecycleError::Startup(ref cause)
      if cause.to_string() == "container panicked while starting: startup panicked"
  ));
  assert_eq!(shell.state(), ShellState::Initialized);

  // A panicking startup can be retried.
  shell.start().await.unwrap();
  assert_eq!(shell.state(), ShellState::Started);
  let reply = shell
    .handle_value(fixture("apigw_get_items"))
    .await
    .unwrap();
  assert_eq!(reply.status_code, 204);
}

#[tokio::test]
async fn test_downstream_failure() {
  init_logging();
  let shell = Shell::new(ApiGatewayProxy::new());
  shell.init(FailingContainer).unwrap();
  shell.start().await.unwrap();

  let reply = shell
    .handle_value(fixture("apigw_get_items"))
    .await
    .unwrap();
  assert_eq!(reply.status_code, 500);
  assert!(reply.body.is_none());
  assert!(reply.headers.is_empty());
  assert!(reply.multi_value_headers.is_empty());
}

#[tokio::test]
async fn test_downstream_panic() {
  init_logging();
  let shell = Shell::new(ApiGatewayProxy::new());
  shell.init(PanickingContainer).unwrap();
  shell.start().await.unwrap();

  let reply = shell
    .handle_value(fixture("apigw_get_items"))
    .await
    .unwrap();
  assert_eq!(reply.status_code, 500);
  assert!(reply.body.is_none());

  // The shell keeps serving after a panic.
  let reply = shell
    .handle_value(fixture("apigw_get_items"))
    .await
    .unwrap();
  assert_eq!(reply.status_code, 500);
}

#[tokio::test]
async fn test_null_event() {
  init_logging();
  let shell = Shell::new(Service::new());
  let (container, recorded) = RecordingContainer::new(ok);
  shell.init(container).unwrap();
  shell.start().await.unwrap();

  let reply = shell.handle_value(serde_json::Value::Null).await.unwrap();
  assert_eq!(reply.status_code, 500);
  assert_eq!(reply.reason_phrase.as_deref(), Some("Internal Server Error"));
  assert!(reply.body.is_none());
  assert!(recorded.take().is_empty());
}

#[tokio::test]
async fn test_typed_event() {
  init_logging();
  let shell = Shell::new(Service::new());
  let (container, recorded) = RecordingContainer::new(ok);
  shell.init(container).unwrap();
  shell.start().await.unwrap();

  let reply = shell
    .handle(ServiceRequest {
      http_method: Some("DELETE".to_string()),
      request_uri: Some("/items/5".to_string()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(reply.status_code, 200);
  assert_eq!(recorded.take().remove(0).request_uri, "/items/5");
}
