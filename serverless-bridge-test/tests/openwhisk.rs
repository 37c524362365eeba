use serverless_bridge::openwhisk::{WebAction, WebActionParameters, WebActionUser};
use serverless_bridge::{Body, HeaderValue, Method, Response, Shell, StatusCode};
use serverless_bridge_test::{fixture, init_logging, FailingContainer, RecordingContainer};

use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_web_action_round_trip() {
  init_logging();
  let (container, recorded) = RecordingContainer::new(|| {
    let mut response = Response::new(StatusCode::CREATED, Body::Text("{\"id\":5}".to_string()));
    response.headers_mut().insert(
      "content-type",
      HeaderValue::from_static("application/json"),
    );
    response
  });
  let shell = Shell::new(WebAction::new());
  shell.init(container).unwrap();
  shell.start().await.unwrap();

  let reply = shell
    .handle_value(fixture("openwhisk_web_action"))
    .await
    .unwrap();
  assert_eq!(
    serde_json::to_value(reply).unwrap(),
    json!({
      "statusCode": 201,
      "headers": {"content-type": "application/json"},
      "body": "{\"id\":5}"
    })
  );

  let request = recorded.take().remove(0);
  assert_eq!(request.method, Method::POST);
  assert_eq!(request.base_uri, "/");
  assert_eq!(request.request_uri, "/items?notify=true&tag=a%20b");
  assert_eq!(request.headers.get("accept").unwrap(), "application/json");
  assert_eq!(request.body, b"{\"name\":\"widget\"}");
  assert_eq!(
    request.extensions.get::<WebActionUser>(),
    Some(&WebActionUser(
      "23bc46b1-71f6-4ed5-8c54-816aa4f8c502".to_string()
    ))
  );
  assert_eq!(
    request.extensions.get::<WebActionParameters>().unwrap().0["region"],
    "eu-de"
  );
}

#[tokio::test]
async fn test_web_action_binary_response() {
  init_logging();
  let (container, _) = RecordingContainer::new(|| {
    let mut response = Response::new(StatusCode::OK, Body::Binary(vec![1, 2, 3]));
    response.headers_mut().insert(
      "content-type",
      HeaderValue::from_static("application/octet-stream"),
    );
    response
  });
  let shell = Shell::new(WebAction::new());
  shell.init(container).unwrap();
  shell.start().await.unwrap();

  let reply = shell
    .handle_value(fixture("openwhisk_web_action"))
    .await
    .unwrap();
  assert_eq!(reply.status_code, 200);
  assert_eq!(reply.body.as_deref(), Some("AQID"));
}

#[tokio::test]
async fn test_web_action_failure() {
  init_logging();
  let shell = Shell::new(WebAction::new());
  shell.init(FailingContainer).unwrap();
  shell.start().await.unwrap();

  let reply = shell
    .handle_value(fixture("openwhisk_web_action"))
    .await
    .unwrap();
  assert_eq!(
    serde_json::to_value(reply).unwrap(),
    json!({"statusCode": 500, "headers": {}, "body": null})
  );
}
