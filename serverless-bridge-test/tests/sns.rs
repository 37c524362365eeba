use serverless_bridge::sns::{MessageAttributes, Sns, SnsResponse};
use serverless_bridge::{
  Body, LambdaContext, LambdaEvent, Method, Response, Router, Shell, StatusCode,
};
use serverless_bridge_test::{fixture, init_logging, RecordingContainer};

use aws_lambda_events::sns::{SnsEvent, SnsRecord};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_sns_records() {
  init_logging();
  let (container, recorded) =
    RecordingContainer::new(|| Response::new(StatusCode::NO_CONTENT, Body::Empty));
  let shell = Shell::new(Sns::new());
  shell.init(container).unwrap();
  shell.start().await.unwrap();

  let replies = shell
    .handle_sns_lambda_event(LambdaEvent::new(
      fixture("sns_notification"),
      LambdaContext::default(),
    ))
    .await
    .unwrap();
  assert_eq!(
    replies,
    vec![
      SnsResponse {
        status_code: 204,
        reason_phrase: Some("No Content".to_string()),
      };
      2
    ]
  );

  let requests = recorded.take();
  assert_eq!(requests.len(), 2);

  let first = &requests[0];
  assert_eq!(first.method, Method::POST);
  assert_eq!(first.base_uri, "/");
  assert_eq!(first.request_uri, "/sns-lambda/TestInvoke");
  assert_eq!(first.headers.get("content-type").unwrap(), "text/plain");
  assert_eq!(first.body, b"Hello from SNS!");
  let record = first.extensions.get::<SnsRecord>().unwrap();
  assert_eq!(record.sns.message_id, "95df01b4-ee98-5cb9-9903-4c221d41eb5e");
  assert_eq!(record.sns.message, "");
  let attributes = first.extensions.get::<MessageAttributes>().unwrap();
  assert_eq!(attributes.0["Test"].value, "TestString");
  assert!(first.extensions.get::<LambdaContext>().is_some());

  let second = &requests[1];
  assert_eq!(second.request_uri, "/sns-lambda");
  assert_eq!(
    second.headers.get("content-type").unwrap(),
    "application/json"
  );
  assert_eq!(second.body, b"{\"id\":5}");
}

#[tokio::test]
async fn test_sns_typed_event_with_router() {
  init_logging();
  let shell = Shell::new(Sns::new());
  shell
    .init(Router::new().route(
      Method::POST,
      "/sns-lambda/{subject}",
      |_, params| async move {
        Ok(Response::entity(Body::Text(
          params.get("subject").unwrap_or_default().to_string(),
        )))
      },
    ))
    .unwrap();
  shell.start().await.unwrap();

  let event: SnsEvent = serde_json::from_value(fixture("sns_notification")).unwrap();
  let replies = shell.handle_sns_event(event).await.unwrap();
  assert_eq!(
    replies,
    vec![
      SnsResponse {
        status_code: 200,
        reason_phrase: Some("OK".to_string()),
      },
      SnsResponse {
        status_code: 404,
        reason_phrase: Some("Not Found".to_string()),
      },
    ]
  );
}

#[tokio::test]
async fn test_sns_malformed_event() {
  init_logging();
  let (container, recorded) =
    RecordingContainer::new(|| Response::new(StatusCode::OK, Body::Empty));
  let shell = Shell::new(Sns::new());
  shell.init(container).unwrap();
  shell.start().await.unwrap();

  let replies = shell
    .handle_sns_lambda_event(LambdaEvent::new(
      serde_json::json!({"Records": "not a list"}),
      LambdaContext::default(),
    ))
    .await
    .unwrap();
  assert_eq!(
    replies,
    vec![SnsResponse {
      status_code: 500,
      reason_phrase: Some("Internal Server Error".to_string()),
    }]
  );
  assert!(recorded.take().is_empty());
}
