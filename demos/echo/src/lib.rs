use headers::{ContentType, HeaderMapExt};
use serverless_bridge::{Body, Method, Response, Router, StatusCode};
use thiserror::Error;

use std::num::ParseIntError;

/// Request echo handlers.
pub mod echo_handler;

/// Item API implementation.
pub mod item_handler;

/// SNS notification handlers.
pub mod notification_handler;

/// SNS topic whose notifications are routed to [`notification_handler`].
pub const NOTIFICATION_TOPIC: &str = "echo-notifications";

/// Example handler error type used by each handler module.
#[derive(Debug, Error)]
pub enum HandlerError {
  #[error("invalid item ID `{0}`")]
  InvalidItemId(String, #[source] ParseIntError),
  #[error("item {0} not found")]
  ItemNotFound(u64),
  #[error("failed to parse request body")]
  RequestBodyParse(#[source] serde_json::Error),
  #[error("failed to read request body")]
  RequestBodyRead(#[source] std::io::Error),
  #[error("failed to serialize response body")]
  ResponseBodySerialize(#[source] serde_json::Error),
}

impl From<HandlerError> for Response {
  fn from(err: HandlerError) -> Self {
    let status = match err {
      HandlerError::InvalidItemId(_, _) | HandlerError::RequestBodyParse(_) => {
        StatusCode::BAD_REQUEST
      }
      HandlerError::ItemNotFound(_) => StatusCode::NOT_FOUND,
      HandlerError::RequestBodyRead(_) | HandlerError::ResponseBodySerialize(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    let mut response = Response::new(status, Body::Text(err.to_string()));
    response.headers_mut().typed_insert(ContentType::text_utf8());
    response
  }
}

/// Serialize a JSON response body with an implicit status (see [`Response::entity`]).
pub fn json_response<T>(value: &T) -> Result<Response, HandlerError>
where
  T: serde::Serialize,
{
  let body = serde_json::to_string(value).map_err(HandlerError::ResponseBodySerialize)?;
  let mut response = Response::entity(Body::Text(body));
  response.headers_mut().typed_insert(ContentType::json());
  Ok(response)
}

/// Build the router shared by every `bootstrap_*` binary.
pub fn router() -> Router {
  Router::new()
    .route(Method::GET, "/echo", echo_handler::describe_request)
    .route(Method::POST, "/echo", echo_handler::echo_body)
    .route(Method::GET, "/items/{id}", item_handler::get_item)
    .route_with_default_status(
      Method::POST,
      "/items",
      StatusCode::CREATED,
      item_handler::create_item,
    )
    .route_with_default_status(
      Method::POST,
      &format!("/{NOTIFICATION_TOPIC}/{{subject}}"),
      StatusCode::ACCEPTED,
      notification_handler::receive_notification,
    )
    .route_with_default_status(
      Method::POST,
      &format!("/{NOTIFICATION_TOPIC}"),
      StatusCode::ACCEPTED,
      notification_handler::receive_notification,
    )
}
