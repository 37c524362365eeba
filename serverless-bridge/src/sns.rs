//! Amazon SNS notifications delivered to a Lambda function subscribed to a topic.
//!
//! Each record becomes a `POST /<topic name>[/<subject>]` request whose body is the notification
//! message. For example, a message with subject `created` published to
//! `arn:aws:sns:us-east-1:123456789012:orders` is routed to `POST /orders/created`.

use crate::codec::header::expand_headers;
use crate::codec::query::encode_path_segment;
use crate::shell::parse_event;
use crate::{
  AdapterError, Container, Entity, Integration, LambdaEvent, LifecycleError, Method, Request,
  Response, Shell,
};

pub use aws_lambda_events::sns::{MessageAttribute, SnsEvent, SnsRecord};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use std::borrow::Cow;
use std::collections::HashMap;

/// Message attribute that overrides the request `Content-Type`.
pub const CONTENT_TYPE_ATTRIBUTE: &str = "Content-Type";

/// Message attributes of the notification (e.g., `Content-Type`).
#[derive(Clone, Debug, Default)]
pub struct MessageAttributes(pub HashMap<String, MessageAttribute>);

/// Outcome of handling a single SNS record.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnsResponse {
  /// HTTP status code returned by the container.
  pub status_code: u16,
  /// HTTP reason phrase returned by the container.
  pub reason_phrase: Option<String>,
}

/// Integration for Amazon SNS records.
///
/// The record (with its message removed) and its [`MessageAttributes`] are attached to the
/// request as extensions. Use [`Shell::handle_sns_event`] or [`Shell::handle_sns_lambda_event`]
/// to process every record of an [`SnsEvent`].
#[derive(Clone, Debug)]
pub struct Sns {
  default_content_type: Cow<'static, str>,
}

impl Sns {
  /// Construct a new integration that assumes `application/json` messages.
  pub fn new() -> Self {
    Self {
      default_content_type: Cow::Borrowed("application/json"),
    }
  }

  /// Media type used for messages without a `Content-Type` message attribute.
  pub fn with_default_content_type(mut self, content_type: impl Into<Cow<'static, str>>) -> Self {
    self.default_content_type = content_type.into();
    self
  }

  fn request_uri(topic_name: &str, subject: Option<&str>) -> String {
    match subject.filter(|subject| !subject.is_empty()) {
      Some(subject) => format!(
        "/{}/{}",
        encode_path_segment(topic_name),
        encode_path_segment(subject)
      ),
      None => format!("/{}", encode_path_segment(topic_name)),
    }
  }
}

impl Default for Sns {
  fn default() -> Self {
    Self::new()
  }
}

impl Integration for Sns {
  type Event = SnsRecord;
  type Reply = SnsResponse;

  fn decode(&self, mut record: SnsRecord) -> Result<Request, AdapterError> {
    let topic_name = record
      .sns
      .topic_arn
      .rsplit(':')
      .next()
      .filter(|topic_name| !topic_name.is_empty())
      .ok_or_else(|| AdapterError::missing_field("TopicArn"))?;
    let request_uri = Self::request_uri(topic_name, record.sns.subject.as_deref());

    let content_type = match record.sns.message_attributes.get(CONTENT_TYPE_ATTRIBUTE) {
      Some(attribute) if attribute.data_type == "String" => attribute.value.as_str(),
      Some(attribute) => {
        debug!(
          "Ignoring `{CONTENT_TYPE_ATTRIBUTE}` message attribute of type `{}`",
          attribute.data_type
        );
        self.default_content_type.as_ref()
      }
      None => self.default_content_type.as_ref(),
    };
    let headers = expand_headers([(http::header::CONTENT_TYPE.as_str(), Some(content_type))]);

    let entity = Entity::from(std::mem::take(&mut record.sns.message).into_bytes());
    let attributes = MessageAttributes(record.sns.message_attributes.clone());

    let mut request = Request::new("/", request_uri, Method::POST, headers, entity);
    let extensions = request.extensions_mut();
    extensions.insert(attributes);
    extensions.insert(record);

    Ok(request)
  }

  fn encode(&self, response: Response) -> Result<SnsResponse, AdapterError> {
    let (status, reason_phrase, _, _) = response.into_parts();
    Ok(SnsResponse {
      status_code: status.as_u16(),
      reason_phrase,
    })
  }

  fn internal_server_error(&self) -> SnsResponse {
    let (status, reason_phrase, _, _) = Response::internal_server_error().into_parts();
    SnsResponse {
      status_code: status.as_u16(),
      reason_phrase,
    }
  }

  fn on_request_success(&self, reply: SnsResponse) -> SnsResponse {
    if !(200..300).contains(&reply.status_code) {
      warn!(
        "SNS notification handler returned {} {}",
        reply.status_code,
        reply.reason_phrase.as_deref().unwrap_or_default()
      );
    }
    reply
  }
}

impl<C> Shell<Sns, C>
where
  C: Container,
{
  /// Handle every record of an SNS event in order, returning one reply per record.
  pub async fn handle_sns_event(
    &self,
    event: SnsEvent,
  ) -> Result<Vec<SnsResponse>, LifecycleError> {
    let mut replies = Vec::with_capacity(event.records.len());
    for record in event.records {
      replies.push(self.handle(record).await?);
    }
    Ok(replies)
  }

  /// Handle a raw AWS Lambda SNS event, attaching the Lambda execution context to each request.
  ///
  /// A payload that isn't an SNS event results in a single failure reply.
  pub async fn handle_sns_lambda_event(
    &self,
    event: LambdaEvent<serde_json::Value>,
  ) -> Result<Vec<SnsResponse>, LifecycleError> {
    let container = self.started_container()?;
    let (payload, lambda_context) = event.into_parts();

    let records = match parse_event::<SnsEvent>(payload) {
      Ok(event) => event.records,
      Err(err) => return Ok(vec![self.integration().on_request_failure(err)]),
    };

    let mut replies = Vec::with_capacity(records.len());
    for record in records {
      replies.push(
        self
          .dispatch(container, Ok(record), Some(lambda_context.clone()))
          .await,
      );
    }
    Ok(replies)
  }
}
