//! Direct AWS service invocations (e.g., `lambda:Invoke` from another service or an API Gateway
//! non-proxy integration with a mapping template).

use crate::codec::binary::encode_body;
use crate::codec::header::{collect_headers, multi_value_headers};
use crate::{AdapterError, Entity, Integration, Method, Request, Response};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Invocation payload of a direct service call.
///
/// Header values are multi-valued; `null` value lists and `null` elements are ignored.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
  /// HTTP method (e.g., `GET`).
  pub http_method: Option<String>,
  /// Request path and query (e.g., `/items?id=5`).
  pub request_uri: Option<String>,
  /// HTTP request headers.
  #[serde(default)]
  pub headers: Option<IndexMap<String, Option<Vec<Option<String>>>>>,
  /// Request body.
  #[serde(default)]
  pub body: Option<String>,
}

/// Reply to a direct service call.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
  /// HTTP status code.
  pub status_code: u16,
  /// HTTP reason phrase (e.g., `Not Found`).
  pub reason_phrase: Option<String>,
  /// HTTP response headers.
  pub headers: IndexMap<String, Vec<String>>,
  /// Response body, or `None` if the response has no body.
  pub body: Option<String>,
}

/// Integration for direct service invocations carrying a [`ServiceRequest`].
///
/// The base URI is always `/`.
#[derive(Clone, Debug, Default)]
pub struct Service;

impl Service {
  /// Construct a new integration.
  pub fn new() -> Self {
    Self
  }
}

impl Integration for Service {
  type Event = ServiceRequest;
  type Reply = ServiceResponse;

  fn decode(&self, event: ServiceRequest) -> Result<Request, AdapterError> {
    let request_uri = event
      .request_uri
      .ok_or_else(|| AdapterError::missing_field("requestUri"))?;
    let http_method = event
      .http_method
      .ok_or_else(|| AdapterError::missing_field("httpMethod"))?;
    let method = Method::from_bytes(http_method.as_bytes())
      .map_err(|err| AdapterError::invalid_method(&http_method, err))?;

    let headers = collect_headers(event.headers.unwrap_or_default());
    let entity = event
      .body
      .map(|body| Entity::from(body.into_bytes()))
      .unwrap_or_default();

    Ok(Request::new("/", request_uri, method, headers, entity))
  }

  fn encode(&self, response: Response) -> Result<ServiceResponse, AdapterError> {
    let (status, reason_phrase, headers, body) = response.into_parts();
    Ok(ServiceResponse {
      status_code: status.as_u16(),
      reason_phrase,
      headers: multi_value_headers(&headers),
      body: encode_body(body, false)?,
    })
  }

  fn internal_server_error(&self) -> ServiceResponse {
    let (status, reason_phrase, _, _) = Response::internal_server_error().into_parts();
    ServiceResponse {
      status_code: status.as_u16(),
      reason_phrase,
      headers: IndexMap::new(),
      body: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{Service, ServiceRequest, ServiceResponse};
  use crate::{AdapterError, Body, Integration, Method, Response, StatusCode};

  use indexmap::IndexMap;
  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn test_decode() {
    let event: ServiceRequest = serde_json::from_value(json!({
      "httpMethod": "PUT",
      "requestUri": "/items/5?dry_run=true",
      "headers": {
        "Accept": ["application/json", null, "text/plain"],
        "X-Null": null
      },
      "body": "{\"name\":\"widget\"}"
    }))
    .unwrap();

    let mut request = Service::new().decode(event).unwrap();
    assert_eq!(request.base_uri(), "/");
    assert_eq!(request.request_uri(), "/items/5?dry_run=true");
    assert_eq!(request.method(), Method::PUT);
    assert_eq!(
      request
        .headers()
        .get_all("accept")
        .iter()
        .collect::<Vec<_>>(),
      vec!["application/json", "text/plain"]
    );
    assert!(!request.headers().contains_key("x-null"));
    assert_eq!(request.read_body().unwrap(), b"{\"name\":\"widget\"}");
  }

  #[test]
  fn test_decode_missing_fields() {
    let err = Service::new()
      .decode(ServiceRequest {
        http_method: Some("GET".to_string()),
        ..Default::default()
      })
      .unwrap_err();
    assert!(matches!(err, AdapterError::MissingEventField(ref field, _) if field == "requestUri"));

    let err = Service::new()
      .decode(ServiceRequest {
        request_uri: Some("/".to_string()),
        ..Default::default()
      })
      .unwrap_err();
    assert!(matches!(err, AdapterError::MissingEventField(ref field, _) if field == "httpMethod"));

    let err = Service::new()
      .decode(ServiceRequest {
        http_method: Some("G E T".to_string()),
        request_uri: Some("/".to_string()),
        ..Default::default()
      })
      .unwrap_err();
    assert_eq!(err.name(), "InvalidMethod");
  }

  #[test]
  fn test_encode() {
    let mut response =
      Response::new(StatusCode::NOT_FOUND, Body::Text("missing".to_string()));
    response
      .headers_mut()
      .append("x-trace", "a".parse().unwrap());
    response
      .headers_mut()
      .append("x-trace", "b".parse().unwrap());

    assert_eq!(
      Service::new().encode(response).unwrap(),
      ServiceResponse {
        status_code: 404,
        reason_phrase: Some("Not Found".to_string()),
        headers: IndexMap::from([(
          "x-trace".to_string(),
          vec!["a".to_string(), "b".to_string()]
        )]),
        body: Some("missing".to_string()),
      }
    );
  }

  #[test]
  fn test_internal_server_error() {
    assert_eq!(
      serde_json::to_value(Service::new().internal_server_error()).unwrap(),
      json!({
        "statusCode": 500,
        "reasonPhrase": "Internal Server Error",
        "headers": {},
        "body": null
      })
    );
  }
}
