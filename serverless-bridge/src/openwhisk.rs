//! Apache OpenWhisk raw HTTP web actions.

use crate::codec::binary::{content_type, decode_entity, encode_body, is_textual_media_type};
use crate::codec::header::{expand_headers, flatten_headers};
use crate::{AdapterError, Body, Integration, Method, Request, Response};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::collections::HashMap;

/// Web action invocation with raw HTTP handling enabled.
///
/// Any action parameters besides the `__ow_*` fields are collected into
/// [`params`](WebActionRequest::params).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct WebActionRequest {
  /// Lower-case HTTP method (e.g., `get`).
  #[serde(rename = "__ow_method")]
  pub method: Option<String>,
  /// HTTP request headers.
  #[serde(rename = "__ow_headers", default)]
  pub headers: Option<IndexMap<String, Option<String>>>,
  /// Unmatched path of the web action request (`""` for the action root).
  #[serde(rename = "__ow_path")]
  pub path: Option<String>,
  /// Namespace of the authenticated subject, if the action requires authentication.
  #[serde(rename = "__ow_user", default)]
  pub user: Option<String>,
  /// Request body, base64-encoded unless the content is text.
  #[serde(rename = "__ow_body", default)]
  pub body: Option<String>,
  /// Raw (still percent-encoded) query string without the leading `?`.
  #[serde(rename = "__ow_query", default)]
  pub query: Option<String>,
  /// Remaining action parameters.
  #[serde(flatten)]
  pub params: Map<String, Value>,
}

/// Web action result.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebActionResponse {
  /// HTTP status code.
  pub status_code: u16,
  /// HTTP response headers, with multiple values joined by `,`.
  pub headers: HashMap<String, String>,
  /// Response body, base64-encoded unless the response `Content-Type` is textual.
  pub body: Option<String>,
}

/// Namespace of the authenticated subject (`__ow_user`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebActionUser(pub String);

/// Action parameters other than the `__ow_*` fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WebActionParameters(pub Map<String, Value>);

/// Integration for OpenWhisk raw HTTP web actions.
///
/// The base URI is always `/`.
#[derive(Clone, Debug, Default)]
pub struct WebAction;

impl WebAction {
  /// Construct a new integration.
  pub fn new() -> Self {
    Self
  }
}

impl Integration for WebAction {
  type Event = WebActionRequest;
  type Reply = WebActionResponse;

  fn decode(&self, event: WebActionRequest) -> Result<Request, AdapterError> {
    let path = event
      .path
      .ok_or_else(|| AdapterError::missing_field("__ow_path"))?;
    let method_name = event
      .method
      .ok_or_else(|| AdapterError::missing_field("__ow_method"))?
      .to_uppercase();
    let method = Method::from_bytes(method_name.as_bytes())
      .map_err(|err| AdapterError::invalid_method(&method_name, err))?;

    let mut request_uri = if path.starts_with('/') {
      path
    } else {
      format!("/{path}")
    };
    if let Some(query) = event.query.as_deref().filter(|query| !query.is_empty()) {
      request_uri.push('?');
      request_uri.push_str(query);
    }

    let headers = expand_headers(event.headers.unwrap_or_default());

    // Text and form bodies arrive verbatim; everything else is base64-encoded.
    let base64_encoded = content_type(&headers)
      .map(|media_type| {
        media_type.type_() != mime::TEXT && media_type.subtype() != mime::WWW_FORM_URLENCODED
      })
      .unwrap_or(false);
    let entity = decode_entity(
      event.body.map(String::into_bytes).unwrap_or_default(),
      base64_encoded,
    );

    let mut request = Request::new("/", request_uri, method, headers, entity);
    let extensions = request.extensions_mut();
    if let Some(user) = event.user {
      extensions.insert(WebActionUser(user));
    }
    extensions.insert(WebActionParameters(event.params));

    Ok(request)
  }

  fn encode(&self, response: Response) -> Result<WebActionResponse, AdapterError> {
    let base64 = match content_type(response.headers()) {
      Some(media_type) => !is_textual_media_type(&media_type),
      None => matches!(response.body(), Body::Binary(_)),
    };
    let (status, _, headers, body) = response.into_parts();

    Ok(WebActionResponse {
      status_code: status.as_u16(),
      headers: flatten_headers(&headers, |_| true),
      body: encode_body(body, base64)?,
    })
  }

  fn internal_server_error(&self) -> WebActionResponse {
    WebActionResponse {
      status_code: http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
      headers: HashMap::new(),
      body: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{WebAction, WebActionParameters, WebActionRequest, WebActionUser};
  use crate::{AdapterError, Body, Integration, Method, Response, StatusCode};

  use pretty_assertions::assert_eq;
  use serde_json::json;

  fn request(value: serde_json::Value) -> WebActionRequest {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_decode() {
    let mut request = WebAction::new()
      .decode(request(json!({
        "__ow_method": "post",
        "__ow_headers": {"content-type": "application/json", "x-null": null},
        "__ow_path": "/items",
        "__ow_user": "guest",
        "__ow_body": "eyJpZCI6NX0=",
        "__ow_query": "sort=name%20asc&limit=5",
        "region": "eu"
      })))
      .unwrap();

    assert_eq!(request.base_uri(), "/");
    assert_eq!(request.method(), Method::POST);
    assert_eq!(request.request_uri(), "/items?sort=name%20asc&limit=5");
    assert!(!request.headers().contains_key("x-null"));
    assert_eq!(
      request.extensions().get::<WebActionUser>(),
      Some(&WebActionUser("guest".to_string()))
    );
    assert_eq!(
      request.extensions().get::<WebActionParameters>().unwrap().0["region"],
      "eu"
    );
    assert_eq!(request.read_body().unwrap(), b"{\"id\":5}");
  }

  #[test]
  fn test_decode_text_body_and_root_path() {
    let mut request = WebAction::new()
      .decode(request(json!({
        "__ow_method": "put",
        "__ow_headers": {"content-type": "text/plain; charset=utf-8"},
        "__ow_path": "",
        "__ow_body": "hello",
        "__ow_query": ""
      })))
      .unwrap();

    assert_eq!(request.method(), Method::PUT);
    assert_eq!(request.request_uri(), "/");
    assert_eq!(request.read_body().unwrap(), b"hello");
  }

  #[test]
  fn test_decode_missing_fields() {
    let err = WebAction::new()
      .decode(request(json!({"__ow_method": "get"})))
      .unwrap_err();
    assert!(matches!(err, AdapterError::MissingEventField(ref field, _) if field == "__ow_path"));

    let err = WebAction::new()
      .decode(request(json!({"__ow_path": "/"})))
      .unwrap_err();
    assert!(matches!(err, AdapterError::MissingEventField(ref field, _) if field == "__ow_method"));
  }

  #[test]
  fn test_encode() {
    let mut json_response =
      Response::new(StatusCode::CREATED, Body::Text("{\"id\":5}".to_string()));
    json_response
      .headers_mut()
      .insert("content-type", "application/json".parse().unwrap());
    let reply = WebAction::new().encode(json_response).unwrap();
    assert_eq!(reply.status_code, 201);
    assert_eq!(reply.headers["content-type"], "application/json");
    assert_eq!(reply.body.as_deref(), Some("{\"id\":5}"));

    let mut png_response = Response::new(StatusCode::OK, Body::Binary(vec![0x89, 0x50]));
    png_response
      .headers_mut()
      .insert("content-type", "image/png".parse().unwrap());
    let reply = WebAction::new().encode(png_response).unwrap();
    assert_eq!(reply.body.as_deref(), Some("iVA="));
  }
}
