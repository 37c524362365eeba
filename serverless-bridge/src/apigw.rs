//! Amazon API Gateway REST API Lambda proxy integration.

use crate::base_path::resolve_base_path;
use crate::codec::binary::{decode_entity, encode_body, is_binary_response};
use crate::codec::header::{expand_headers, flatten_headers};
use crate::codec::query::append_query;
use crate::{
  AdapterError, ApiGatewayProxyRequestContext, Body, HeaderMap, Integration, Request, Response,
};

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use log::debug;
use serde_json::{Map, Value};

use std::collections::HashMap;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

// Event maps whose entries `ApiGatewayProxyRequest` can't deserialize when `null`.
const NULLABLE_EVENT_MAPS: [&str; 6] = [
  "headers",
  "multiValueHeaders",
  "queryStringParameters",
  "multiValueQueryStringParameters",
  "pathParameters",
  "stageVariables",
];

/// Path parameters matched by API Gateway (e.g., `{"proxy": "items/5"}`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParameters(pub HashMap<String, String>);

/// Stage variables of the API Gateway deployment stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageVariables(pub HashMap<String, String>);

/// Resource template that matched the request (e.g., `/a/b/{proxy+}`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource(pub String);

/// Caller identity established by an API Gateway authorizer.
#[derive(Clone, Debug, PartialEq)]
pub enum Principal {
  /// Amazon Cognito user pool authorizer.
  CognitoUserPool {
    /// The `sub` claim identifying the user.
    subject: String,
    /// All claims of the user's identity token.
    claims: Map<String, Value>,
  },
  /// Lambda (custom) authorizer.
  Custom {
    /// The `principalId` returned by the authorizer.
    principal_id: String,
    /// Additional context returned by the authorizer.
    context: Map<String, Value>,
  },
}

impl Principal {
  /// Name identifying the principal (the Cognito `sub` claim or the custom `principalId`).
  pub fn name(&self) -> &str {
    match self {
      Principal::CognitoUserPool { subject, .. } => subject,
      Principal::Custom { principal_id, .. } => principal_id,
    }
  }

  /// Extract the principal from an API Gateway authorizer context, if any.
  ///
  /// Cognito user pool authorizers provide a `claims` object (with a `sub` claim), while custom
  /// authorizers provide a `principalId` alongside any additional context values.
  pub fn from_authorizer(authorizer: &Value) -> Option<Self> {
    let authorizer = authorizer.as_object()?;

    if let Some(claims) = authorizer.get("claims").and_then(Value::as_object) {
      if let Some(subject) = claims.get("sub").and_then(Value::as_str) {
        return Some(Principal::CognitoUserPool {
          subject: subject.to_owned(),
          claims: claims.clone(),
        });
      }
    }

    let principal_id = authorizer.get("principalId").and_then(Value::as_str)?;
    let context = authorizer
      .iter()
      .filter(|(key, _)| key.as_str() != "principalId")
      .map(|(key, value)| (key.to_owned(), value.to_owned()))
      .collect();
    Some(Principal::Custom {
      principal_id: principal_id.to_owned(),
      context,
    })
  }
}

/// Integration for API Gateway REST API Lambda proxy events.
///
/// # Request translation
///
/// * The base URI is `https://<Host>/` (with the scheme taken from `X-Forwarded-Proto` if present),
///   or `/` if the event has no `Host` header.
/// * The request URI is the event `path` plus the query string parameters (preferring
///   `multiValueQueryStringParameters`).
/// * Headers are taken from `multiValueHeaders`, falling back to `headers`.
/// * `null` header, query string, path parameter, and stage variable values are dropped.
/// * Bodies flagged with `isBase64Encoded` are decoded as they are read.
/// * The request context, path parameters, stage variables, resource template, and authorizer
///   [`Principal`] are attached as request extensions.
///
/// # Response translation
///
/// Headers are flattened to a single comma-separated value per name. Binary responses (see
/// [`is_binary_response`]) are base64-encoded and flagged with `isBase64Encoded`. Header values
/// that aren't visible ASCII are omitted since the reply serializes them as ASCII strings.
#[derive(Clone, Debug, Default)]
pub struct ApiGatewayProxy {
  dynamic_base_path: bool,
}

impl ApiGatewayProxy {
  /// Construct a new integration with the default configuration.
  pub fn new() -> Self {
    Self::default()
  }

  /// Derive the base URI from the event's `resource` template.
  ///
  /// For example, with a `/a/b/{proxy+}` resource, a request to `/a/b/items` is routed as
  /// `/items` (see [`resolve_base_path`]).
  pub fn with_dynamic_base_path(mut self) -> Self {
    self.dynamic_base_path = true;
    self
  }
}

impl Integration for ApiGatewayProxy {
  type Event = ApiGatewayProxyRequest;
  type Reply = ApiGatewayProxyResponse;

  fn prepare_event(&self, mut payload: Value) -> Value {
    if let Some(event) = payload.as_object_mut() {
      for field in NULLABLE_EVENT_MAPS {
        if let Some(Value::Object(entries)) = event.get_mut(field) {
          drop_null_entries(field, entries);
        }
      }
    }
    payload
  }

  fn decode(&self, event: ApiGatewayProxyRequest) -> Result<Request, AdapterError> {
    let path = event
      .path
      .as_deref()
      .ok_or_else(|| AdapterError::missing_field("path"))?;

    let request_uri = if event
      .multi_value_query_string_parameters
      .iter()
      .next()
      .is_some()
    {
      append_query(path, event.multi_value_query_string_parameters.iter())
    } else {
      append_query(path, event.query_string_parameters.iter())
    };

    // Both maps are populated by API Gateway; the multi-value map retains repeated headers.
    let headers = if event.multi_value_headers.is_empty() {
      event.headers
    } else {
      event.multi_value_headers
    };

    let base_uri = base_uri(&headers);
    let entity = decode_entity(
      event.body.map(String::into_bytes).unwrap_or_default(),
      event.is_base64_encoded,
    );

    let mut request = Request::new(base_uri, request_uri, event.http_method, headers, entity);

    if self.dynamic_base_path {
      if let Some(base_path) = resolve_base_path(event.resource.as_deref()) {
        debug!("Using dynamic base path `{base_path}`");
        request.rewrite_base_path(base_path);
      }
    }

    let principal = serde_json::to_value(&event.request_context.authorizer)
      .ok()
      .and_then(|authorizer| Principal::from_authorizer(&authorizer));

    let extensions = request.extensions_mut();
    if let Some(principal) = principal {
      extensions.insert(principal);
    }
    if let Some(resource) = event.resource {
      extensions.insert(Resource(resource));
    }
    extensions.insert(PathParameters(event.path_parameters));
    extensions.insert(StageVariables(event.stage_variables));
    extensions.insert::<ApiGatewayProxyRequestContext>(event.request_context);

    Ok(request)
  }

  fn encode(&self, response: Response) -> Result<ApiGatewayProxyResponse, AdapterError> {
    let is_base64_encoded = is_binary_response(&response);
    let (status, _, headers, body) = response.into_parts();
    let flattened = flatten_headers(&headers, |_| true);
    let ascii_headers = flattened.iter().filter_map(|(name, value)| {
      if value.bytes().all(|b| b == b'\t' || (b' '..=b'~').contains(&b)) {
        Some((name, Some(value)))
      } else {
        debug!("Omitting non-ASCII value for header `{name}`");
        None
      }
    });

    Ok(ApiGatewayProxyResponse {
      status_code: status.as_u16() as i64,
      headers: expand_headers(ascii_headers),
      multi_value_headers: Default::default(),
      body: encode_body(body, is_base64_encoded)?.map(Body::Text),
      is_base64_encoded,
    })
  }

  fn internal_server_error(&self) -> ApiGatewayProxyResponse {
    ApiGatewayProxyResponse {
      status_code: http::StatusCode::INTERNAL_SERVER_ERROR.as_u16() as i64,
      headers: Default::default(),
      multi_value_headers: Default::default(),
      body: None,
      is_base64_encoded: false,
    }
  }
}

fn drop_null_entries(field: &str, entries: &mut Map<String, Value>) {
  entries.retain(|name, value| {
    if let Value::Array(values) = value {
      values.retain(|value| !value.is_null());
    }
    if value.is_null() {
      debug!("Dropping null `{field}` entry `{name}`");
      false
    } else {
      true
    }
  });
}

fn base_uri(headers: &HeaderMap) -> String {
  let Some(host) = headers
    .get(http::header::HOST)
    .and_then(|host| host.to_str().ok())
  else {
    return "/".to_string();
  };
  let scheme = headers
    .get(X_FORWARDED_PROTO)
    .and_then(|proto| proto.to_str().ok())
    .unwrap_or("https");
  format!("{scheme}://{host}/")
}
