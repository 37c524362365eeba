use crate::{json_response, HandlerError};

use headers::{ContentType, HeaderMapExt};
use serde::Serialize;
use serverless_bridge::codec::header::multi_value_headers;
use serverless_bridge::{Body, BoxError, LambdaContext, PathParams, Request, Response};

use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestDescription {
  method: String,
  base_uri: String,
  request_uri: String,
  relative_path: String,
  query: BTreeMap<String, Vec<String>>,
  headers: BTreeMap<String, Vec<String>>,
  lambda_request_id: Option<String>,
}

/// Describe the canonical request as JSON.
pub async fn describe_request(request: Request, _params: PathParams) -> Result<Response, BoxError> {
  let mut query = BTreeMap::<String, Vec<String>>::new();
  for (key, value) in request.query_pairs() {
    query
      .entry(key.into_owned())
      .or_default()
      .push(value.into_owned());
  }

  let description = RequestDescription {
    method: request.method().to_string(),
    base_uri: request.base_uri().to_owned(),
    request_uri: request.request_uri().to_owned(),
    relative_path: request.relative_path().to_owned(),
    query,
    headers: multi_value_headers(request.headers()).into_iter().collect(),
    lambda_request_id: request
      .extensions()
      .get::<LambdaContext>()
      .map(|context| context.request_id.clone()),
  };

  Ok(json_response(&description).unwrap_or_else(Response::from))
}

/// Respond with the request body and `Content-Type`.
pub async fn echo_body(mut request: Request, _params: PathParams) -> Result<Response, BoxError> {
  let content_type = request
    .headers()
    .typed_get::<ContentType>()
    .unwrap_or_else(ContentType::octet_stream);

  let body = match request.read_body() {
    Ok(body) => body,
    Err(err) => return Ok(HandlerError::RequestBodyRead(err).into()),
  };
  let body = match String::from_utf8(body) {
    Ok(text) if text.is_empty() => Body::Empty,
    Ok(text) => Body::Text(text),
    Err(err) => Body::Binary(err.into_bytes()),
  };

  let mut response = Response::entity(body);
  response.headers_mut().typed_insert(content_type);
  Ok(response)
}
