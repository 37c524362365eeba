use log::info;
use serverless_bridge::sns::{MessageAttributes, SnsRecord};
use serverless_bridge::{Body, BoxError, PathParams, Request, Response};

/// Log each notification and acknowledge it (with `202 Accepted`, the route's default status).
pub async fn receive_notification(
  mut request: Request,
  params: PathParams,
) -> Result<Response, BoxError> {
  let message_id = request
    .extensions()
    .get::<SnsRecord>()
    .map(|record| record.sns.message_id.clone())
    .unwrap_or_default();
  let attribute_count = request
    .extensions()
    .get::<MessageAttributes>()
    .map(|attributes| attributes.0.len())
    .unwrap_or_default();
  let message = request.read_body()?;

  info!(
    "Received notification {message_id} (subject: {}) with {} bytes and {attribute_count} \
     attribute(s)",
    params.get("subject").unwrap_or("<none>"),
    message.len(),
  );

  Ok(Response::entity(Body::Empty))
}
