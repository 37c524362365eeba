use crate::{json_response, HandlerError};

use serde::{Deserialize, Serialize};
use serverless_bridge::{BoxError, PathParams, Request, Response};

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Item {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewItem {
  pub name: String,
}

// Stand-in for a failed database lookup.
const MISSING_ITEM_ID: u64 = 0;

pub async fn get_item(_request: Request, params: PathParams) -> Result<Response, BoxError> {
  Ok(find_item(params.get("id").unwrap_or_default()).unwrap_or_else(Response::from))
}

pub async fn create_item(mut request: Request, _params: PathParams) -> Result<Response, BoxError> {
  Ok(insert_item(&mut request).unwrap_or_else(Response::from))
}

fn find_item(id: &str) -> Result<Response, HandlerError> {
  let id = id
    .parse::<u64>()
    .map_err(|err| HandlerError::InvalidItemId(id.to_owned(), err))?;
  if id == MISSING_ITEM_ID {
    return Err(HandlerError::ItemNotFound(id));
  }

  json_response(&Item {
    id,
    name: format!("item-{id}"),
  })
}

fn insert_item(request: &mut Request) -> Result<Response, HandlerError> {
  let body = request.read_body().map_err(HandlerError::RequestBodyRead)?;
  let new_item =
    serde_json::from_slice::<NewItem>(&body).map_err(HandlerError::RequestBodyParse)?;

  json_response(&Item {
    id: 1,
    name: new_item.name,
  })
}
