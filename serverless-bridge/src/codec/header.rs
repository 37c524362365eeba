use crate::{HeaderMap, HeaderName, HeaderValue};

use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use std::collections::HashMap;

/// Separator used to join the values of a multi-value header into a single value (see
/// [RFC 9110 §5.3](https://www.rfc-editor.org/rfc/rfc9110#section-5.3)).
pub const MULTI_VALUE_SEPARATOR: &str = ",";

/// Flatten a multi-value header map into a map with a single value per header name.
///
/// Values that are not valid UTF-8 are dropped, as are header names left without any values.
/// Headers rejected by `name_filter` are omitted. The remaining values of each header are joined
/// with [`MULTI_VALUE_SEPARATOR`].
///
/// Header names are returned in lowercase since [`HeaderMap`] normalizes them.
pub fn flatten_headers<F>(headers: &HeaderMap, name_filter: F) -> HashMap<String, String>
where
  F: Fn(&HeaderName) -> bool,
{
  headers
    .keys()
    .filter(|name| name_filter(name))
    .filter_map(|name| {
      let values = headers
        .get_all(name)
        .iter()
        .filter_map(|value| match std::str::from_utf8(value.as_bytes()) {
          Ok(value) => Some(value),
          Err(_) => {
            debug!("Dropping non-UTF-8 value for header `{name}`");
            None
          }
        })
        .collect::<Vec<_>>();

      if values.is_empty() {
        None
      } else {
        Some((
          name.as_str().to_owned(),
          values.into_iter().join(MULTI_VALUE_SEPARATOR),
        ))
      }
    })
    .collect()
}

/// Expand a single-value header map into a [`HeaderMap`].
///
/// Entries with a `None` value are dropped, as are entries whose name or value is not a valid HTTP
/// header. Values are never split on [`MULTI_VALUE_SEPARATOR`].
pub fn expand_headers<I, K, V>(headers: I) -> HeaderMap
where
  I: IntoIterator<Item = (K, Option<V>)>,
  K: AsRef<str>,
  V: AsRef<str>,
{
  let mut header_map = HeaderMap::new();
  for (name, value) in headers {
    let Some(value) = value else {
      debug!("Dropping null value for header `{}`", name.as_ref());
      continue;
    };
    if let Some((name, value)) = parse_header(name.as_ref(), value.as_ref()) {
      header_map.append(name, value);
    }
  }
  header_map
}

/// Collect a multi-value header map (as found in JSON platform events) into a [`HeaderMap`].
///
/// `None` value lists and `None` elements are dropped, as are invalid header names or values.
pub fn collect_headers<I, K, L, V>(headers: I) -> HeaderMap
where
  I: IntoIterator<Item = (K, Option<L>)>,
  K: AsRef<str>,
  L: IntoIterator<Item = Option<V>>,
  V: AsRef<str>,
{
  let mut header_map = HeaderMap::new();
  for (name, values) in headers {
    let Some(values) = values else {
      debug!("Dropping null value list for header `{}`", name.as_ref());
      continue;
    };
    for value in values.into_iter().flatten() {
      if let Some((name, value)) = parse_header(name.as_ref(), value.as_ref()) {
        header_map.append(name, value);
      }
    }
  }
  header_map
}

/// Convert a [`HeaderMap`] into an ordered multi-value map for serialization.
///
/// Values that are not valid UTF-8 are dropped, as are header names left without any values.
pub fn multi_value_headers(headers: &HeaderMap) -> IndexMap<String, Vec<String>> {
  headers
    .keys()
    .filter_map(|name| {
      let values = headers
        .get_all(name)
        .iter()
        .filter_map(|value| {
          std::str::from_utf8(value.as_bytes())
            .ok()
            .map(str::to_owned)
        })
        .collect::<Vec<_>>();
      (!values.is_empty()).then(|| (name.as_str().to_owned(), values))
    })
    .collect()
}

fn parse_header(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
  let name = match HeaderName::try_from(name) {
    Ok(name) => name,
    Err(_) => {
      debug!("Dropping header with invalid name `{name}`");
      return None;
    }
  };
  match HeaderValue::try_from(value) {
    Ok(value) => Some((name, value)),
    Err(_) => {
      debug!("Dropping invalid value for header `{name}`");
      None
    }
  }
}
