use url::form_urlencoded::byte_serialize;

/// Append query parameters to a request path.
///
/// Returns `path` unchanged if `params` is empty. Otherwise, appends `?` followed by the
/// `&`-separated `key=value` pairs in iteration order, with each key and value encoded using the
/// `application/x-www-form-urlencoded` byte serializer (e.g., a space becomes `+`).
pub fn append_query<I, K, V>(path: &str, params: I) -> String
where
  I: IntoIterator<Item = (K, V)>,
  K: AsRef<str>,
  V: AsRef<str>,
{
  let mut uri = path.to_owned();
  for (idx, (key, value)) in params.into_iter().enumerate() {
    uri.push(if idx == 0 { '?' } else { '&' });
    uri.extend(byte_serialize(key.as_ref().as_bytes()));
    uri.push('=');
    uri.extend(byte_serialize(value.as_ref().as_bytes()));
  }
  uri
}

/// Percent-encode a single URI path segment (e.g., a space becomes `%20` and `/` becomes `%2F`).
pub fn encode_path_segment(segment: &str) -> String {
  urlencoding::encode(segment).into_owned()
}

#[cfg(test)]
mod tests {
  use super::{append_query, encode_path_segment};

  use pretty_assertions::assert_eq;

  #[test]
  fn test_append_query_empty() {
    assert_eq!(append_query("/p", Vec::<(&str, &str)>::new()), "/p");
  }

  #[test]
  fn test_append_query_form_encoding() {
    assert_eq!(append_query("/p", [("a", "b c")]), "/p?a=b+c");
    assert_eq!(
      append_query("/p", [("q&a", "x=y"), ("emoji", "é/ü")]),
      "/p?q%26a=x%3Dy&emoji=%C3%A9%2F%C3%BC"
    );
  }

  #[test]
  fn test_append_query_preserves_order() {
    assert_eq!(
      append_query("/items", [("b", "2"), ("a", "1"), ("b", "3")]),
      "/items?b=2&a=1&b=3"
    );
  }

  #[test]
  fn test_encode_path_segment() {
    assert_eq!(encode_path_segment("order created"), "order%20created");
    assert_eq!(encode_path_segment("a/b"), "a%2Fb");
  }
}
