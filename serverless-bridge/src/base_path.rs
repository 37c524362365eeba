/// Token that opens a greedy path placeholder (e.g., the `/{` in `/{proxy+}`).
pub const GREEDY_PLACEHOLDER_START: &str = "/{";

/// Token that closes a greedy path placeholder (e.g., the `+}` in `/{proxy+}`).
pub const GREEDY_PLACEHOLDER_END: &str = "+}";

/// Derive the base path of a deployment from its resource template.
///
/// This allows a single deployed function to serve multiple API Gateway resources (e.g., due to
/// multiple base path mappings) without hard-coding any prefix in the routes. For a resource
/// template such as `/a/b/{proxy+}`, the base path is `/a/b`.
///
/// Returns:
///  * `None` if `resource` is `None`, does not end with a greedy placeholder, or is malformed
///    (i.e., has no [`GREEDY_PLACEHOLDER_START`]).
///  * `Some("")` if the greedy placeholder covers the whole path (`/{proxy+}`).
///  * Otherwise, everything before the last [`GREEDY_PLACEHOLDER_START`].
pub fn resolve_base_path(resource: Option<&str>) -> Option<&str> {
  let resource = resource?;
  if !resource.ends_with(GREEDY_PLACEHOLDER_END) {
    return None;
  }
  resource
    .rfind(GREEDY_PLACEHOLDER_START)
    .map(|placeholder_start| &resource[..placeholder_start])
}
