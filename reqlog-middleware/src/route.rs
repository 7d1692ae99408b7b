use crate::env::RouteInfo;

const ROOT_NAMESPACE: &str = "/";

/// Route identifier ("processed by") for an endpoint.
///
/// `owner` followed by the namespace (empty for the root) and each declared
/// path segment with one leading `/` stripped, joined by `/`.
pub fn processed_by(route: &RouteInfo) -> String {
    let namespace = if route.namespace == ROOT_NAMESPACE {
        ""
    } else {
        route.namespace.as_str()
    };

    let mut parts = Vec::with_capacity(route.path.len() + 1);
    parts.push(namespace);
    parts.extend(
        route
            .path
            .iter()
            .map(|segment| segment.strip_prefix('/').unwrap_or(segment)),
    );

    format!("{}{}", route.owner, parts.join("/"))
}
