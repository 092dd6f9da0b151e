//! Endpoint URL construction.

/// Strips trailing slashes so endpoints can be appended without doubling them.
///
/// ```
/// use sheetbridge::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000/"), "http://localhost:8000");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Joins a backend base URL and an endpoint path with exactly one slash.
///
/// ```
/// use sheetbridge::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/", "/mcp/edit_google_sheet"),
///     "http://localhost:8000/mcp/edit_google_sheet"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
