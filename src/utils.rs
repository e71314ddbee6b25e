// src/utils.rs

/// Sub-path the app is served under when deployed to GitHub Pages.
const PAGES_BASE: &str = "/medical-clarity";

/// Get the base URL for the application
/// This handles both local development and GitHub Pages deployment
#[cfg(target_arch = "wasm32")]
pub fn get_base_url() -> String {
    let pathname = gloo::utils::window().location().pathname().ok();
    match pathname {
        Some(path) if path.starts_with(&format!("{}/", PAGES_BASE)) => PAGES_BASE.to_string(),
        _ => String::new(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn get_base_url() -> String {
    String::new()
}

/// Build a resource URL with the correct base path
pub fn resource_url(path: &str) -> String {
    let base = get_base_url();
    let clean_path = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", clean_path)
    } else {
        format!("{}/{}", base, clean_path)
    }
}

/// Directory part of a relative resource path, without trailing slash.
fn parent_dir(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Resolve an image reference found inside an analysis payload.
///
/// - data: URLs and absolute http(s) URLs are used as-is.
/// - paths starting with '/' are already absolute.
/// - anything else is taken relative to the payload's own location.
pub fn resolve_image_reference(payload_path: &str, reference: &str) -> String {
    let raw = reference.trim();
    if raw.is_empty() {
        return String::new();
    }
    if raw.starts_with("data:") || raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }
    if raw.starts_with('/') {
        return raw.to_string();
    }

    let dir = parent_dir(payload_path);
    if dir.starts_with('/') {
        // payload URL already carries the base path
        format!("{}/{}", dir, raw)
    } else if dir.is_empty() {
        resource_url(raw)
    } else {
        resource_url(&format!("{}/{}", dir, raw))
    }
}
