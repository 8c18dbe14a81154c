//! Storage-path-to-URL resolution.
//!
//! Media rows carry a storage reference that has drifted over time: newer
//! rows hold a bucket-relative path, older rows an absolute URL, and the
//! oldest a path still prefixed with `claims/` or `claims-media/` from
//! before the bucket was renamed. This pure function normalizes all of them
//! into a fetchable URL. The reconciler never calls it (it treats storage
//! references as opaque strings), so it lives outside the session entirely.

/// Resolves a stored media path into a fetchable URL.
///
/// - Absolute `http(s)://` references pass through unchanged.
/// - Legacy `claims/` and `claims-media/` prefixes and any leading slashes
///   are stripped before joining onto `bucket_base`.
/// - An empty path resolves to an empty string (nothing to show).
pub fn resolve_media_url(bucket_base: &str, storage_path: &str) -> String {
    if storage_path.is_empty() {
        return String::new();
    }

    if has_http_scheme(storage_path) {
        return storage_path.to_owned();
    }

    let mut rel = storage_path;
    rel = rel.strip_prefix("claims/").unwrap_or(rel);
    rel = rel.strip_prefix("claims-media/").unwrap_or(rel);
    let rel = rel.trim_start_matches('/');

    format!("{}/{}", bucket_base.trim_end_matches('/'), rel)
}

/// Case-insensitive check for an `http://` or `https://` prefix.
fn has_http_scheme(path: &str) -> bool {
    let lower: String = path.chars().take(8).flat_map(char::to_lowercase).collect();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://bucket.example.com/storage/v1/object/public/claims-media";

    #[test]
    fn joins_relative_paths_onto_base() {
        assert_eq!(
            resolve_media_url(BASE, "c1/photo.jpg"),
            format!("{BASE}/c1/photo.jpg")
        );
    }

    #[test]
    fn passes_absolute_urls_through() {
        let absolute = "https://other.example.com/x.jpg";
        assert_eq!(resolve_media_url(BASE, absolute), absolute);

        let upper = "HTTPS://other.example.com/x.jpg";
        assert_eq!(resolve_media_url(BASE, upper), upper);
    }

    #[test]
    fn strips_legacy_prefixes() {
        assert_eq!(
            resolve_media_url(BASE, "claims/c1/photo.jpg"),
            format!("{BASE}/c1/photo.jpg")
        );
        assert_eq!(
            resolve_media_url(BASE, "claims-media/c1/photo.jpg"),
            format!("{BASE}/c1/photo.jpg")
        );
        // Both prefixes stacked, oldest rows only.
        assert_eq!(
            resolve_media_url(BASE, "claims/claims-media/c1/photo.jpg"),
            format!("{BASE}/c1/photo.jpg")
        );
    }

    #[test]
    fn strips_leading_slashes() {
        assert_eq!(
            resolve_media_url(BASE, "//c1/photo.jpg"),
            format!("{BASE}/c1/photo.jpg")
        );
    }

    #[test]
    fn tolerates_trailing_slash_on_base() {
        assert_eq!(
            resolve_media_url(&format!("{BASE}/"), "c1/photo.jpg"),
            format!("{BASE}/c1/photo.jpg")
        );
    }

    #[test]
    fn empty_path_resolves_to_empty() {
        assert_eq!(resolve_media_url(BASE, ""), "");
    }
}
