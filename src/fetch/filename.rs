//! Deterministic output filenames for fetched images.
//!
//! Names follow `{prefix}_{id}{ext}` with the id zero-padded to a configured
//! width. Two distinct ids never share a name, which is what lets workers write
//! into one directory without coordination.

use url::Url;

/// Builds the output filename for an item.
///
/// `width` of 0 leaves the id unpadded. `extension` is expected to include its
/// leading dot, or be empty.
///
/// ```
/// use harvester_core::fetch::build_filename;
///
/// assert_eq!(build_filename("neko", 7, 3, ".png"), "neko_007.png");
/// assert_eq!(build_filename("lol_meme", 42, 0, ".jpg"), "lol_meme_42.jpg");
/// ```
#[must_use]
pub fn build_filename(prefix: &str, id: u64, width: usize, extension: &str) -> String {
    let prefix = sanitize_filename_component(prefix);
    let prefix = if prefix.is_empty() { "image" } else { &prefix };
    format!("{prefix}_{id:0width$}{extension}")
}

/// Extracts the lowercased extension (with dot) of the URL's last path segment.
///
/// The query string and fragment are ignored. Returns `None` when the segment
/// has no usable extension.
#[must_use]
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(last_segment)
        .map_or_else(|_| last_segment.to_string(), |d| d.into_owned());
    let dot_index = decoded.rfind('.')?;
    let ext = &decoded[dot_index..];
    if ext.len() <= 1 || ext.len() > 12 || !ext[1..].chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Guess file extension from a Content-Type header value.
#[must_use]
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/gif" => Some(".gif"),
        "image/webp" => Some(".webp"),
        "image/avif" => Some(".avif"),
        "image/bmp" => Some(".bmp"),
        "image/svg+xml" => Some(".svg"),
        "image/tiff" => Some(".tiff"),
        _ => None,
    }
}

pub(crate) fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            c if c.is_alphanumeric() || matches!(c, '-' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_build_filename_pads_to_width() {
        assert_eq!(build_filename("neko", 1, 3, ".png"), "neko_001.png");
        assert_eq!(build_filename("neko", 1234, 3, ".png"), "neko_1234.png");
    }

    #[test]
    fn test_build_filename_without_extension() {
        assert_eq!(build_filename("neko", 5, 3, ""), "neko_005");
    }

    #[test]
    fn test_build_filename_sanitizes_prefix() {
        assert_eq!(build_filename("lol meme/../", 3, 0, ".gif"), "lol_meme_.._3.gif");
        assert_eq!(build_filename("///", 3, 0, ".gif"), "image_3.gif");
    }

    #[test]
    fn test_build_filename_distinct_ids_never_collide() {
        let names: HashSet<String> = (1..=2000)
            .map(|id| build_filename("neko", id, 3, ".png"))
            .collect();
        assert_eq!(names.len(), 2000);
    }

    #[test]
    fn test_build_filename_distinct_under_concurrent_generation() {
        let handles: Vec<_> = (0..8u64)
            .map(|worker| {
                std::thread::spawn(move || {
                    (0..250u64)
                        .map(|n| build_filename("neko", worker * 250 + n + 1, 3, ".jpg"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut names = HashSet::new();
        for handle in handles {
            for name in handle.join().unwrap() {
                assert!(names.insert(name), "duplicate filename generated");
            }
        }
        assert_eq!(names.len(), 2000);
    }

    #[test]
    fn test_extension_from_url_ignores_query() {
        assert_eq!(
            extension_from_url("https://nekos.best/api/v2/neko/abc.PNG?size=large"),
            Some(".png".to_string())
        );
    }

    #[test]
    fn test_extension_from_url_missing_extension() {
        assert_eq!(extension_from_url("https://example.com/images/raw"), None);
        assert_eq!(extension_from_url("https://example.com/"), None);
        assert_eq!(extension_from_url("not a url"), None);
    }

    #[test]
    fn test_extension_from_url_rejects_odd_suffixes() {
        assert_eq!(extension_from_url("https://example.com/file."), None);
        assert_eq!(
            extension_from_url("https://example.com/v1.2%20draft"),
            None,
            "decoded suffix with a space is not an extension"
        );
    }

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(extension_from_content_type("image/png"), Some(".png"));
        assert_eq!(
            extension_from_content_type("image/jpeg; charset=binary"),
            Some(".jpg")
        );
        assert_eq!(extension_from_content_type("text/html"), None);
    }
}
