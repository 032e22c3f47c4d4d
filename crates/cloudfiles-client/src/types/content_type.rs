//! Content type resolution from object names.

/// Content type of pseudo-directory marker objects.
pub const DIRECTORY_CONTENT_TYPE: &str = "application/directory";

/// Guesses a content type from the extension of an object name or path.
///
/// Returns `None` for names without a recognised extension.
pub fn guess_content_type(name: &str) -> Option<&'static str> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    let (_, extension) = file_name.rsplit_once('.')?;

    let content_type = match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" | "text" | "log" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" | "tgz" => "application/gzip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => return None,
    };

    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("pic.jpg"), Some("image/jpeg"));
        assert_eq!(guess_content_type("photos/2024/PIC.JPEG"), Some("image/jpeg"));
        assert_eq!(guess_content_type("index.html"), Some("text/html"));
        assert_eq!(guess_content_type("archive.tar.gz"), Some("application/gzip"));
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(guess_content_type("README"), None);
        assert_eq!(guess_content_type("data.unknownext"), None);
        assert_eq!(guess_content_type("dir.d/file"), None);
    }
}
