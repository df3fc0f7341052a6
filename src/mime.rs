// src/mime.rs
// =============================================================================
// Small helpers around MIME types.
//
// Used for:
// - deciding which fetched pages are HTML (and so get parsed for links)
// - picking an extension for directory index files ("index.html", ...)
// - splitting a Content-Type header into (mime type, charset)
// =============================================================================

pub fn is_html(mime_type: &str) -> bool {
    mime_type == "text/html" || mime_type == "application/xhtml+xml"
}

/// Default extension for a MIME type, or "" when unknown.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "text/html" | "application/xhtml+xml" => "html",
        "text/xml" | "application/xml" => "xml",
        "text/css" => "css",
        "text/plain" => "txt",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/png" => "png",
        "application/x-javascript" | "application/javascript" | "text/javascript" => "js",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        _ => "",
    }
}

// Splits "text/html; charset=UTF-8" into ("text/html", Some("UTF-8"))
//
// The mime type is lower-cased; the charset is kept as sent.
// An empty mime type yields None for both parts.
pub fn parse_content_type(header: &str) -> (Option<String>, Option<String>) {
    let mut parts = header.split(';');

    let mime_type = parts
        .next()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty());

    if mime_type.is_none() {
        return (None, None);
    }

    let charset = parts.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    });

    (mime_type, charset)
}
