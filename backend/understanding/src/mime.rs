//! Media type resolution for uploaded images.

const OCTET_STREAM: &str = "application/octet-stream";

/// Pick the media type to send with an upload.
///
/// The declared type wins unless it is missing or generic; then the file
/// extension is tried, then the content signature via `infer`.
pub fn resolve_mime_type(declared: Option<&str>, file_name: Option<&str>, data: &[u8]) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty() && *d != OCTET_STREAM) {
        return declared.to_string();
    }
    file_name
        .and_then(mime_from_extension)
        .or_else(|| sniff_mime(data))
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "bmp" => Some("image/bmp"),
        "tiff" | "tif" => Some("image/tiff"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    infer::get(data).map(|kind| kind.mime_type())
}
