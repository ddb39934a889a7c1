//! Content type of uploaded files, inferred from the file name.

/// Sent for files without a known extension
const UNKNOWN: &str = "text/plain";

/// Zenodo answers 400 to JSON bodies on the bucket endpoint; JSON goes up as text
const JSON_REPLACEMENT: &str = "text/plain";

/// Content type sent with a file upload
pub fn upload_content_type(file_name: &str) -> &'static str {
    let guessed = mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(UNKNOWN);

    if guessed.starts_with("application/json") || guessed.ends_with("+json") {
        JSON_REPLACEMENT
    } else {
        guessed
    }
}
