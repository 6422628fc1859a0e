//! Utility functions for path handling

/// File name used when the URL has no usable final path segment
pub const FALLBACK_ARCHIVE_NAME: &str = "download.zip";

/// Local file name for an archive URL
///
/// Uses the last segment of the URL path exactly as it appears in the URL,
/// percent-escapes included. Query strings and fragments are ignored.
///
/// # Examples
///
/// ```
/// use firds_dl::utils::archive_filename_from_url;
///
/// assert_eq!(
///     archive_filename_from_url("http://firds.esma.europa.eu/firds/DLTINS_20210117_01of01.zip"),
///     "DLTINS_20210117_01of01.zip"
/// );
/// ```
#[must_use]
pub fn archive_filename_from_url(url: &str) -> String {
    let last = match url::Url::parse(url) {
        Ok(parsed_url) => parsed_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        // Not an absolute URL; fall back to plain splitting
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };

    match last {
        Some(name) if is_safe_file_name(&name) => name,
        _ => FALLBACK_ARCHIVE_NAME.to_string(),
    }
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('\\')
}
