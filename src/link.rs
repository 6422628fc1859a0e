//! Download link lookup in the reference document
//!
//! The reference document is a search-service response of the form
//!
//! ```xml
//! <response>
//!   <result>
//!     <doc>
//!       <str name="file_name">DLTINS_20210117_01of01.zip</str>
//!       <str name="download_link">http://example.com/DLTINS_20210117_01of01.zip</str>
//!     </doc>
//!   </result>
//! </response>
//! ```
//!
//! Only elements after the first `<doc>` start tag are inspected and the first
//! `name="download_link"` element wins.

use crate::error::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, error, info};

/// Value of the `name` attribute that marks the link element.
pub const LINK_ATTRIBUTE_VALUE: &str = "download_link";

const DOC_ELEMENT: &[u8] = b"doc";

/// Find the download link in a reference document
///
/// Returns `Ok(None)` when the document has no `doc` element or no element
/// named `download_link` after it, or when the link text is blank. That case
/// is also reported at error level. Malformed XML is an error.
pub fn find_download_link<R: BufRead>(input: R) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut inside_doc = false;
    let mut link = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if !inside_doc {
                    if e.local_name().as_ref() == DOC_ELEMENT {
                        debug!("entered doc element");
                        inside_doc = true;
                    }
                } else if is_link_element(&e)? {
                    let end = e.to_end().into_owned();
                    let text = read_element_text(&mut reader, end.name().as_ref())?;
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        link = Some(trimmed.to_string());
                    }
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match &link {
        Some(url) => info!(download_link = %url, "found download link"),
        None => error!("couldn't find a download_link in the reference document"),
    }
    Ok(link)
}

/// Open `path` and run [`find_download_link`] over it
pub fn find_download_link_in_file(path: &Path) -> Result<Option<String>> {
    info!(?path, "reading download link");
    let file = std::fs::File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to open reference document '{}': {}", path.display(), e),
        )
    })?;
    find_download_link(std::io::BufReader::new(file))
}

fn is_link_element(e: &BytesStart<'_>) -> Result<bool> {
    match e.try_get_attribute("name")? {
        Some(attr) => Ok(attr.unescape_value()?.as_ref() == LINK_ATTRIBUTE_VALUE),
        None => Ok(false),
    }
}

/// Collect the character data of the element whose start tag was just read
fn read_element_text<R: BufRead>(reader: &mut Reader<R>, end_name: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                if depth == 0 && e.name().as_ref() == end_name {
                    break;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) if depth == 0 => text.push_str(&t.unescape()?),
            Event::CData(c) if depth == 0 => text.push_str(&c.decode()?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}
