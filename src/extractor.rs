//! Streaming record extraction from the payload document
//!
//! The payload is a FIRDS `auth.036` report that can run to several gigabytes,
//! so it is read as a forward-only event stream and never materialised.
//! Records are bounded by a repeating container element (the *window*) and a
//! sentinel field, `Issr`:
//!
//! ```text
//!              start(ns+attribute)
//!   Outside ─────────────────────────▶ Inside(builder)
//!      ▲                                 │  end(ns+field): builder.set(field, text)
//!      │                                 │  start(ns+attribute): keep accumulating
//!      └─────────────────────────────────┘
//!           end(ns+Issr): emit record
//! ```
//!
//! A window still open when a well-formed document ends is dropped and counted
//! in [`Extraction::dropped_partial`]. Input that ends with unclosed elements
//! is an [`Error::Xml`].

use crate::config::{SENTINEL_FIELD, SchemaConfig};
use crate::error::{Error, Result};
use quick_xml::NsReader;
use quick_xml::errors::IllFormedError;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// One extracted instrument record
///
/// Values are the trimmed text content of each field element, uncoerced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    /// Value of `field`, if it was assigned inside the record's window
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Number of distinct fields assigned
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no field was assigned
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True if every name in `fields` has a value
    pub fn is_complete<S: AsRef<str>>(&self, fields: &[S]) -> bool {
        fields.iter().all(|f| self.fields.contains_key(f.as_ref()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Field values collected for the window currently open
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: HashMap<String, String>,
}

impl RecordBuilder {
    /// Assign a field, replacing any earlier value in this window
    pub fn set(&mut self, field: &str, value: &str) {
        self.fields.insert(field.to_string(), value.trim().to_string());
    }

    /// Finish the window
    pub fn build(self) -> Record {
        Record {
            fields: self.fields,
        }
    }
}

/// Extraction window state
#[derive(Debug, Default)]
pub enum WindowState {
    /// No container element open
    #[default]
    Outside,
    /// Accumulating a record
    Inside(RecordBuilder),
}

/// Element boundary as seen by the state machine
///
/// Tags are local names already matched against the schema namespace; events
/// from other namespaces never reach [`WindowState::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEvent<'a> {
    /// Start tag of an element
    Start(&'a str),
    /// End tag with the element's character data
    End(&'a str, &'a str),
}

/// Tag names the state machine reacts to
#[derive(Debug, Clone)]
pub struct Schema {
    attribute: String,
    fields: Vec<String>,
}

impl Schema {
    /// Container element and ordered field names
    pub fn new(attribute: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            attribute: attribute.into(),
            fields,
        }
    }

    fn is_field(&self, tag: &str) -> bool {
        self.fields.iter().any(|f| f == tag)
    }
}

impl WindowState {
    /// Apply one event, returning the next state and a record when a window closes
    pub fn step(self, event: TagEvent<'_>, schema: &Schema) -> (WindowState, Option<Record>) {
        match (self, event) {
            (WindowState::Outside, TagEvent::Start(tag)) if tag == schema.attribute => {
                (WindowState::Inside(RecordBuilder::default()), None)
            }
            (WindowState::Inside(mut builder), TagEvent::End(tag, text))
                if tag == SENTINEL_FIELD =>
            {
                builder.set(SENTINEL_FIELD, text);
                (WindowState::Outside, Some(builder.build()))
            }
            (WindowState::Inside(mut builder), TagEvent::End(tag, text))
                if schema.is_field(tag) =>
            {
                builder.set(tag, text);
                (WindowState::Inside(builder), None)
            }
            (state, _) => (state, None),
        }
    }
}

/// Result of one extraction pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Finalised records in document order
    pub records: Vec<Record>,
    /// Windows still open when the input ended
    pub dropped_partial: usize,
}

/// Streaming extractor for one record schema
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    namespace: Option<Vec<u8>>,
    schema: Schema,
}

impl RecordExtractor {
    /// Build an extractor from the configured schema
    pub fn new(config: &SchemaConfig) -> Result<Self> {
        Ok(Self {
            namespace: config.namespace_uri()?.map(|uri| uri.as_bytes().to_vec()),
            schema: Schema::new(config.attribute.clone(), config.fields.clone()),
        })
    }

    /// Run the state machine over an XML stream
    pub fn extract<R: BufRead>(&self, input: R) -> Result<Extraction> {
        let mut reader = NsReader::from_reader(input);
        reader.config_mut().expand_empty_elements = true;

        let mut buf = Vec::new();
        let mut text = String::new();
        let mut state = WindowState::Outside;
        let mut extraction = Extraction::default();
        let mut open: Vec<String> = Vec::new();

        loop {
            let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
            match event {
                Event::Start(e) => {
                    text.clear();
                    open.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    let local = e.local_name().into_inner();
                    if let Some(tag) = self.local_in_namespace(&resolved, local) {
                        state = self.advance(state, TagEvent::Start(tag), &mut extraction);
                    }
                }
                Event::End(e) => {
                    open.pop();
                    let local = e.local_name().into_inner();
                    if let Some(tag) = self.local_in_namespace(&resolved, local) {
                        state = self.advance(state, TagEvent::End(tag, &text), &mut extraction);
                    }
                    text.clear();
                }
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&c.decode()?),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        // quick-xml stops at EOF without checking for unclosed elements
        if let Some(name) = open.pop() {
            error!(
                element = %name,
                unclosed = open.len() + 1,
                position = reader.buffer_position(),
                "payload ended before all elements were closed"
            );
            return Err(Error::Xml(quick_xml::Error::IllFormed(
                IllFormedError::MissingEndTag(name),
            )));
        }

        if let WindowState::Inside(builder) = state {
            extraction.dropped_partial += 1;
            warn!(
                assigned_fields = builder.fields.len(),
                "input ended inside an open record window; partial record dropped"
            );
        }

        info!(
            records = extraction.records.len(),
            dropped_partial = extraction.dropped_partial,
            "total records retrieved"
        );
        Ok(extraction)
    }

    /// Open `path` and run [`RecordExtractor::extract`] over it
    pub fn extract_file(&self, path: &Path) -> Result<Extraction> {
        info!(?path, "parsing payload document");
        let file = std::fs::File::open(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to open payload '{}': {}", path.display(), e),
            )
        })?;
        self.extract(std::io::BufReader::new(file))
    }

    fn advance(
        &self,
        state: WindowState,
        event: TagEvent<'_>,
        extraction: &mut Extraction,
    ) -> WindowState {
        let (next, record) = state.step(event, &self.schema);
        if let Some(record) = record {
            debug!(index = extraction.records.len(), "record window closed");
            extraction.records.push(record);
        }
        next
    }

    /// Local name as `&str` if the element belongs to the schema namespace
    fn local_in_namespace<'a>(
        &self,
        resolved: &ResolveResult<'_>,
        local: &'a [u8],
    ) -> Option<&'a str> {
        let matches = match (&self.namespace, resolved) {
            (None, ResolveResult::Unbound) => true,
            (Some(expected), ResolveResult::Bound(Namespace(ns))) => expected.as_slice() == *ns,
            _ => false,
        };
        if matches {
            std::str::from_utf8(local).ok()
        } else {
            None
        }
    }
}
