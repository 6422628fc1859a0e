//! CSV serialization of extracted records
//!
//! The header is the field list as configured, duplicates included, and every
//! record contributes one line in the same column order. Values that contain
//! the delimiter, a quote or a line break are quoted; anything else is written
//! verbatim.

use crate::error::{Error, Result};
use crate::extractor::Record;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

fn builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(b',')
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

/// Write header and records to any writer
///
/// Fails on the first record that lacks one of `fields`; lines already
/// written stay in the writer.
pub fn write_records<W: Write, S: AsRef<str>>(
    writer: W,
    fields: &[S],
    records: &[Record],
) -> Result<()> {
    let mut csv = builder().from_writer(writer);
    csv.write_record(fields.iter().map(|f| AsRef::<str>::as_ref(f)))?;

    let mut row: Vec<&str> = Vec::with_capacity(fields.len());
    for (index, record) in records.iter().enumerate() {
        row.clear();
        for field in fields {
            let field: &str = field.as_ref();
            let value = record.get(field).ok_or_else(|| Error::MissingField {
                record: index,
                field: field.to_string(),
            })?;
            row.push(value);
        }
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write the records into it
pub fn write_csv<S: AsRef<str>>(
    path: &Path,
    fields: &[S],
    records: &[Record],
) -> Result<PathBuf> {
    info!(?path, records = records.len(), "generating CSV from the parsed result");

    let file = std::fs::File::create(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to create '{}': {}", path.display(), e),
        )
    })?;
    write_records(std::io::BufWriter::new(file), fields, records)?;

    info!(?path, "generated CSV");
    Ok(path.to_path_buf())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FIELDS: [&str; 6] = ["Id", "FullNm", "ClssfctnTp", "CmmdtyDerivInd", "NtnlCcy", "Issr"];

    fn sample() -> Record {
        [
            ("Id", "X1"),
            ("FullNm", "Foo"),
            ("ClssfctnTp", "C1"),
            ("CmmdtyDerivInd", "N"),
            ("NtnlCcy", "EUR"),
            ("Issr", "Iss1"),
        ]
        .into_iter()
        .collect()
    }

    fn render(fields: &[&str], records: &[Record]) -> String {
        let mut out = Vec::new();
        write_records(&mut out, fields, records).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn header_then_one_line_per_record() {
        let csv = render(&FIELDS, &[sample()]);
        assert_eq!(
            csv,
            "Id,FullNm,ClssfctnTp,CmmdtyDerivInd,NtnlCcy,Issr\nX1,Foo,C1,N,EUR,Iss1\n"
        );
    }

    #[test]
    fn no_records_writes_only_header() {
        assert_eq!(render(&["Id", "Issr"], &[]), "Id,Issr\n");
    }

    #[test]
    fn duplicate_field_repeats_column() {
        let csv = render(&["Id", "ClssfctnTp", "ClssfctnTp"], &[sample()]);
        assert_eq!(csv, "Id,ClssfctnTp,ClssfctnTp\nX1,C1,C1\n");
    }

    #[test]
    fn missing_field_aborts_with_record_index() {
        let partial: Record = [("Id", "X2"), ("Issr", "I")].into_iter().collect();
        let mut out = Vec::new();
        match write_records(&mut out, &FIELDS, &[sample(), partial]) {
            Err(Error::MissingField { record, field }) => {
                assert_eq!(record, 1);
                assert_eq!(field, "FullNm");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn values_with_delimiters_are_quoted() {
        let record: Record = [("Id", "X1"), ("FullNm", "Foo, Inc.")].into_iter().collect();
        assert_eq!(render(&["Id", "FullNm"], &[record]), "Id,FullNm\nX1,\"Foo, Inc.\"\n");
    }

    #[test]
    fn write_csv_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "stale content that is longer than the new output\n").unwrap();

        let written = write_csv(&path, &FIELDS, &[sample()]).unwrap();
        let first = std::fs::read(&written).unwrap();
        write_csv(&path, &FIELDS, &[sample()]).unwrap();
        let second = std::fs::read(&written).unwrap();

        assert_eq!(written, path);
        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().starts_with("Id,FullNm"));
    }
}
