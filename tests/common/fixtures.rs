//! Reference and payload documents plus archive builders

use std::io::Write;
use std::path::Path;

/// Namespace of the auth.036 report
pub const AUTH036_NS: &str = "urn:iso:std:iso:20022:tech:xsd:auth.036.001.02";

/// Search-service response pointing at `link`
pub fn response_xml(link: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<response>
  <lst name="responseHeader">
    <int name="status">0</int>
    <int name="QTime">1</int>
  </lst>
  <result name="response" numFound="1" start="0">
    <doc>
      <str name="checksum">852b2dde71cf114289ad95ada2a4e406</str>
      <str name="download_link">{link}</str>
      <date name="publication_date">2021-01-17T00:00:00Z</date>
      <str name="file_type">DLTINS</str>
    </doc>
  </result>
</response>"#
    )
}

/// One instrument record inside a `FinInstrm` wrapper
pub fn instrument(id: &str, full_name: &str, issuer: &str) -> String {
    format!(
        r#"      <FinInstrm>
        <TermntdRcrd>
          <FinInstrmGnlAttrbts>
            <Id>{id}</Id>
            <FullNm>{full_name}</FullNm>
            <ShrtNm>SHORT</ShrtNm>
            <ClssfctnTp>DBFTFR</ClssfctnTp>
            <NtnlCcy>EUR</NtnlCcy>
            <CmmdtyDerivInd>false</CmmdtyDerivInd>
          </FinInstrmGnlAttrbts>
          <Issr>{issuer}</Issr>
        </TermntdRcrd>
      </FinInstrm>
"#
    )
}

/// Record window that is never closed by an `Issr`
pub fn unterminated_instrument(id: &str) -> String {
    format!(
        r#"      <FinInstrm>
        <NewRcrd>
          <FinInstrmGnlAttrbts>
            <Id>{id}</Id>
            <FullNm>Truncated</FullNm>
          </FinInstrmGnlAttrbts>
        </NewRcrd>
      </FinInstrm>
"#
    )
}

/// Full payload document around `body`
pub fn payload_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<BizData xmlns="urn:iso:std:iso:20022:tech:xsd:head.003.001.01">
  <Pyld>
    <Document xmlns="{AUTH036_NS}">
      <FinInstrmRptgRefDataDltaRpt>
{body}      </FinInstrmRptgRefDataDltaRpt>
    </Document>
  </Pyld>
</BizData>
"#
    )
}

/// Zip archive bytes with the given members
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// Write `content` to `dir/name`
pub fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
