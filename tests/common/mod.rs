//! Common test utilities for firds-dl integration tests

#[allow(dead_code)]
pub mod fixtures;

use firds_dl::Config;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(unused_imports)]
pub use fixtures::*;

/// Archive name served by [`serve_archive`]
pub const ARCHIVE_NAME: &str = "DLTINS_20210117_01of01.zip";

/// Mount `archive` at `/firds/<ARCHIVE_NAME>` and return its URL
pub async fn serve_archive(server: &MockServer, archive: Vec<u8>) -> String {
    Mock::given(method("GET"))
        .and(path(format!("/firds/{ARCHIVE_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .mount(server)
        .await;
    format!("{}/firds/{ARCHIVE_NAME}", server.uri())
}

/// Config whose every path lives under `root`, with `response.xml` pointing at `link`
pub fn config_in(root: &Path, link: &str) -> Config {
    let input = write_file(root, "response.xml", &response_xml(link));

    let mut config = Config::default();
    config.paths.input = input;
    config.paths.download_dir = root.join("downloads");
    config.paths.extract_dir = root.join("extracted");
    config.paths.output = root.join("results.csv");
    config.fetch.chunk_size = 64;
    config
}

/// The six-column field list without the duplicated `ClssfctnTp`
pub fn six_fields() -> Vec<String> {
    ["Id", "FullNm", "ClssfctnTp", "CmmdtyDerivInd", "NtnlCcy", "Issr"]
        .into_iter()
        .map(String::from)
        .collect()
}
