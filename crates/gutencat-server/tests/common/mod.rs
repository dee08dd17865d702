//! Shared helpers for gutencat integration tests
//!
//! Builds catalog feeds in memory (tar wrapped in zip or gzip) and serves
//! them from a wiremock server, so pipeline runs never touch the network.
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use gutencat_server::ingest::{CatalogPipeline, InMemoryMetadataStore, IngestConfig};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

/// The King James Bible catalog record as shipped in the feed
pub const KJV_RDF: &str = include_str!("../fixtures/pg10.rdf");

pub const FEED_PATH: &str = "/cache/epub/feeds/rdf-files.tar.zip";

/// Build a tar archive from `(path, contents)` pairs
pub fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }

    builder.into_inner().unwrap()
}

/// Wrap an inner tar into a zip container, as the public feed does
pub fn zip_feed(inner_tar: &[u8]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("rdf-files.tar", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(inner_tar).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Wrap an inner tar into a gzip stream
pub fn gzip_feed(inner_tar: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(inner_tar).unwrap();
    encoder.finish().unwrap()
}

/// Zip feed holding only the King James record at its catalog path
pub fn kjv_feed() -> Vec<u8> {
    zip_feed(&tar_bytes(&[("cache/epub/10/pg10.rdf", KJV_RDF.as_bytes())]))
}

/// Zip feed whose inner tar is garbage
pub fn corrupt_feed() -> Vec<u8> {
    zip_feed(&[b'A'; 1024])
}

/// Serve `body` at [`FEED_PATH`]; returns the server and the feed URL
pub async fn serve_feed(body: Vec<u8>) -> (MockServer, String) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let url = format!("{}{}", server.uri(), FEED_PATH);
    (server, url)
}

/// Pipeline writing under `tmp_root` into an in-memory store
pub fn pipeline(
    tmp_root: &Path,
    feed_url: &str,
) -> (CatalogPipeline, Arc<InMemoryMetadataStore>) {
    let store = Arc::new(InMemoryMetadataStore::new());
    let config = IngestConfig::builder()
        .feed_url(feed_url)
        .tmp_root(tmp_root)
        .timeout_secs(30)
        .build();

    let pipeline = CatalogPipeline::new(config, store.clone()).unwrap();
    (pipeline, store)
}
