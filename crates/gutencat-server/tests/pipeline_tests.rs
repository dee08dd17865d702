//! End-to-end pipeline tests against a mocked catalog feed
//!
//! Each test serves a hand-built feed from wiremock, runs the full
//! fetch -> expand -> discover -> mask -> upsert sequence and inspects the
//! in-memory store afterwards.

use chrono::NaiveDate;
use gutencat_server::ingest::{IngestError, MetadataStore, PublicationDate, RawNode};
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::*;

#[tokio::test]
async fn test_king_james_record_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let (_server, url) = serve_feed(kjv_feed()).await;
    let (pipeline, store) = pipeline(tmp.path(), &url);

    let stats = pipeline.run(&url).await.unwrap();

    assert!(stats.ok);
    assert_eq!(stats.n, 1);
    assert_eq!(store.count().await.unwrap(), 1);

    let record = store.get(10).await.unwrap().expect("record 10 stored");
    assert_eq!(record.id, Some(10));
    assert_eq!(record.language.as_deref(), Some("en"));
    assert_eq!(record.title, Some(RawNode::from("The King James Version of the Bible")));
    assert_eq!(record.subjects, vec![RawNode::from("Bible"), RawNode::from("BS")]);
    assert!(record.authors.is_empty());
    assert_eq!(record.rights, vec![RawNode::from("Public domain in the USA.")]);
    assert_eq!(
        record.publication_date,
        Some(PublicationDate::Valid(NaiveDate::from_ymd_opt(1989, 8, 1).unwrap()))
    );
    assert_eq!(record.publisher, Some(RawNode::from("Project Gutenberg")));
}

#[tokio::test]
async fn test_empty_archive_reports_zero_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let (_server, url) = serve_feed(zip_feed(&tar_bytes(&[]))).await;
    let (pipeline, store) = pipeline(tmp.path(), &url);

    let stats = pipeline.run(&url).await.unwrap();

    assert!(stats.ok);
    assert_eq!(stats.n, 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_corrupt_inner_archive_fails_without_records() {
    let tmp = TempDir::new().unwrap();
    let (_server, url) = serve_feed(corrupt_feed()).await;
    let (pipeline, store) = pipeline(tmp.path(), &url);

    let err = pipeline.run(&url).await.unwrap_err();

    assert!(matches!(err, IngestError::Archive(_)), "unexpected error: {err}");
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unrecognized_container_is_archive_error() {
    let tmp = TempDir::new().unwrap();
    let (_server, url) = serve_feed(b"<html>not an archive</html>".to_vec()).await;
    let (pipeline, _store) = pipeline(tmp.path(), &url);

    let err = pipeline.run(&url).await.unwrap_err();

    assert!(matches!(err, IngestError::Archive(_)));
}

#[tokio::test]
async fn test_http_error_is_network_error() {
    let tmp = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let url = format!("{}{}", server.uri(), FEED_PATH);
    let (pipeline, store) = pipeline(tmp.path(), &url);

    let err = pipeline.run(&url).await.unwrap_err();

    assert!(matches!(err, IngestError::Network(_)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_gzip_outer_container() {
    let tmp = TempDir::new().unwrap();
    let feed = gzip_feed(&tar_bytes(&[("cache/epub/10/pg10.rdf", KJV_RDF.as_bytes())]));
    let (_server, url) = serve_feed(feed).await;
    let (pipeline, store) = pipeline(tmp.path(), &url);

    let stats = pipeline.run(&url).await.unwrap();

    assert_eq!(stats.n, 1);
    assert!(store.get(10).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let (_server, url) = serve_feed(kjv_feed()).await;
    let (pipeline, store) = pipeline(tmp.path(), &url);

    pipeline.run(&url).await.unwrap();
    pipeline.run(&url).await.unwrap();

    assert_eq!(store.write_count(), 2);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_n_counts_every_discovered_file() {
    let tmp = TempDir::new().unwrap();
    let other = KJV_RDF.replace("ebooks/10", "ebooks/11");
    let feed = zip_feed(&tar_bytes(&[
        ("cache/epub/10/pg10.rdf", KJV_RDF.as_bytes()),
        ("cache/epub/11/pg11.rdf", other.as_bytes()),
    ]));
    let (_server, url) = serve_feed(feed).await;
    let (pipeline, store) = pipeline(tmp.path(), &url);

    let stats = pipeline.run(&url).await.unwrap();

    assert_eq!(stats.n, 2);
    let ids: Vec<_> = store.records().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![Some(10), Some(11)]);
}

#[tokio::test]
async fn test_malformed_record_aborts_run() {
    let tmp = TempDir::new().unwrap();
    let feed = zip_feed(&tar_bytes(&[
        ("cache/epub/10/pg10.rdf", KJV_RDF.as_bytes()),
        ("cache/epub/12/pg12.rdf", b"<rdf:RDF><pgterms:ebook rdf:about=\"ebooks/12\">"),
    ]));
    let (_server, url) = serve_feed(feed).await;
    let (pipeline, store) = pipeline(tmp.path(), &url);

    let err = pipeline.run(&url).await.unwrap_err();

    // Whatever was upserted before the failure stays behind
    assert!(matches!(err, IngestError::Parse(_)));
    assert!(store.count().await.unwrap() <= 1);
    assert!(store.get(12).await.unwrap().is_none());
}

#[tokio::test]
async fn test_record_without_numeric_id_aborts_with_validation_error() {
    let tmp = TempDir::new().unwrap();
    let broken = KJV_RDF.replace("ebooks/10", "ebooks/ten");
    let feed = zip_feed(&tar_bytes(&[("cache/epub/10/pg10.rdf", broken.as_bytes())]));
    let (_server, url) = serve_feed(feed).await;
    let (pipeline, store) = pipeline(tmp.path(), &url);

    let err = pipeline.run(&url).await.unwrap_err();

    assert!(matches!(err, IngestError::Validation(_)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_session_artifacts_are_left_on_disk() {
    let tmp = TempDir::new().unwrap();
    let (_server, url) = serve_feed(kjv_feed()).await;
    let (pipeline, _store) = pipeline(tmp.path(), &url);

    pipeline.run(&url).await.unwrap();
    pipeline.run(&url).await.unwrap();

    let archives = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "archive"))
        .count();
    let dirs = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .count();

    assert_eq!(archives, 2);
    assert_eq!(dirs, 2);
}
