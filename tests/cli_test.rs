#![cfg(feature = "cli")]
//! Integration tests for the `salvage` subcommands.

use byteorder::{BigEndian, ByteOrder};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use salvage::cli::extract::{self, ExtractOptions};
use salvage::cli::nodes::{self, NodesOptions};
use salvage::cli::pages::{self, PagesOptions};
use salvage::cli::scan::{self, ScanOptions};
use salvage::innodb::constants::*;
use salvage::util::events::EventLog;
use salvage::SalvageError;

const SCHEMA: &str = "id:int,email:string,active:bool";

fn build_page(page_num: u32, page_type: u16) -> Vec<u8> {
    let mut page = vec![0u8; SIZE_PAGE];
    BigEndian::write_u32(&mut page[FIL_PAGE_OFFSET..], page_num);
    BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], page_type);
    page
}

fn build_leaf_page(page_num: u32, id: u32, email: &str) -> Vec<u8> {
    let mut page = build_page(page_num, FIL_PAGE_INDEX);
    BigEndian::write_u32(&mut page[RECORD_REGION_START..], id);
    let email_at = RECORD_REGION_START + FIELD_INT_LEN;
    page[email_at..email_at + email.len()].copy_from_slice(email.as_bytes());
    page[email_at + FIELD_STRING_LEN] = 1;
    page
}

fn write_ibd_file(dir: &Path, name: &str, pages: &[Vec<u8>]) {
    let mut f = fs::File::create(dir.join(name)).unwrap();
    for page in pages {
        f.write_all(page).unwrap();
    }
    f.flush().unwrap();
}

fn create_datadir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("blog");
    fs::create_dir(&db).unwrap();
    write_ibd_file(
        &db,
        "wp_newsletter.ibd",
        &[
            build_page(0, 8),
            build_leaf_page(3, 501, "bo@example.net"),
            build_page(4, FIL_PAGE_RTREE),
        ],
    );
    write_ibd_file(&db, "wp_posts.ibd", &[build_page(7, FIL_PAGE_RTREE)]);
    dir
}

fn extract_opts(datadir: &Path, json: bool) -> ExtractOptions {
    ExtractOptions {
        datadir: datadir.to_string_lossy().into_owned(),
        schema: Some(SCHEMA.to_string()),
        schema_file: None,
        record_start: None,
        stride: None,
        json,
        mmap: false,
        event_log: None,
    }
}

fn scan_opts(file: &Path, page: Option<u64>, json: bool) -> ScanOptions {
    ScanOptions {
        file: file.to_string_lossy().into_owned(),
        page,
        schema: Some(SCHEMA.to_string()),
        schema_file: None,
        record_start: None,
        stride: None,
        json,
        mmap: false,
        event_log: None,
    }
}

fn run<F>(f: F) -> String
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), SalvageError>,
{
    colored::control::set_override(false);
    let mut out = Vec::new();
    f(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_extract_text_prints_records_and_totals() {
    let dir = create_datadir();
    let output = run(|w| extract::execute(&extract_opts(dir.path(), false), w));

    assert!(output.contains("Processing"));
    assert!(output.contains("wp_newsletter.ibd"));
    assert!(output.contains("wp_posts.ibd"));
    assert!(output.contains(r#"id: 501, email: "bo@example.net", active: true"#));
    assert!(output.contains("Processed 2 files, 4 pages"));
}

#[test]
fn test_extract_json_document() {
    let dir = create_datadir();
    let output = run(|w| extract::execute(&extract_opts(dir.path(), true), w));
    let doc: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(doc["schema"], SCHEMA);
    assert_eq!(doc["layout"]["record_start"], 70);
    assert_eq!(doc["layout"]["stride"], 400);
    assert_eq!(doc["total_pages"], 4);

    let files = doc["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    let newsletter = files
        .iter()
        .find(|f| f["file"].as_str().unwrap().ends_with("wp_newsletter.ibd"))
        .unwrap();
    assert_eq!(newsletter["leaf_pages"], 1);
    assert_eq!(newsletter["parent_nodes"], serde_json::json!([4]));
    let first = &newsletter["rows"][0];
    assert_eq!(first["page_number"], 3);
    assert_eq!(first["record"]["id"], 501);
    assert_eq!(first["record"]["email"], "bo@example.net");
    assert_eq!(first["record"]["active"], true);
}

#[test]
fn test_extract_rejects_zero_stride() {
    let dir = create_datadir();
    let mut opts = extract_opts(dir.path(), false);
    opts.stride = Some(0);
    let result = extract::execute(&opts, &mut Vec::<u8>::new());
    assert!(matches!(result, Err(SalvageError::Argument(_))));
}

#[test]
fn test_extract_missing_datadir() {
    let opts = extract_opts(Path::new("/nonexistent/datadir"), false);
    let result = extract::execute(&opts, &mut Vec::<u8>::new());
    assert!(matches!(result, Err(SalvageError::Argument(_))));
}

#[test]
fn test_extract_empty_datadir() {
    let dir = TempDir::new().unwrap();
    let output = run(|w| extract::execute(&extract_opts(dir.path(), false), w));
    assert!(output.contains("No .ibd files found"));
}

#[test]
fn test_nodes_text_lists_inventory() {
    let dir = create_datadir();
    let opts = NodesOptions {
        datadir: dir.path().to_string_lossy().into_owned(),
        prefix: "wp_newsletter".to_string(),
        json: false,
        mmap: false,
        event_log: None,
    };
    let output = run(|w| nodes::execute(&opts, w));

    assert!(output.contains("Processed 3 pages from"));
    assert!(output.contains("wp_newsletter.ibd: [4]"));
    assert!(!output.contains("wp_posts.ibd"));
    assert!(output.contains("1 parent-node pages in 1 files"));
}

#[test]
fn test_nodes_json_inventory_keyed_by_file_name() {
    let dir = create_datadir();
    let opts = NodesOptions {
        datadir: dir.path().to_string_lossy().into_owned(),
        prefix: "wp_".to_string(),
        json: true,
        mmap: true,
        event_log: None,
    };
    let output = run(|w| nodes::execute(&opts, w));
    let doc: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(doc["prefix"], "wp_");
    assert_eq!(doc["inventory"]["wp_newsletter.ibd"], serde_json::json!([4]));
    assert_eq!(doc["inventory"]["wp_posts.ibd"], serde_json::json!([7]));
    assert_eq!(doc["files"].as_array().unwrap().len(), 2);
}

#[test]
fn test_pages_lists_kinds() {
    let dir = create_datadir();
    let file = dir.path().join("blog").join("wp_newsletter.ibd");
    let opts = PagesOptions {
        file: file.to_string_lossy().into_owned(),
        json: false,
        mmap: false,
        event_log: None,
    };
    let output = run(|w| pages::execute(&opts, w));

    assert!(output.contains("(3 pages)"));
    assert!(output.contains("FSP_HDR"));
    assert!(output.contains("INDEX"));
    assert!(output.contains("RTREE"));
    assert!(output.contains("Page Kind Summary"));
}

#[test]
fn test_pages_json() {
    let dir = create_datadir();
    let file = dir.path().join("blog").join("wp_newsletter.ibd");
    let opts = PagesOptions {
        file: file.to_string_lossy().into_owned(),
        json: true,
        mmap: false,
        event_log: None,
    };
    let output = run(|w| pages::execute(&opts, w));
    let doc: serde_json::Value = serde_json::from_str(&output).unwrap();

    let kinds: Vec<&str> = doc["pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["other", "leaf_records", "parent_node"]);
    assert_eq!(doc["pages"][1]["page_number"], 3);
    assert_eq!(doc["summary"]["pages"], 3);
}

#[test]
fn test_scan_single_page_with_offsets() {
    let dir = create_datadir();
    let file = dir.path().join("blog").join("wp_newsletter.ibd");
    let output = run(|w| scan::execute(&scan_opts(&file, Some(1), true), w));
    let doc: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(doc["page_number"], 3);
    assert_eq!(doc["kind"], "leaf_records");
    let records = doc["records"].as_array().unwrap();
    assert_eq!(records[0]["offset"], 70);
    assert_eq!(records[1]["offset"], 470);
    assert_eq!(records[0]["record"]["email"], "bo@example.net");
}

#[test]
fn test_scan_page_past_end() {
    let dir = create_datadir();
    let file = dir.path().join("blog").join("wp_newsletter.ibd");
    let result = scan::execute(&scan_opts(&file, Some(3), false), &mut Vec::<u8>::new());
    assert!(matches!(result, Err(SalvageError::Argument(_))));
}

#[test]
fn test_scan_page_index_at_u64_max() {
    let dir = create_datadir();
    let file = dir.path().join("blog").join("wp_newsletter.ibd");
    let result = scan::execute(&scan_opts(&file, Some(u64::MAX), false), &mut Vec::<u8>::new());
    assert!(matches!(result, Err(SalvageError::Argument(_))));
}

#[test]
fn test_scan_whole_file_text() {
    let dir = create_datadir();
    let file = dir.path().join("blog").join("wp_newsletter.ibd");
    let output = run(|w| scan::execute(&scan_opts(&file, None, false), w));
    assert!(output.contains(r#"email: "bo@example.net""#));
    assert!(output.contains("3 pages (1 leaf, 1 parent, 1 other)"));
}

#[test]
fn test_scan_missing_file() {
    let result = scan::execute(
        &scan_opts(Path::new("/nonexistent/t.ibd"), None, false),
        &mut Vec::<u8>::new(),
    );
    assert!(matches!(result, Err(SalvageError::Io(_))));
}

#[test]
fn test_event_log_records_run() {
    let dir = create_datadir();
    let log_path = dir.path().join("events.ndjson");
    let log = Arc::new(EventLog::open(log_path.to_str().unwrap()).unwrap());
    log.start_run(vec!["salvage".into(), "nodes".into()]).unwrap();

    let opts = NodesOptions {
        datadir: dir.path().join("blog").to_string_lossy().into_owned(),
        prefix: "wp_newsletter".to_string(),
        json: true,
        mmap: false,
        event_log: Some(Arc::clone(&log)),
    };
    run(|w| nodes::execute(&opts, w));
    log.end_run().unwrap();

    let events: Vec<serde_json::Value> = BufReader::new(fs::File::open(&log_path).unwrap())
        .lines()
        .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
        .collect();
    let names: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();

    assert_eq!(names.first(), Some(&"run_start"));
    assert_eq!(names.last(), Some(&"run_end"));
    assert_eq!(names.iter().filter(|n| **n == "page").count(), 3);
    assert!(names.contains(&"parent_node"));
    assert_eq!(events.last().unwrap()["files"], 1);
}
