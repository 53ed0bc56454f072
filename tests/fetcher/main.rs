//! Integration tests for folder fetching
//!
//! A mock server stands in for Drive: it serves folder pages carrying the
//! embedded listing and answers `/uc` download requests.

use std::path::{Path, PathBuf};

use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use drive_fetcher::app::{fetch_datasets, ClientConfig, Dataset, DriveFetcher, FetchOptions, FolderFetcher};
use drive_fetcher::errors::{AppError, DownloadError, FolderError};

const COMMODITIES_ID: &str = "1commodities0000";
const MACRO_ID: &str = "1macrofolder0000";

const A_CSV: &str = "date,brent,wti\n2024-01-02,75.89,70.38\n2024-01-03,78.25,72.70\n";
const B_CSV: &str = "date,gold\n2024-01-02,2073.40\n2024-01-03,2042.80\n";

/// Escapes `json` the way Drive embeds it in a single-quoted script literal
fn escape_listing(json: &str) -> String {
    json.chars()
        .map(|c| match c {
            '"' => "\\x22".to_string(),
            '[' => "\\x5b".to_string(),
            ']' => "\\x5d".to_string(),
            '\\' => "\\\\".to_string(),
            '\'' => "\\'".to_string(),
            c => c.to_string(),
        })
        .collect()
}

fn folder_page(title: &str, files: &[(&str, &str)]) -> String {
    let items: Vec<_> = files
        .iter()
        .map(|(id, name)| json!([id, ["parent"], name, "text/csv", 0, null, null, 1700000000000_u64]))
        .collect();
    let listing = json!([items, "token"]).to_string();
    format!(
        "<html><head><title>{} - Google Drive</title></head><body>\
         <script nonce=\"abc\">window['_DRIVE_ivd'] = '{}';</script></body></html>",
        title,
        escape_listing(&listing)
    )
}

async fn mock_folder(server: &MockServer, id: &str, page: String) {
    server
        .mock_async(move |when, then| {
            when.method(GET).path(format!("/drive/folders/{}", id));
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(page);
        })
        .await;
}

async fn mock_file(server: &MockServer, id: &str, name: &str, body: &'static str) {
    let disposition = format!("attachment; filename=\"{}\"", name);
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/uc").query_param("id", id);
            then.status(200)
                .header("content-type", "text/csv")
                .header("content-disposition", disposition)
                .body(body);
        })
        .await;
}

fn fetcher_for(server: &MockServer) -> DriveFetcher {
    DriveFetcher::new(ClientConfig {
        base_url: server.base_url(),
        ..Default::default()
    })
}

/// Options placing each folder in its own directory under `dir`
fn options_under(dir: &Path) -> FetchOptions {
    FetchOptions {
        quiet: true,
        output: Some(PathBuf::from(format!("{}/", dir.display()))),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_folder_with_two_files_is_written_byte_identical() {
    let server = MockServer::start_async().await;
    mock_folder(
        &server,
        COMMODITIES_ID,
        folder_page("commodities", &[("1fileA0000000", "A.csv"), ("1fileB0000000", "B.csv")]),
    )
    .await;
    mock_file(&server, "1fileA0000000", "A.csv", A_CSV).await;
    mock_file(&server, "1fileB0000000", "B.csv", B_CSV).await;

    let temp_dir = TempDir::new().unwrap();
    let files = fetcher_for(&server)
        .fetch(
            &format!("https://drive.google.com/drive/folders/{}?usp=sharing", COMMODITIES_ID),
            &options_under(temp_dir.path()),
        )
        .await
        .unwrap();

    let root = temp_dir.path().join("commodities");
    assert_eq!(files, vec![root.join("A.csv"), root.join("B.csv")]);
    assert_eq!(std::fs::read(root.join("A.csv")).unwrap(), A_CSV.as_bytes());
    assert_eq!(std::fs::read(root.join("B.csv")).unwrap(), B_CSV.as_bytes());
}

#[tokio::test]
async fn test_large_file_confirmation_is_followed() {
    let server = MockServer::start_async().await;
    mock_folder(
        &server,
        MACRO_ID,
        folder_page("macro", &[("1bigfile000000", "cpi.csv")]),
    )
    .await;

    let action = server.url("/download");
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/download")
                .query_param("id", "1bigfile000000")
                .query_param("confirm", "t");
            then.status(200)
                .header("content-disposition", "attachment; filename=\"cpi.csv\"")
                .body(B_CSV);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/uc").query_param("id", "1bigfile000000");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(format!(
                    r#"<html><body><p>Google Drive can't scan this file for viruses.</p>
                    <form id="download-form" action="{}" method="get">
                      <input type="submit" value="Download anyway">
                      <input type="hidden" name="id" value="1bigfile000000">
                      <input type="hidden" name="confirm" value="t">
                    </form></body></html>"#,
                    action
                ));
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let files = fetcher_for(&server)
        .fetch(MACRO_ID, &options_under(temp_dir.path()))
        .await
        .unwrap();

    assert_eq!(files, vec![temp_dir.path().join("macro").join("cpi.csv")]);
    assert_eq!(std::fs::read(&files[0]).unwrap(), B_CSV.as_bytes());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start_async().await;
    mock_folder(
        &server,
        COMMODITIES_ID,
        folder_page("commodities", &[("1fileA0000000", "A.csv")]),
    )
    .await;
    mock_file(&server, "1fileA0000000", "A.csv", A_CSV).await;

    let temp_dir = TempDir::new().unwrap();
    let fetcher = fetcher_for(&server);
    let options = options_under(temp_dir.path());

    let first = fetcher.fetch(COMMODITIES_ID, &options).await.unwrap();
    let first_bytes = std::fs::read(&first[0]).unwrap();
    let second = fetcher.fetch(COMMODITIES_ID, &options).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read(&second[0]).unwrap(), first_bytes);

    let entries: Vec<_> = std::fs::read_dir(temp_dir.path().join("commodities"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("A.csv")]);
}

#[tokio::test]
async fn test_deleted_folder_fails_without_writing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/drive/folders/");
            then.status(404).body("<html><title>Not Found</title></html>");
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let result = fetcher_for(&server)
        .fetch(COMMODITIES_ID, &options_under(temp_dir.path()))
        .await;

    assert!(matches!(result, Err(AppError::Folder(FolderError::NotFound { .. }))));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_malformed_identifier_fails_without_writing() {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new().unwrap();

    let result = fetcher_for(&server)
        .fetch("https://drive.google.com/drive/my-drive", &options_under(temp_dir.path()))
        .await;

    assert!(matches!(
        result,
        Err(AppError::Folder(FolderError::InvalidIdentifier { .. }))
    ));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_quota_exhaustion_is_reported() {
    let server = MockServer::start_async().await;
    mock_folder(
        &server,
        MACRO_ID,
        folder_page("macro", &[("1popular000000", "gdp.csv")]),
    )
    .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/uc");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(
                    r#"<html><body><p class="uc-error-subcaption">Too many users have viewed or downloaded this file recently. Please try accessing the file again later.</p></body></html>"#,
                );
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let result = fetcher_for(&server)
        .fetch(MACRO_ID, &options_under(temp_dir.path()))
        .await;

    match result {
        Err(e @ AppError::Download(DownloadError::QuotaExceeded { .. })) => {
            assert!(e.is_recoverable());
        }
        other => panic!("Expected quota error, got {:?}", other),
    }
    assert!(!temp_dir.path().join("macro").join("gdp.csv").exists());
}

#[tokio::test]
async fn test_browser_cookies_are_sent_when_enabled() {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new().unwrap();
    let cookies = temp_dir.path().join("cookies.txt");
    std::fs::write(
        &cookies,
        "# Netscape HTTP Cookie File\n127.0.0.1\tFALSE\t/\tFALSE\t0\tSID\tsecret\n",
    )
    .unwrap();

    let page = folder_page("private", &[]);
    let with_cookie = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/drive/folders/{}", COMMODITIES_ID))
                .header("cookie", "SID=secret");
            then.status(200).body(page);
        })
        .await;

    let fetcher = DriveFetcher::new(ClientConfig {
        base_url: server.base_url(),
        cookies_file: Some(cookies),
        ..Default::default()
    });
    let options = FetchOptions {
        use_cookies: true,
        dry_run: true,
        ..options_under(temp_dir.path())
    };

    let files = fetcher.fetch(COMMODITIES_ID, &options).await.unwrap();

    assert!(files.is_empty());
    with_cookie.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_datasets_are_fetched_in_order() {
    let server = MockServer::start_async().await;
    mock_folder(
        &server,
        COMMODITIES_ID,
        folder_page("commodities", &[("1fileA0000000", "A.csv")]),
    )
    .await;
    mock_folder(
        &server,
        MACRO_ID,
        folder_page("macro", &[("1fileB0000000", "B.csv")]),
    )
    .await;
    mock_file(&server, "1fileA0000000", "A.csv", A_CSV).await;
    mock_file(&server, "1fileB0000000", "B.csv", B_CSV).await;

    let temp_dir = TempDir::new().unwrap();
    let datasets = vec![
        Dataset::new("commodities", COMMODITIES_ID),
        Dataset::new("macro", MACRO_ID),
    ];

    let files = fetch_datasets(&fetcher_for(&server), &datasets, &options_under(temp_dir.path()))
        .await
        .unwrap();

    assert_eq!(
        files,
        vec![
            temp_dir.path().join("commodities").join("A.csv"),
            temp_dir.path().join("macro").join("B.csv"),
        ]
    );
}
