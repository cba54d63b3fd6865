//! Integration tests for the Azure Blob and Table Storage clients against a mock server

use dextract::adapters::azure::{AzureBlobClient, StaticTokenSource, TableStorageClient};
use dextract::adapters::storage::BlobStore;
use dextract::domain::{CellValue, DextractError, StorageError};
use mockito::Matcher;
use std::sync::Arc;
use tempfile::TempDir;

fn blob_client(server: &mockito::ServerGuard) -> AzureBlobClient {
    AzureBlobClient::new(
        &server.url(),
        "extracts",
        Arc::new(StaticTokenSource::new("test-token")),
        10,
    )
    .unwrap()
}

fn table_client(server: &mockito::ServerGuard) -> TableStorageClient {
    TableStorageClient::new(&server.url(), Arc::new(StaticTokenSource::new("test-token")), 10)
        .unwrap()
}

#[tokio::test]
async fn test_list_blobs_follows_next_marker() {
    let mut server = mockito::Server::new_async().await;

    let first = server
        .mock("GET", "/extracts")
        .match_query(Matcher::Regex("comp=list$".to_string()))
        .match_header("authorization", "Bearer test-token")
        .match_header("x-ms-version", Matcher::Any)
        .with_status(200)
        .with_body(
            "<EnumerationResults><Blobs><Blob><Name>a.csv</Name></Blob></Blobs>\
             <NextMarker>2!abc</NextMarker></EnumerationResults>",
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/extracts")
        .match_query(Matcher::UrlEncoded("marker".to_string(), "2!abc".to_string()))
        .with_status(200)
        .with_body(
            "<EnumerationResults><Blobs><Blob><Name>raw/b.xlsx</Name></Blob></Blobs>\
             <NextMarker /></EnumerationResults>",
        )
        .create_async()
        .await;

    let names = blob_client(&server).list_blobs().await.unwrap();
    assert_eq!(names, vec!["a.csv", "raw/b.xlsx"]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_list_missing_container() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/extracts")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let result = blob_client(&server).list_blobs().await;
    assert!(matches!(
        result,
        Err(DextractError::Storage(StorageError::ContainerNotFound(_)))
    ));
}

#[tokio::test]
async fn test_forbidden_is_authentication_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/extracts")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("AuthorizationPermissionMismatch")
        .create_async()
        .await;

    let err = blob_client(&server).list_blobs().await.unwrap_err();
    assert!(matches!(
        err,
        DextractError::Storage(StorageError::AuthenticationFailed(_))
    ));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_upload_without_overwrite_sends_precondition() {
    let mut server = mockito::Server::new_async().await;
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.csv");
    std::fs::write(&file, "UserId\n0\n").unwrap();

    let created = server
        .mock("PUT", "/extracts/data/a.csv")
        .match_header("x-ms-blob-type", "BlockBlob")
        .match_header("if-none-match", Matcher::Missing)
        .match_body("UserId\n0\n")
        .with_status(201)
        .create_async()
        .await;

    let client = blob_client(&server);
    client.upload(&file, "data\\a.csv", true).await.unwrap();
    created.assert_async().await;

    server
        .mock("PUT", "/extracts/data/a.csv")
        .match_header("if-none-match", "*")
        .with_status(409)
        .create_async()
        .await;

    let result = client.upload(&file, "data/a.csv", false).await;
    assert!(matches!(
        result,
        Err(DextractError::Storage(StorageError::BlobAlreadyExists(ref name))) if name == "data/a.csv"
    ));
}

#[tokio::test]
async fn test_download_and_missing_blob() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/extracts/docs/README.md")
        .with_status(200)
        .with_body("# Data analysis")
        .create_async()
        .await;
    server
        .mock("GET", "/extracts/absent.csv")
        .with_status(404)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("docs").join("README.md");
    let client = blob_client(&server);

    client.download("docs/README.md", &dest).await.unwrap();
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "# Data analysis");

    let result = client.download("absent.csv", &temp_dir.path().join("x")).await;
    assert!(matches!(
        result,
        Err(DextractError::Storage(StorageError::BlobNotFound(_)))
    ));
}

#[tokio::test]
async fn test_exists_and_delete() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/extracts/a.csv")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("HEAD", "/extracts/b.csv")
        .with_status(404)
        .create_async()
        .await;
    let deleted = server
        .mock("DELETE", "/extracts/a.csv")
        .with_status(202)
        .create_async()
        .await;

    let client = blob_client(&server);
    assert!(client.exists("a.csv").await.unwrap());
    assert!(!client.exists("b.csv").await.unwrap());
    client.delete("a.csv").await.unwrap();
    deleted.assert_async().await;
}

#[tokio::test]
async fn test_ensure_container_tolerates_existing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/extracts")
        .match_query(Matcher::UrlEncoded("restype".to_string(), "container".to_string()))
        .with_status(409)
        .create_async()
        .await;

    blob_client(&server).ensure_container().await.unwrap();
}

#[tokio::test]
async fn test_query_entities_pages_and_drops_metadata() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/sessions()")
        .match_query(Matcher::Regex("^[^&]*$".to_string()))
        .match_header("accept", "application/json;odata=nometadata")
        .with_status(200)
        .with_header("x-ms-continuation-NextPartitionKey", "p2")
        .with_header("x-ms-continuation-NextRowKey", "r2")
        .with_body(
            r#"{"value":[{"PartitionKey":"p1","RowKey":"r1","UserId":101,
                "Timestamp":"2024-03-01T10:00:00Z","odata.etag":"W/1"}]}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/sessions()")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("NextPartitionKey".to_string(), "p2".to_string()),
            Matcher::UrlEncoded("NextRowKey".to_string(), "r2".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"value":[{"PartitionKey":"p2","RowKey":"r2","UserId":102,"Score":0.5}]}"#)
        .create_async()
        .await;

    let table = table_client(&server)
        .query_entities("sessions", Some("PartitionKey ge 'p'"))
        .await
        .unwrap();

    assert_eq!(table.n_rows(), 2);
    assert!(table.column("odata.etag").is_none());
    assert_eq!(
        table.column("UserId").unwrap().values(),
        &[CellValue::Int(101), CellValue::Int(102)]
    );
    assert_eq!(
        table.column("Score").unwrap().values(),
        &[CellValue::Null, CellValue::Float(0.5)]
    );
    assert!(matches!(
        table.column("Timestamp").unwrap().values()[0],
        CellValue::DateTime(_)
    ));
}

#[tokio::test]
async fn test_query_missing_table() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/absent()")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let result = table_client(&server).query_entities("absent", None).await;
    assert!(matches!(
        result,
        Err(DextractError::Storage(StorageError::TableNotFound(ref t))) if t == "absent"
    ));
}
