//! Integration tests for the full data extract lifecycle:
//! create, load sources, pseudonymise, export, report, save, reload and archive

use dextract::adapters::file::csv::read_table;
use dextract::adapters::storage::{BlobStore, LocalBlobStore};
use dextract::core::extract::{DataExtract, DataSource};
use dextract::domain::{
    CellValue, Column, DataSourceName, DextractError, EntityName, PseudonymisationError, Table,
};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

fn name(s: &str) -> DataSourceName {
    DataSourceName::new(s).unwrap()
}

fn sessions() -> DataSource {
    let table = Table::from_columns(vec![
        Column::new("UserId", [101_i64, 102, 101]),
        Column::new("Score", [0.5_f64, 0.75, 1.0]),
        Column::new("Subject", ["maths", "art", "maths"]),
    ])
    .unwrap();

    DataSource::new(name("quiz_sessions"), table)
        .with_description("One row per quiz attempt.")
        .with_columns_to_entities([("UserId", EntityName::new("User").unwrap())].into_iter().collect())
        .with_glossary(BTreeMap::from([(
            "Score".to_string(),
            "Fraction of correct answers.".to_string(),
        )]))
}

#[test]
fn test_layout_created_on_new() {
    let temp_dir = TempDir::new().unwrap();
    let extract = DataExtract::new("study", "Cohort 2025", temp_dir.path()).unwrap();
    let layout = extract.layout();

    assert_eq!(extract.id().as_str().len(), 32);
    assert!(layout.data_dir().is_dir());
    assert!(layout.img_dir().is_dir());
    assert!(layout.docs_img_dir().is_dir());
    assert!(layout
        .root()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("study-"));
}

#[test]
fn test_export_requires_pseudonymisation() {
    let temp_dir = TempDir::new().unwrap();
    let mut extract = DataExtract::new("study", "", temp_dir.path()).unwrap();
    extract.add_data_source(sessions());

    let result = extract.export(None);
    assert!(matches!(
        result,
        Err(DextractError::Pseudonymisation(
            PseudonymisationError::NotPseudonymised { .. }
        ))
    ));
    assert!(fs::read_dir(extract.layout().data_dir()).unwrap().next().is_none());
}

#[test]
fn test_export_report_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let mut extract = DataExtract::new("study", "Quiz activity.", temp_dir.path()).unwrap();
    extract.add_data_source(sessions());
    extract.pseudonymise(&name("quiz_sessions")).unwrap();

    let exported = extract.export(None).unwrap();
    assert_eq!(exported.len(), 1);
    let table = read_table(&exported[0]).unwrap();
    assert_eq!(
        table.column("UserId").unwrap().values(),
        &[CellValue::Int(0), CellValue::Int(1), CellValue::Int(0)]
    );

    let report = fs::read_to_string(extract.generate_markdown_report().unwrap()).unwrap();
    assert!(report.starts_with("# Data analysis for study"));
    assert!(report.contains("1. [Introduction](#introduction)"));
    assert!(report.contains("    1. [quiz_sessions](#quiz_sessions)"));
    assert!(report.contains("Quiz activity."));
    assert!(report.contains("| Score | Fraction of correct answers. |"));

    let private_file = extract.save().unwrap();
    assert!(private_file
        .to_string_lossy()
        .ends_with(&format!("{}-PRIVATE.json", extract.layout().name_date_id())));

    let restored = DataExtract::load(&private_file).unwrap();
    assert_eq!(restored.id(), extract.id());
    assert_eq!(restored.layout().root(), extract.layout().root());
    let source = restored.data_source(&name("quiz_sessions")).unwrap();
    assert!(source.is_pseudonymised());
    assert_eq!(source.extract_id(), Some(extract.id()));
    assert_eq!(restored.mappings(), extract.mappings());
}

#[test]
fn test_export_named_sources_only() {
    let temp_dir = TempDir::new().unwrap();
    let mut extract = DataExtract::new("study", "", temp_dir.path()).unwrap();
    extract.add_data_source(sessions());
    extract.add_data_source(DataSource::new(
        name("subjects"),
        Table::from_columns(vec![Column::new("Subject", ["maths"])]).unwrap(),
    ));
    extract.pseudonymise(&name("quiz_sessions")).unwrap();
    extract.pseudonymise(&name("subjects")).unwrap();

    let exported = extract.export(Some(&[name("subjects")])).unwrap();
    assert_eq!(exported.len(), 1);
    assert!(exported[0].ends_with("subjects.csv"));

    let missing = extract.export(Some(&[name("nope")]));
    assert!(matches!(
        missing,
        Err(DextractError::Pseudonymisation(PseudonymisationError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn test_archive_uploads_public_zip() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = TempDir::new().unwrap();
    let store = LocalBlobStore::new(blobs.path());

    let mut extract = DataExtract::new("study", "", temp_dir.path()).unwrap();
    extract.add_data_source(sessions());
    extract.pseudonymise(&name("quiz_sessions")).unwrap();
    extract.export(None).unwrap();
    extract.generate_markdown_report().unwrap();

    let blob = extract.archive(&store).await.unwrap();
    let layout = extract.layout();
    assert_eq!(
        blob,
        format!("{}/{}", layout.name_date_id(), layout.archive_file_name())
    );
    assert!(layout.archive_file().is_file());
    assert!(store.exists(&blob).await.unwrap());

    let archive = fs::File::open(layout.archive_file()).unwrap();
    let mut zip = zip::ZipArchive::new(archive).unwrap();
    let names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(names.iter().any(|n| n.ends_with("data/quiz_sessions.csv")));
    assert!(names.iter().any(|n| n.ends_with("docs/README.md")));
}
