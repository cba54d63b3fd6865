//! Zip archiving of the public folder

use crate::domain::{DextractError, Result};
use std::fs::File;
use std::io;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zips the contents of `folder` (deflated) into `archive`
///
/// Entry names are relative to `folder` and use `/` separators. Returns the number
/// of files written.
pub fn zip_folder(folder: &Path, archive: &Path) -> Result<usize> {
    if !folder.is_dir() {
        return Err(DextractError::Export(format!(
            "Cannot archive {}: not a directory",
            folder.display()
        )));
    }

    let mut writer = ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0;

    for entry in WalkDir::new(folder).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| DextractError::Io(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(folder)
            .map_err(|e| DextractError::Export(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options)?;
        } else {
            writer.start_file(name, options)?;
            io::copy(&mut File::open(entry.path())?, &mut writer)?;
            files += 1;
        }
    }

    writer.finish()?;
    tracing::debug!(
        folder = %folder.display(),
        archive = %archive.display(),
        files,
        "Created archive"
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_zip_folder() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("public");
        fs::create_dir_all(folder.join("data")).unwrap();
        fs::create_dir_all(folder.join("img")).unwrap();
        fs::write(folder.join("data").join("a.csv"), "x\n1\n").unwrap();

        let archive = temp_dir.path().join("public.zip");
        assert_eq!(zip_folder(&folder, &archive).unwrap(), 1);

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut contents = String::new();
        zip.by_name("data/a.csv")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "x\n1\n");
        assert!(zip.file_names().any(|n| n.starts_with("img")));
    }

    #[test]
    fn test_missing_folder() {
        let temp_dir = TempDir::new().unwrap();
        let result = zip_folder(&temp_dir.path().join("nope"), &temp_dir.path().join("a.zip"));
        assert!(matches!(result, Err(DextractError::Export(_))));
    }
}
