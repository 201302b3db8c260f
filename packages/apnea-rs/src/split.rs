use crate::error::{DatasetError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Recording folders divided into a train and a test part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderSplit {
    pub train: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

/// Split the sub-folders of `folder` (sorted by name) so that the first
/// `round(n * ratio)` become training recordings
pub fn split_recording_folders(folder: &Path, ratio: f64) -> Result<FolderSplit> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(DatasetError::Configuration(format!(
            "Split ratio must be in [0, 1], got {}",
            ratio
        )));
    }
    if !folder.is_dir() {
        return Err(DatasetError::Configuration(format!(
            "Not a directory: {}",
            folder.display()
        )));
    }

    let escaped = glob::Pattern::escape(&folder.to_string_lossy());
    let pattern = format!("{}/*", escaped);
    let entries = glob::glob(&pattern)
        .map_err(|e| DatasetError::Configuration(format!("Invalid folder pattern: {}", e)))?;

    let mut folders = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DatasetError::IoError(e.into()))?;
        if path.is_dir() {
            folders.push(path);
        }
    }
    folders.sort();

    let n_train = (folders.len() as f64 * ratio).round() as usize;
    let test = folders.split_off(n_train.min(folders.len()));
    log::info!(
        "Split {}: {} train / {} test recordings",
        folder.display(),
        folders.len(),
        test.len()
    );

    Ok(FolderSplit {
        train: folders,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        // Plain files are ignored
        std::fs::write(dir.path().join("RECORDS"), "").unwrap();
        dir
    }

    #[test]
    fn test_split_is_sorted_and_rounded() {
        let dir = data_dir(&["tr03", "tr01", "tr02", "tr05", "tr04"]);
        let split = split_recording_folders(dir.path(), 0.7).unwrap();

        let names = |paths: &[PathBuf]| -> Vec<String> {
            paths
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };
        // round(5 * 0.7) = 4
        assert_eq!(names(&split.train), vec!["tr01", "tr02", "tr03", "tr04"]);
        assert_eq!(names(&split.test), vec!["tr05"]);
    }

    #[test]
    fn test_split_extremes() {
        let dir = data_dir(&["a", "b"]);
        assert!(split_recording_folders(dir.path(), 0.0).unwrap().train.is_empty());
        assert!(split_recording_folders(dir.path(), 1.0).unwrap().test.is_empty());
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        let dir = data_dir(&["a"]);
        assert!(matches!(
            split_recording_folders(dir.path(), 1.5),
            Err(DatasetError::Configuration(_))
        ));
    }
}
