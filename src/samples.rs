//! Alignment sources and the sample IDs they are stored under.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::MobamplotError;
use crate::io::parsers::utils::get_base_stem;

/// One alignment source and its sample ID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub id: String,
    pub path: PathBuf,
}

impl Sample {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// How the BAM files of a run are selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlignmentSelection {
    /// Every `*.bam` file in a directory.
    Folder(PathBuf),
    /// An explicit list of files.
    Files(Vec<PathBuf>),
}

impl AlignmentSelection {
    /// List the selected BAM files. Folder contents are sorted by path, so
    /// sample order does not depend on the filesystem.
    pub fn paths(&self) -> Result<Vec<PathBuf>, MobamplotError> {
        match self {
            AlignmentSelection::Files(files) => Ok(files.clone()),
            AlignmentSelection::Folder(folder) => {
                let paths = bam_files_in_folder(folder)?;
                if paths.is_empty() {
                    return Err(MobamplotError::NoAlignmentFiles(folder.clone()));
                }
                Ok(paths)
            }
        }
    }
}

fn bam_files_in_folder(folder: &Path) -> Result<Vec<PathBuf>, MobamplotError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "bam") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// The default sample ID of a BAM file: its file name without directory or extension.
pub fn sample_id_from_path(path: impl AsRef<Path>) -> String {
    get_base_stem(path)
}

/// Pair every BAM file with a sample ID.
///
/// If `ids` is `None`, IDs are derived from the file names. Otherwise there
/// must be exactly one ID per file. This is checked before any file is opened.
/// IDs must be unique, since count matrix columns are looked up by ID.
pub fn resolve_samples(
    paths: &[PathBuf],
    ids: Option<&[String]>,
) -> Result<Vec<Sample>, MobamplotError> {
    let ids: Vec<String> = match ids {
        Some(ids) => {
            if ids.len() != paths.len() {
                return Err(MobamplotError::SampleCountMismatch {
                    ids: ids.len(),
                    bams: paths.len(),
                });
            }
            ids.to_vec()
        }
        None => paths.iter().map(sample_id_from_path).collect(),
    };

    let mut seen = HashSet::new();
    for id in &ids {
        if !seen.insert(id.as_str()) {
            return Err(MobamplotError::DuplicateSampleId(id.clone()));
        }
    }

    Ok(ids
        .into_iter()
        .zip(paths.iter())
        .map(|(id, path)| Sample::new(id, path.clone()))
        .collect())
}
