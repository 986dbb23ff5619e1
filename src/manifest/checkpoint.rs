//! Manifest and table rendering plus whole-file checkpoint writes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::CheckpointError;
use super::result_set::ResultSet;
use crate::fetch::DownloadedImage;
use crate::source::SourceKind;

/// Default manifest file name.
pub const DEFAULT_MANIFEST_NAME: &str = "directory.json";

/// Default table export file name.
pub const DEFAULT_TABLE_NAME: &str = "directory.csv";

/// Delimiter of the table export.
const TABLE_DELIMITER: char = ',';

/// Replacement for the delimiter inside free-text fields.
const DELIMITER_SUBSTITUTE: char = ';';

/// The structured catalog of successful downloads (`directory.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Label of the remote source; absent for catalog runs.
    #[serde(rename = "api_source", default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    /// Metadata endpoint; absent for catalog runs.
    #[serde(rename = "api_url", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Base of the public URLs.
    pub base_url: String,
    /// Number of entries in `images`.
    pub total_images: usize,
    /// Entries sorted by submission index.
    pub images: Vec<ManifestEntry>,
}

/// One downloaded image in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Item identifier.
    pub id: u64,
    /// Saved file name.
    pub filename: String,
    /// Public URL.
    pub url: String,
    /// Auxiliary metadata, flattened into the entry.
    #[serde(flatten)]
    pub metadata: BTreeMap<String, String>,
    /// Where the content came from.
    pub original_url: String,
}

impl From<&DownloadedImage> for ManifestEntry {
    fn from(image: &DownloadedImage) -> Self {
        Self {
            id: image.id,
            filename: image.filename.clone(),
            url: image.public_url.clone(),
            metadata: image.metadata.clone(),
            original_url: image.original_url.clone(),
        }
    }
}

/// Paths written by one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    /// The JSON manifest.
    pub manifest: PathBuf,
    /// The table export.
    pub table: PathBuf,
}

/// Serializes a [`ResultSet`] into the manifest and table artifacts.
///
/// Output depends only on the set's contents, never on completion order, so
/// writing an unchanged set twice produces identical files.
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    output_dir: PathBuf,
    manifest_name: String,
    table_name: String,
    base_url: String,
    source_label: Option<String>,
    source_url: Option<String>,
    metadata_columns: Vec<String>,
}

impl CheckpointWriter {
    /// Creates a writer for `output_dir` with the default file names and the
    /// metadata columns of `kind`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, base_url: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            output_dir: output_dir.into(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            base_url: base_url.into(),
            source_label: None,
            source_url: None,
            metadata_columns: kind
                .metadata_columns()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Records the remote source label and endpoint in the manifest header.
    #[must_use]
    pub fn with_source(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self.source_url = Some(url.into());
        self
    }

    /// Overrides the artifact file names.
    #[must_use]
    pub fn with_file_names(
        mut self,
        manifest_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        self.manifest_name = manifest_name.into();
        self.table_name = table_name.into();
        self
    }

    /// Path of the JSON manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(&self.manifest_name)
    }

    /// Path of the table export.
    #[must_use]
    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(&self.table_name)
    }

    /// Builds the manifest for the current contents of `results`.
    #[must_use]
    pub fn build_manifest(&self, results: &ResultSet) -> Manifest {
        let images: Vec<ManifestEntry> = results
            .successes_by_index()
            .into_iter()
            .map(ManifestEntry::from)
            .collect();
        Manifest {
            source_label: self.source_label.clone(),
            source_url: self.source_url.clone(),
            base_url: self.base_url.clone(),
            total_images: images.len(),
            images,
        }
    }

    /// Renders the manifest as pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Serialize`] if serialization fails.
    pub fn render_manifest(&self, results: &ResultSet) -> Result<String, CheckpointError> {
        let mut json = serde_json::to_string_pretty(&self.build_manifest(results))?;
        json.push('\n');
        Ok(json)
    }

    /// Renders the table export.
    #[must_use]
    pub fn render_table(&self, results: &ResultSet) -> String {
        let mut header = vec!["id", "filename", "url"];
        header.extend(self.metadata_columns.iter().map(String::as_str));
        header.push("original_url");

        let mut out = header.join(",");
        out.push('\n');
        for image in results.successes_by_index() {
            let mut row = vec![
                image.id.to_string(),
                escape_field(&image.filename),
                escape_field(&image.public_url),
            ];
            row.extend(self.metadata_columns.iter().map(|column| {
                escape_field(image.metadata.get(column).map_or("", String::as_str))
            }));
            row.push(escape_field(&image.original_url));
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }

    /// Writes both artifacts, each as a whole-file replacement.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] if rendering or any file operation fails.
    #[instrument(skip(self, results), fields(results = results.len()))]
    pub async fn write(&self, results: &ResultSet) -> Result<CheckpointPaths, CheckpointError> {
        let manifest = self.render_manifest(results)?;
        let table = self.render_table(results);

        let manifest_path = self.manifest_path();
        let table_path = self.table_path();
        replace_file(&manifest_path, manifest.as_bytes()).await?;
        replace_file(&table_path, table.as_bytes()).await?;

        debug!(
            manifest = %manifest_path.display(),
            table = %table_path.display(),
            "checkpoint written"
        );
        Ok(CheckpointPaths {
            manifest: manifest_path,
            table: table_path,
        })
    }
}

/// Makes a value safe for the table export.
fn escape_field(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            TABLE_DELIMITER => DELIMITER_SUBSTITUTE,
            '\r' | '\n' => ' ',
            c => c,
        })
        .collect()
}

/// Writes `contents` to a sibling temp file and renames it over `path`.
async fn replace_file(path: &Path, contents: &[u8]) -> Result<(), CheckpointError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = tokio::fs::write(&tmp_path, contents).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(CheckpointError::io(&tmp_path, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(CheckpointError::io(path, e));
    }
    Ok(())
}
