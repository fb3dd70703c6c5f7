use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use super::naming::ArtifactName;
use super::ArtifactCategory;
use crate::errors::ToolError;

/// Writes artifacts under `<root>/<category dir>/`.
///
/// Content lands in a hidden temporary file first and is renamed into place,
/// so a directory listing only ever shows complete artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn category_dir(&self, category: ArtifactCategory) -> PathBuf {
        self.root.join(category.relative_dir())
    }

    pub fn ensure_dir(&self, category: ArtifactCategory) -> Result<PathBuf, ToolError> {
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir).map_err(|err| ToolError::io(&dir, err))?;
        fs::canonicalize(&dir).map_err(|err| ToolError::io(&dir, err))
    }

    pub fn write(
        &self,
        category: ArtifactCategory,
        name: &ArtifactName,
        content: &[u8],
    ) -> Result<PathBuf, ToolError> {
        self.write_with(category, name, |sink| {
            sink.write_all(content)
                .map_err(|err| ToolError::io(self.category_dir(category), err))
        })
    }

    /// Streams content produced by `fill`; on any failure the partial file is discarded.
    pub fn write_with<F>(
        &self,
        category: ArtifactCategory,
        name: &ArtifactName,
        fill: F,
    ) -> Result<PathBuf, ToolError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), ToolError>,
    {
        let dir = self.ensure_dir(category)?;
        let path = dir.join(name.file_name());
        let mut staged = tempfile::Builder::new()
            .prefix(".aitk-")
            .suffix(".partial")
            .tempfile_in(&dir)
            .map_err(|err| ToolError::io(&dir, err))?;

        fill(&mut staged)?;
        staged.flush().map_err(|err| ToolError::io(&path, err))?;
        staged
            .persist(&path)
            .map_err(|err| ToolError::io(&path, err.error))?;

        info!(category = category.label(), path = %path.display(), "artifact written");
        Ok(path)
    }
}
