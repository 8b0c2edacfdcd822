//! Summary files, one per problem.

use std::path::{Path, PathBuf};

use tracing::debug;

use conceptsum_core::{Error, Result};

/// Writes `<dir>/<problem_id>` atomically: the text goes to a hidden
/// temporary file first and is renamed into place, so an interrupted run
/// never leaves a partial summary behind.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, problem_id: &str) -> Result<PathBuf> {
        if problem_id.is_empty()
            || problem_id.starts_with('.')
            || problem_id.contains(|c: char| c == '/' || c == '\\')
        {
            return Err(Error::Input(format!(
                "problem id {:?} is not usable as a file name",
                problem_id
            )));
        }
        Ok(self.dir.join(problem_id))
    }

    pub fn write(&self, problem_id: &str, text: &str) -> Result<PathBuf> {
        let path = self.path_for(problem_id)?;
        let tmp = self.dir.join(format!(".{}.tmp", problem_id));
        std::fs::write(&tmp, text)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!("Wrote {} bytes to {}", text.len(), path.display());
        Ok(path)
    }
}
