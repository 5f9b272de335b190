//! Render diagram source files to image files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::client::PlantUml;
use crate::error::{ConnectionError, PlantUmlError};
use crate::http::Transport;

/// Where `process_file` writes its results. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// Image file name. Defaults to the source with a `.png` extension.
    pub outfile: Option<PathBuf>,
    /// Error page file name. Defaults to the source stem + `_error.html`.
    pub errorfile: Option<PathBuf>,
    /// Directory both names are resolved against; created when missing.
    pub directory: Option<PathBuf>,
}

impl<T: Transport> PlantUml<T> {
    /// Render the diagram in `source` and write the image.
    ///
    /// Returns `Ok(true)` when the image was written and `Ok(false)` when the
    /// server rejected the diagram and its error page was written instead.
    /// Any other failure is returned as an error.
    pub fn process_file(&self, source: impl AsRef<Path>, options: &FileOptions) -> Result<bool, PlantUmlError> {
        let source = source.as_ref();
        let directory = options.directory.as_deref().unwrap_or(Path::new(""));
        let outfile = directory.join(options.outfile.clone().unwrap_or_else(|| default_outfile(source)));
        let errorfile = directory.join(options.errorfile.clone().unwrap_or_else(|| default_errorfile(source)));

        if !directory.as_os_str().is_empty() {
            create_dir(directory)?;
        }
        let text = fs::read_to_string(source).map_err(|e| io_error(source, e))?;

        match self.fetch(&text) {
            Ok(image) => {
                write_file(&outfile, &image)?;
                Ok(true)
            }
            Err(PlantUmlError::Connection(ConnectionError::Http(err))) => {
                warn!(source = %source.display(), status = err.status, errorfile = %errorfile.display(), "server rejected diagram");
                write_file(&errorfile, &err.body)?;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// `diagrams/seq.puml` → `diagrams/seq.png`
pub fn default_outfile(source: &Path) -> PathBuf {
    source.with_extension("png")
}

/// `diagrams/seq.puml` → `diagrams/seq_error.html`
pub fn default_errorfile(source: &Path) -> PathBuf {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push("_error.html");
    source.with_file_name(name)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PlantUmlError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir(parent)?;
    }
    fs::write(path, contents).map_err(|e| io_error(path, e))
}

fn create_dir(path: &Path) -> Result<(), PlantUmlError> {
    fs::create_dir_all(path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> PlantUmlError {
    PlantUmlError::Io {
        path: path.to_path_buf(),
        source,
    }
}
