use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a data file into a [`MeasurementTable`](super::model::MeasurementTable).
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: required column '{column}' is missing")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}: {detail}")]
    Malformed { path: PathBuf, detail: String },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

impl DataLoadError {
    pub(crate) fn malformed(path: &std::path::Path, detail: impl Into<String>) -> Self {
        DataLoadError::Malformed {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }
}
