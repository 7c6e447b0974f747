use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use serde_json::Value;
use thiserror::Error;

use super::definitions::{Definition, RecordContext};
use super::table::{BoundedTable, CapacityExceeded};

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("{}: invalid json: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: expected a top-level array of objects", path.display())]
    NotAnArray { path: PathBuf },

    #[error("{}: {kind} {idx} is not an object", path.display())]
    NotAnObject {
        path: PathBuf,
        kind: &'static str,
        idx: usize,
    },

    #[error("{}: {kind} {idx} is malformed: {source}", path.display())]
    Record {
        path: PathBuf,
        kind: &'static str,
        idx: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Full(#[from] CapacityExceeded),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    // records written into the table
    pub loaded: usize,
    // records left over once the table was full
    pub dropped: usize,
    // loaded records that lacked a field the shader relies on
    pub incomplete: usize,
}

/// Reads `path` and fills `table` from it. A file that cannot be read is
/// logged and yields an empty report; malformed content is an error.
pub fn load_table<T: Definition>(
    path: &Path,
    asset_root: &str,
    table: &mut BoundedTable<T>,
) -> Result<LoadReport, SceneError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            error!("failed to open file {}: {}", path.display(), e);
            return Ok(LoadReport::default());
        }
    };
    parse_table(&text, path, asset_root, table)
}

/// Parses scene text into `table`. `path` only labels errors and log lines.
pub fn parse_table<T: Definition>(
    text: &str,
    path: &Path,
    asset_root: &str,
    table: &mut BoundedTable<T>,
) -> Result<LoadReport, SceneError> {
    let document: Value = serde_json::from_str(text).map_err(|source| SceneError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(records) = document else {
        return Err(SceneError::NotAnArray {
            path: path.to_path_buf(),
        });
    };

    let mut report = LoadReport::default();
    let total = records.len();

    for (i, record) in records.into_iter().enumerate() {
        if table.is_full() {
            report.dropped = total - i;
            warn!(
                "{}: {} table is full ({}), ignoring {} remaining record(s)",
                path.display(),
                T::KIND,
                table.capacity(),
                report.dropped
            );
            break;
        }

        let idx = table.len();
        if !record.is_object() {
            return Err(SceneError::NotAnObject {
                path: path.to_path_buf(),
                kind: T::KIND,
                idx,
            });
        }

        let json: T::Json = serde_json::from_value(record).map_err(|source| SceneError::Record {
            path: path.to_path_buf(),
            kind: T::KIND,
            idx,
            source,
        })?;

        let ctx = RecordContext { asset_root, idx };
        let mut complete = true;
        table.fill_next(|slot| complete = T::apply(json, slot, &ctx))?;
        report.loaded += 1;
        if !complete {
            report.incomplete += 1;
        }
    }

    debug!(
        "{}: loaded {} {}(s)",
        path.display(),
        report.loaded,
        T::KIND
    );
    Ok(report)
}
