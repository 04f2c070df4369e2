use crate::client::{self, TelemetryClient};
use backtraced_error::{IoError, SerdeJsonError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to fetch export of error {id}")]
    Fetch {
        id: String,
        #[source]
        source: client::Error,
    },
    #[error("failed to serialize export")]
    Serialize(#[source] SerdeJsonError),
    #[error("failed to write export")]
    Io(#[source] IoError),
}

/// `error-<id>.json`, with anything that is not safe in a file name replaced.
pub fn export_file_name(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("error-{sanitized}.json")
}

/// Downloads the export payload of `id` and writes it as pretty JSON into `out_dir`.
#[instrument(skip(client))]
pub async fn export_error<C: TelemetryClient + ?Sized>(
    client: &C,
    id: &str,
    out_dir: &Path,
) -> Result<PathBuf, Error> {
    let payload = client.error_export(id).await.map_err(|source| Error::Fetch {
        id: id.to_string(),
        source,
    })?;
    let pretty = serde_json::to_string_pretty(&payload).map_err(|e| {
        Error::Serialize(SerdeJsonError::from_serde_json_error(
            e,
            format!("serializing export of {id}"),
            "",
        ))
    })?;
    let path = out_dir.join(export_file_name(id));
    tokio::fs::write(&path, pretty).await.map_err(|e| {
        Error::Io(IoError::from_io_error(
            e,
            format!("writing {}", path.display()),
        ))
    })?;
    info!("Exported error {id} to {}", path.display());
    Ok(path)
}
