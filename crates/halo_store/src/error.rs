use std::path::PathBuf;

use halo_core::BridgeError;
use thiserror::Error;

use crate::mirror::MirrorKind;
use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} sync loop has stopped")]
    SyncStopped(MirrorKind),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("storage file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
