//! Loaders for the regex engine backend: the compiled syntax set the custom
//! grammar is registered into.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bincode::Options;
use futures::FutureExt;
use futures::future::BoxFuture;
use syntect::parsing::SyntaxSet;

use crate::error::ConstructionError;

pub trait BackendLoader: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Result<SyntaxSet, ConstructionError>>;
}

/// syntect's bundled syntaxes, newline mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedBackend;

impl BackendLoader for EmbeddedBackend {
    fn load(&self) -> BoxFuture<'static, Result<SyntaxSet, ConstructionError>> {
        async {
            tokio::task::spawn_blocking(SyntaxSet::load_defaults_newlines)
                .await
                .map_err(|e| ConstructionError::BackendTask(e.to_string()))
        }
        .boxed()
    }
}

/// A syntax set previously written with `syntect::dumps::dump_to_uncompressed_file`.
#[derive(Debug, Clone)]
pub struct DumpFileBackend {
    path: PathBuf,
}

impl DumpFileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackendLoader for DumpFileBackend {
    fn load(&self) -> BoxFuture<'static, Result<SyntaxSet, ConstructionError>> {
        let path = self.path.clone();
        async move {
            let bytes = tokio::fs::read(&path).await.map_err(|e| ConstructionError::BackendLoad {
                path: path.clone(),
                source: Arc::new(e),
            })?;

            tokio::task::spawn_blocking(move || decode_dump(&bytes))
            .await
            .map_err(|e| ConstructionError::BackendTask(e.to_string()))?
        }
        .boxed()
    }
}

/// Decodes a syntect dump. Same bincode layout as `syntect::dumps`, but no
/// length prefix may claim more bytes than the file holds.
fn decode_dump(bytes: &[u8]) -> Result<SyntaxSet, ConstructionError> {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(bytes.len() as u64)
        .deserialize(bytes)
        .map_err(|e| ConstructionError::BackendDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedded_backend_has_default_syntaxes() {
        let set = EmbeddedBackend.load().await.unwrap();
        assert!(set.find_syntax_by_token("rust").is_some());
    }

    #[tokio::test]
    async fn missing_dump_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DumpFileBackend::new(dir.path().join("missing.packdump"));

        let err = backend.load().await.unwrap_err();
        assert!(matches!(err, ConstructionError::BackendLoad { .. }));
    }

    #[tokio::test]
    async fn corrupt_dump_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syntaxes.packdump");
        std::fs::write(&path, b"definitely not bincode").unwrap();

        let err = DumpFileBackend::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ConstructionError::BackendDecode(_)));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        // one syntax whose name claims u64::MAX bytes
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        bytes.extend_from_slice(b"tail");

        let err = decode_dump(&bytes).unwrap_err();
        assert!(matches!(err, ConstructionError::BackendDecode(_)));
    }

    #[test]
    fn truncated_dump_is_rejected() {
        let set = SyntaxSet::load_defaults_newlines();
        let bytes = bincode::serialize(&set).unwrap();

        let err = decode_dump(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ConstructionError::BackendDecode(_)));
    }

    #[tokio::test]
    async fn dump_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syntaxes.packdump");
        let set = SyntaxSet::load_defaults_newlines();
        syntect::dumps::dump_to_uncompressed_file(&set, &path).unwrap();

        let loaded = DumpFileBackend::new(&path).load().await.unwrap();
        assert_eq!(loaded.syntaxes().len(), set.syntaxes().len());
    }
}
