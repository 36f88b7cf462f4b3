//! Reading a function's sidecar metadata.
//!
//! The artifact store's tar.gz cache entry carries three headers —
//! `Function-Memory`, `Function-Timeout`, `Function-Main` — encoded here as
//! a small JSON sidecar read alongside it. All three are mandatory; missing
//! any one is a hard failure of `load_function`, never silently defaulted.

use crate::error::CoreError;
use std::path::Path;
use zion_common::FunctionMetadata;

/// Load and validate a function's sidecar metadata from `path`.
pub async fn load(function: &str, path: &Path) -> Result<FunctionMetadata, CoreError> {
    let bytes = tokio::fs::read(path).await?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;

    let memory_mib = value
        .get("memory_mib")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| CoreError::MissingMetadata {
            function: function.to_string(),
            field: "memory_mib",
        })?;
    let timeout_secs = value
        .get("timeout_secs")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| CoreError::MissingMetadata {
            function: function.to_string(),
            field: "timeout_secs",
        })?;
    let main_class = value
        .get("main_class")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CoreError::MissingMetadata {
            function: function.to_string(),
            field: "main_class",
        })?
        .to_string();

    Ok(FunctionMetadata {
        memory_mib,
        timeout_secs,
        main_class,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_complete_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fn.meta.json");
        tokio::fs::write(
            &path,
            br#"{"memory_mib": 128, "timeout_secs": 30, "main_class": "handler.main"}"#,
        )
        .await
        .unwrap();

        let meta = load("hello-world", &path).await.unwrap();
        assert_eq!(meta.memory_mib, 128);
        assert_eq!(meta.timeout_secs, 30);
        assert_eq!(meta.main_class, "handler.main");
    }

    #[tokio::test]
    async fn missing_field_is_a_hard_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fn.meta.json");
        tokio::fs::write(&path, br#"{"memory_mib": 128, "timeout_secs": 30}"#)
            .await
            .unwrap();

        let err = load("hello-world", &path).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::MissingMetadata { field: "main_class", .. }
        ));
    }
}
