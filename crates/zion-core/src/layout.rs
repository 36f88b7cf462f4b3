//! On-disk layout for a slot directory and for the function artifact store.
//!
//! A slot directory holds three subdirectories: `runtime` (seeded from the
//! node-global runtime image), `channel` (the control pipe to the
//! in-sandbox agent), and `function` (the currently loaded function
//! binary, absent when idle).

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Paths making up one slot's directory tree.
#[derive(Debug, Clone)]
pub struct SlotLayout {
    root: PathBuf,
}

impl SlotLayout {
    /// Describe the layout rooted at `slot_dir` (e.g. `<pool_root>/zion_3`).
    pub fn new(slot_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: slot_dir.into(),
        }
    }

    /// The slot's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/runtime`, seeded from the node-global runtime image.
    pub fn runtime_dir(&self) -> PathBuf {
        self.root.join("runtime")
    }

    /// `<root>/channel`, holding the control pipe.
    pub fn channel_dir(&self) -> PathBuf {
        self.root.join("channel")
    }

    /// `<root>/channel/pipe`, the named pipe the supervisor writes
    /// control datagrams to.
    pub fn channel_pipe(&self) -> PathBuf {
        self.channel_dir().join("pipe")
    }

    /// `<root>/function`, holding the currently loaded function binary.
    pub fn function_dir(&self) -> PathBuf {
        self.root.join("function")
    }

    /// Ensure the slot's directory tree exists, seeding `runtime` from
    /// `runtime_image_root` only if it is currently absent, and resetting
    /// `function` to empty every time (a slot never inherits a previous
    /// occupant's function binary).
    pub async fn prepare(&self, runtime_image_root: &Path) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        if !tokio::fs::try_exists(self.runtime_dir()).await? {
            copy_dir_recursive(runtime_image_root, &self.runtime_dir()).await?;
        }

        if tokio::fs::try_exists(self.function_dir()).await? {
            tokio::fs::remove_dir_all(self.function_dir()).await?;
        }
        tokio::fs::create_dir_all(self.function_dir()).await?;

        tokio::fs::create_dir_all(self.channel_dir()).await?;

        Ok(())
    }
}

fn copy_dir_recursive<'a>(
    from: &'a Path,
    to: &'a Path,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        tokio::fs::create_dir_all(to).await?;
        let mut entries = tokio::fs::read_dir(from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let dest = to.join(entry.file_name());
            if file_type.is_dir() {
                copy_dir_recursive(&entry.path(), &dest).await?;
            } else {
                tokio::fs::copy(entry.path(), dest).await?;
            }
        }
        Ok(())
    })
}

/// Locations making up a function's artifact store entry, rooted at
/// `<functions_root>/<function>`.
#[derive(Debug, Clone)]
pub struct FunctionArtifacts {
    root: PathBuf,
    function: String,
}

impl FunctionArtifacts {
    /// Describe the artifact layout for `function` under `functions_root`.
    pub fn new(functions_root: &Path, function: &str) -> Self {
        Self {
            root: functions_root.join(function),
            function: function.to_string(),
        }
    }

    /// `<functions_root>/<function>/bin/<function>`, the binary to copy
    /// into a slot's `function` directory.
    pub fn binary_path(&self) -> PathBuf {
        self.root.join("bin").join(&self.function)
    }

    /// `<functions_root>/<function>/cache/<function>.tar.gz`, the metadata
    /// carrier queried for `Function-Memory`, `Function-Timeout`, and
    /// `Function-Main`.
    pub fn metadata_path(&self) -> PathBuf {
        self.root
            .join("cache")
            .join(format!("{}.tar.gz", self.function))
    }

    /// `<functions_root>/<function>/logs/<function>/<function>.log`, the
    /// append target for the function's execution log.
    pub fn log_path(&self) -> PathBuf {
        self.root
            .join("logs")
            .join(&self.function)
            .join(format!("{}.log", self.function))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_layout_paths() {
        let layout = SlotLayout::new("/var/lib/zion/pool/zion_3");
        assert_eq!(
            layout.runtime_dir(),
            PathBuf::from("/var/lib/zion/pool/zion_3/runtime")
        );
        assert_eq!(
            layout.channel_pipe(),
            PathBuf::from("/var/lib/zion/pool/zion_3/channel/pipe")
        );
        assert_eq!(
            layout.function_dir(),
            PathBuf::from("/var/lib/zion/pool/zion_3/function")
        );
    }

    #[test]
    fn function_artifact_paths() {
        let artifacts =
            FunctionArtifacts::new(Path::new("/var/lib/zion/functions"), "hello-world");
        assert_eq!(
            artifacts.binary_path(),
            PathBuf::from("/var/lib/zion/functions/hello-world/bin/hello-world")
        );
        assert_eq!(
            artifacts.metadata_path(),
            PathBuf::from("/var/lib/zion/functions/hello-world/cache/hello-world.tar.gz")
        );
        assert_eq!(
            artifacts.log_path(),
            PathBuf::from("/var/lib/zion/functions/hello-world/logs/hello-world/hello-world.log")
        );
    }

    #[tokio::test]
    async fn prepare_seeds_runtime_once_and_resets_function() {
        let tmp = tempfile::tempdir().unwrap();
        let image_root = tmp.path().join("image");
        tokio::fs::create_dir_all(&image_root).await.unwrap();
        tokio::fs::write(image_root.join("marker"), b"seed")
            .await
            .unwrap();

        let slot_dir = tmp.path().join("zion_0");
        let layout = SlotLayout::new(&slot_dir);
        layout.prepare(&image_root).await.unwrap();
        assert!(tokio::fs::try_exists(layout.runtime_dir().join("marker"))
            .await
            .unwrap());

        tokio::fs::write(layout.function_dir().join("leftover"), b"x")
            .await
            .unwrap();
        layout.prepare(&image_root).await.unwrap();
        assert!(!tokio::fs::try_exists(layout.function_dir().join("leftover"))
            .await
            .unwrap());
    }
}
