//! Control-channel framing for the per-slot named pipe.
//!
//! The supervisor writes one framed "datagram" per control message: a
//! command tag, the function's file paths (opened by the in-sandbox agent
//! itself, since fd-passing across a FIFO isn't possible — only a Unix
//! domain socket carries ancillary data), and per-file metadata. Framing
//! is length-prefixed JSON so the agent can read a complete datagram
//! without blocking on a partial write.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// The only command the supervisor currently issues over the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DatagramCommand {
    /// Load and run a function in the sandbox.
    Execute = 1,
}

/// Per-file metadata accompanying a control datagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Tarball filename of the function artifact.
    pub function: String,
    /// Entry-point identifier passed through to the function runtime.
    pub main_class: String,
}

/// One framed message written to a slot's control pipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datagram {
    /// The command tag.
    pub command: DatagramCommand,
    /// Paths to the files this datagram references.
    pub files: Vec<PathBuf>,
    /// Metadata describing each referenced file, in the same order.
    pub metadata: Vec<FileMetadata>,
}

impl Datagram {
    /// Build the single "execute" datagram the Sandbox Supervisor sends
    /// from `load_function`.
    pub fn execute(function_path: PathBuf, function: String, main_class: String) -> Self {
        Self {
            command: DatagramCommand::Execute,
            files: vec![function_path],
            metadata: vec![FileMetadata {
                function,
                main_class,
            }],
        }
    }
}

/// Write `datagram` to the named pipe at `pipe_path`.
///
/// A non-zero result from the underlying write (including the pipe having
/// no reader yet) is a hard failure, matching the source's treatment of a
/// failed channel send.
pub async fn send(pipe_path: &Path, datagram: &Datagram) -> Result<()> {
    let payload = serde_json::to_vec(datagram)?;
    let len = (payload.len() as u32).to_be_bytes();

    let mut sender = tokio::net::unix::pipe::OpenOptions::new()
        .open_sender(pipe_path)
        .map_err(|e| CoreError::ChannelSend {
            slot: pipe_path.display().to_string(),
            reason: e.to_string(),
        })?;

    sender
        .write_all(&len)
        .await
        .map_err(|e| CoreError::ChannelSend {
            slot: pipe_path.display().to_string(),
            reason: e.to_string(),
        })?;
    sender
        .write_all(&payload)
        .await
        .map_err(|e| CoreError::ChannelSend {
            slot: pipe_path.display().to_string(),
            reason: e.to_string(),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_datagram_carries_one_file_and_one_metadata_entry() {
        let datagram = Datagram::execute(
            PathBuf::from("/pool/zion_0/function/hello-world"),
            "hello-world".to_string(),
            "handler.main".to_string(),
        );
        assert_eq!(datagram.command, DatagramCommand::Execute);
        assert_eq!(datagram.files.len(), 1);
        assert_eq!(datagram.metadata.len(), 1);
        assert_eq!(datagram.metadata[0].main_class, "handler.main");
    }

    #[test]
    fn datagram_roundtrips_through_json() {
        let datagram = Datagram::execute(
            PathBuf::from("/pool/zion_0/function/hello-world"),
            "hello-world".to_string(),
            "handler.main".to_string(),
        );
        let bytes = serde_json::to_vec(&datagram).unwrap();
        let decoded: Datagram = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.files, datagram.files);
    }
}
