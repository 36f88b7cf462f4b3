//! Shared domain types used across the Zion supervisor crates.
//!
//! This crate holds the small set of identifiers (`SlotId`, `SlotName`,
//! `FunctionName`) and metadata shapes (`FunctionMetadata`) that the
//! coordination-store client, container-runtime client, and orchestration
//! core all need to agree on, so none of them has to depend on the others
//! just to share a type.

pub mod types;

pub use types::{FunctionMetadata, FunctionName, SlotId, SlotName};
