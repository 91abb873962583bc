//! Portable export/import documents for the soundboard.
//!
//! A [`PortableDocument`] bundles a snapshot with the content of every
//! library entry, each encoded as a data URL, so the whole board travels as
//! one self-contained JSON file:
//!
//! ```text
//! { "state": <snapshot>, "files": { "<storage key>": { "name", "inlineContent" } } }
//! ```
//!
//! - [`export`] builds a document from a workspace and its blob store.
//! - [`restore`] replaces the store's content with a document's files and
//!   returns the snapshot to install.

pub mod document;
pub mod error;
pub mod reader;
pub mod writer;

pub use document::{PortableDocument, PortableFile};
pub use error::{PortError, PortResult};
pub use reader::{restore, ImportReport};
pub use writer::export;
