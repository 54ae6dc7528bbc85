//! # rmnb-core
//!
//! A library for decoding reMarkable notebook exports.
//!
//! An export is a zip archive holding a binary `.lines` stroke file plus sidecar
//! members: JSON metadata, a per-page template list, page thumbnails and, for
//! annotated documents, the original PDF or EPUB.
//!
//! ## Architecture
//!
//! - [`cursor`]: Forward-only little-endian reader
//! - [`lines`]: Decoder for the `.lines` stroke format
//! - [`archive`]: Member recognition and dispatch
//! - [`model`]: The decoded notebook tree
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use rmnb_core::{DecoderConfig, NotebookDecoder};
//! use std::fs;
//!
//! let data = fs::read("notebook.zip")?;
//!
//! let decoder = NotebookDecoder::with_config(DecoderConfig::new().load_thumbnails(false));
//! let notebook = decoder.decode_bytes(&data)?;
//!
//! for (index, page) in notebook.pages.iter().enumerate() {
//!     println!("page {}: {} stroke(s) on '{}'", index, page.line_count(), page.template);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod archive;
pub mod cursor;
pub mod error;
pub mod lines;
pub mod model;

// Re-export primary types for convenience
pub use archive::{decode_file, decode_file_with_config, DecoderConfig, NotebookDecoder, Role};
pub use cursor::ByteCursor;
pub use error::{Error, ErrorKind, Result};
pub use lines::{decode_pages, StrokeDecoder, HEADER};
pub use model::{
    BrushColor, BrushSize, BrushType, Content, ExtraMetadata, Layer, Line, Notebook, Page, Point,
    Transform, DEVICE_HEIGHT, DEVICE_WIDTH,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
