//! ZIP archive parsing and cross-validation.
//!
//! ## Architecture
//!
//! - [`locator`]: finds the End of Central Directory by bounded backward scan
//! - [`parser`]: decodes every Central Directory Entry into an [`EntryCatalog`]
//! - [`local_header`]: checks a Local File Header against its catalogued entry
//! - [`stream`]: resolves an entry by name and hands out a bounded data stream
//! - [`archive`]: ties the above together as [`ZipArchive`]
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Two readers that disagree about which bytes belong to which entry are
//! how a signed APK ends up running unsigned code. This implementation takes
//! every size from the central directory, rejects duplicate names, and
//! re-checks the local header each time an entry is opened.
//!
//! ## Limitations
//!
//! - No encryption support (rejected)
//! - No multi-disk archive support (rejected)
//! - No ZIP64
//! - STORED and DEFLATE only

mod archive;
mod catalog;
mod cursor;
pub mod layout;
pub mod local_header;
pub mod locator;
pub mod parser;
pub mod stream;
mod structures;

pub use archive::ZipArchive;
pub use catalog::EntryCatalog;
pub use cursor::ByteCursor;
pub use layout::{Appnote, FieldLayout, Legacy, NameLengthSource};
pub use local_header::LocalHeaderInfo;
pub use stream::EntryStream;
pub use structures::*;
