//! # zipguard
//!
//! A ZIP/APK metadata reader whose central directory parse and per-entry
//! data streams cannot disagree with each other.
//!
//! Archives built to show one set of contents to a signature verifier and
//! another to the installer (the "Master Key" family: duplicate entry names,
//! local headers that contradict the central directory, NUL bytes in names)
//! are rejected either when the archive is opened or when the affected
//! entry is.
//!
//! ## Features
//!
//! - Bounded backward scan for the End of Central Directory record
//! - Duplicate, encrypted, spanned and NUL-named entries rejected at open
//! - Local headers re-validated against the catalog on every open
//! - Entry sizes always taken from the central directory
//! - STORED and DEFLATE entries, with CRC-32 checked at end of stream
//! - Safe concurrent reads from one file handle or memory mapping
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Read;
//! use zipguard::{ArchiveHandle, ZipArchive};
//!
//! fn main() -> anyhow::Result<()> {
//!     let file = std::fs::File::open("app.apk")?;
//!     let archive = ZipArchive::new(ArchiveHandle::new(file)?)?;
//!
//!     for name in archive.names() {
//!         println!("{name}");
//!     }
//!
//!     let mut manifest = Vec::new();
//!     archive.open("AndroidManifest.xml")?.read_to_end(&mut manifest)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use config::{ArchiveConfig, LayoutVersion};
pub use error::{ErrorCategory, ZipError, ZipResult};
pub use io::{ArchiveHandle, MappedArchive, ReadAt};
pub use zip::{CentralDirectoryEntry, EntryCatalog, EntryStream, ZipArchive};
