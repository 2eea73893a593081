//! Prompt archive for the Flipbook workspace.
//!
//! Every generation run is written as one JSON record whose file name embeds
//! a fixed-width UTC timestamp, so sorting names sorts runs chronologically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod archive;
mod record;

pub use archive::{ARCHIVE_PREFIX, PromptArchive};
pub use record::ArchiveRecord;
