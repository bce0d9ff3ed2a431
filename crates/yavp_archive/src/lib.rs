//! This library handles reading from and creating **VP** archives used by Volition's game engines.
//!
//! # VP Archive Format Documentation
//!
//! A VP file packs a whole directory tree, rooted at a directory called `data`, into a single flat
//! file. The crate can plan an archive from a directory on disk, write it, parse it back from
//! memory and replay the parsed tree onto a filesystem. VP files are typically identified with the
//! `.vp` extension.
//!
//! ## File Structure
//!
//! A VP file consists of a header, followed by the data of every file, and a directory table.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "VPVP"                                            |
//! | 0x0004         | Version                | 4 bytes: Fixed value 0x00000002                            |
//! | 0x0008         | Directory Offset       | 4 bytes: Offset to the directory table                     |
//! | 0x000C         | Directory Entries      | 4 bytes: Number of records in the directory table          |
//!
//! ### Header
//!
//! - **Magic Number**: The ASCII characters "VPVP". Anything else is not a VP file.
//! - **Version**: A 4-byte unsigned integer, always `2`.
//! - **Directory Offset**: Where the directory table starts. This is the header size plus the size
//!   of every file stored in the archive.
//! - **Directory Entries**: The number of records in the directory table, including the root
//!   record and every `..` record.
//!
//! ### Data Block
//!
//! File contents follow the header back to back, in depth first order of the tree, without any
//! padding or compression.
//!
//! ### Directory Table
//!
//! The directory table is a run of fixed size records:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Offset                 | 4 bytes: Offset of the file data, 0 for directories     |
//! | 0x0004         | Size                   | 4 bytes: Size of the file data, 0 for directories       |
//! | 0x0008         | Name                   | 32 bytes: Null padded name                              |
//! | 0x0028         | Timestamp              | 4 bytes: Modification time, seconds since the epoch     |
//!
//! - The first record describes the root directory `data`.
//! - Each directory is followed by one record per child. A child directory's own records come
//!   right after the child's record.
//! - A record named `..` with all other fields zero closes a directory's listing. The root's
//!   listing is the last one in the file and is closed by the end of the file instead.
//! - A size of zero marks a directory, so files with no content cannot be stored.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.vp`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod error;
pub mod extract;
pub mod plan;
pub mod read;
pub mod tree;
pub mod types;
pub mod write;

pub use extract::ExtractOptions;
pub use plan::PlanOptions;
pub use read::VpArchive;
pub use tree::{DirectoryNode, FileNode, Node};
pub use write::VpWriter;
