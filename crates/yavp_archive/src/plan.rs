//! Building a tree from a directory on disk and assigning payload offsets.

use bon::Builder;
use std::{
    fs,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{debug, instrument, trace, warn};
use walkdir::{DirEntry as WalkEntry, WalkDir};

use crate::error::{Error, Result};
use crate::tree::{DirectoryNode, FileNode, Node};
use crate::types::{validate_name, HEADER_SIZE};

/// What to do with zero length files, which the format cannot tell apart from directories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyFilePolicy {
    /// Fail the whole pack
    #[default]
    Reject,

    /// Leave the file out of the archive
    Skip,
}

/// Options for how a directory is turned into an archive tree
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct PlanOptions {
    /// How to handle zero length files
    #[builder(default)]
    pub empty_files: EmptyFilePolicy,

    /// Visit directory entries sorted by name instead of in filesystem order
    #[builder(default)]
    pub sort_entries: bool,
}

/// Running position of the next payload in the archive.
///
/// A single cursor is threaded through the whole depth first walk so every file lands directly after
/// the one visited before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutCursor {
    position: u32,
}

impl Default for LayoutCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCursor {
    /// A cursor pointing just past the header.
    pub const fn new() -> Self {
        LayoutCursor {
            position: HEADER_SIZE,
        }
    }

    /// Offset the next payload will receive. Once every file is placed this is the directory offset.
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Reserve `size` bytes and return the offset they start at.
    pub fn advance(&mut self, size: u32) -> Result<u32> {
        let offset = self.position;
        self.position = offset.checked_add(size).ok_or(Error::ArchiveTooLarge)?;
        Ok(offset)
    }
}

/// Read the directory at `path` into a tree rooted at `data`.
///
/// File contents are loaded into memory and given consecutive offsets in depth first order. Any
/// unreadable entry aborts the whole plan.
#[instrument(skip(path), fields(path = %path.as_ref().display()), err)]
pub fn plan(path: impl AsRef<Path>, options: PlanOptions) -> Result<DirectoryNode<Vec<u8>>> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)?;
    if !metadata.is_dir() {
        return Err(Error::CustomError(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    let mut root = DirectoryNode::root(unix_timestamp(metadata.modified()?));
    let mut cursor = LayoutCursor::new();
    plan_directory(path, &mut root, &mut cursor, &options)?;

    debug!(
        files = root.file_count(),
        directories = root.directory_count(),
        directory_offset = cursor.position(),
        "planned archive"
    );

    Ok(root)
}

fn plan_directory(
    path: &Path,
    directory: &mut DirectoryNode<Vec<u8>>,
    cursor: &mut LayoutCursor,
    options: &PlanOptions,
) -> Result<()> {
    let mut walker = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);
    if options.sort_entries {
        walker = walker.sort_by_file_name();
    }

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let name = entry_name(&entry)?;

        if entry.file_type().is_dir() {
            let mut child = DirectoryNode::new(name, 0);
            plan_directory(entry.path(), &mut child, cursor, options)?;
            directory.append_child(Node::Directory(child));
        } else if entry.file_type().is_file() {
            let Some(file) = plan_file(&entry, name, cursor, options)? else {
                continue;
            };
            let child = directory.append_child(Node::File(file));
            trace!(
                name = child.name(),
                offset = child.offset(),
                size = child.size(),
                "planned file"
            );
        } else {
            warn!("skipping {}, not a file or directory", entry.path().display());
        }
    }

    Ok(())
}

fn plan_file(
    entry: &WalkEntry,
    name: String,
    cursor: &mut LayoutCursor,
    options: &PlanOptions,
) -> Result<Option<FileNode<Vec<u8>>>> {
    let data = fs::read(entry.path())?;
    if data.is_empty() {
        return match options.empty_files {
            EmptyFilePolicy::Reject => Err(Error::EmptyFile(entry.path().display().to_string())),
            EmptyFilePolicy::Skip => {
                warn!("skipping {}, empty files cannot be stored", entry.path().display());
                Ok(None)
            }
        };
    }

    let size = u32::try_from(data.len()).map_err(|_| Error::ArchiveTooLarge)?;
    let last_modified = entry
        .metadata()
        .map_err(std::io::Error::from)?
        .modified()
        .map(unix_timestamp)?;

    Ok(Some(FileNode {
        name,
        last_modified,
        offset: cursor.advance(size)?,
        size,
        data,
    }))
}

fn entry_name(entry: &WalkEntry) -> Result<String> {
    let name = entry
        .file_name()
        .to_str()
        .ok_or_else(|| Error::InvalidName(entry.file_name().to_string_lossy().into_owned()))?;
    validate_name(name)?;
    Ok(name.to_owned())
}

/// Recompute offsets and sizes of every file from its payload, in depth first order.
///
/// Returns the directory offset, the position right after the last payload.
pub fn assign_offsets<D: AsRef<[u8]>>(root: &mut DirectoryNode<D>) -> Result<u32> {
    let mut cursor = LayoutCursor::new();
    assign_directory(root, &mut cursor)?;
    Ok(cursor.position())
}

fn assign_directory<D: AsRef<[u8]>>(
    directory: &mut DirectoryNode<D>,
    cursor: &mut LayoutCursor,
) -> Result<()> {
    for child in directory.children.iter_mut() {
        match child {
            Node::Directory(dir) => assign_directory(dir, cursor)?,
            Node::File(file) => {
                file.size =
                    u32::try_from(file.data.as_ref().len()).map_err(|_| Error::ArchiveTooLarge)?;
                file.offset = cursor.advance(file.size)?;
            }
        }
    }
    Ok(())
}

/// Seconds since the Unix epoch, clamped to the range a record can hold.
pub(crate) fn unix_timestamp(time: SystemTime) -> u32 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}
