//! Types for reading VP archives
//!

use binrw::BinRead;
use std::{io::Cursor, mem};
use tracing::{debug, instrument, trace, warn};

use crate::error::{Error, FormatError, Result};
use crate::tree::{DirectoryNode, FileNode, Node};
use crate::types::{DirEntry, VpHeader, ENTRY_SIZE, HEADER_SIZE, VERSION};

/// Deepest directory nesting the decoder follows before giving up
pub const MAX_DEPTH: usize = 256;

/// VP archive reader
///
/// The whole archive is expected in memory. File nodes borrow their payload from that buffer, so
/// the parsed tree lives exactly as long as the bytes it was read from.
///
/// ```no_run
/// fn list_vp_contents(path: &str) -> yavp_archive::error::Result<()> {
///     let data = std::fs::read(path)?;
///     let vp = yavp_archive::VpArchive::new(&data)?;
///
///     for (depth, node) in vp.root().walk() {
///         println!("{}{} ({} bytes)", "\t".repeat(depth), node.name(), node.size());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct VpArchive<'a> {
    data: &'a [u8],
    header: VpHeader,
    root: DirectoryNode<&'a [u8]>,
}

impl<'a> VpArchive<'a> {
    /// Validate the header and decode the directory table of `data`.
    #[instrument(skip_all, fields(len = data.len()), err)]
    pub fn new(data: &'a [u8]) -> Result<VpArchive<'a>> {
        let header = read_header(data)?;
        if header.version != VERSION {
            warn!(version = header.version, "unexpected vp version");
        }

        let mut decoder = TableDecoder {
            data,
            cursor: header.directory_offset as usize,
            records: 0,
        };

        let root_record = decoder.read_record().map_err(|_| {
            FormatError::DirectoryOutOfRange {
                offset: header.directory_offset,
                len: data.len(),
            }
        })?;
        let root = decoder.decode_tree(DirectoryNode::new(root_record.name(), root_record.timestamp))?;

        if decoder.records != header.directory_entries as usize {
            warn!(
                expected = header.directory_entries,
                actual = decoder.records,
                "directory entry count does not match the header"
            );
        }
        debug!(
            files = root.file_count(),
            directories = root.directory_count(),
            "decoded archive"
        );

        Ok(VpArchive { data, header, root })
    }

    /// The header as stored in the archive
    pub fn header(&self) -> &VpHeader {
        &self.header
    }

    /// The top level directory
    pub fn root(&self) -> &DirectoryNode<&'a [u8]> {
        &self.root
    }

    /// Take the tree, still bound to the archive buffer
    pub fn into_root(self) -> DirectoryNode<&'a [u8]> {
        self.root
    }

    /// The raw archive bytes
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of files in the archive, directories not included.
    pub fn len(&self) -> usize {
        self.root.file_count()
    }

    /// Whether this archive contains no files
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Search for an entry by its `/` separated path
    pub fn by_path(&self, path: &str) -> Result<&Node<&'a [u8]>> {
        self.root
            .find(path)
            .ok_or_else(|| Error::PathNotFound(path.to_owned()))
    }
}

fn read_header(data: &[u8]) -> Result<VpHeader> {
    let magic: [u8; 4] = data
        .get(..4)
        .and_then(|m| m.try_into().ok())
        .ok_or(FormatError::TruncatedHeader(data.len()))?;
    if &magic != b"VPVP" {
        return Err(FormatError::BadMagic(magic).into());
    }
    if data.len() < HEADER_SIZE as usize {
        return Err(FormatError::TruncatedHeader(data.len()).into());
    }

    Ok(VpHeader::read(&mut Cursor::new(data))?)
}

/// Walks the directory table with one cursor shared by every nesting level.
struct TableDecoder<'a> {
    data: &'a [u8],
    cursor: usize,
    records: usize,
}

impl<'a> TableDecoder<'a> {
    fn read_record(&mut self) -> Result<DirEntry> {
        let position = self.cursor;
        let bytes = position
            .checked_add(ENTRY_SIZE as usize)
            .and_then(|end| self.data.get(position..end))
            .ok_or(FormatError::TruncatedRecord { position })?;

        let record = DirEntry::read(&mut Cursor::new(bytes))?;
        self.cursor += ENTRY_SIZE as usize;
        self.records += 1;
        Ok(record)
    }

    /// Next entry of the current directory, or `None` once its listing ends.
    ///
    /// A listing ends at a `..` record or at the end of the archive, whichever comes first.
    fn next_entry(&mut self) -> Result<Option<DirEntry>> {
        if self.cursor >= self.data.len() {
            return Ok(None);
        }
        let record = self.read_record()?;
        Ok((!record.is_sentinel()).then_some(record))
    }

    /// Decode the listing of `root` and everything nested in it.
    ///
    /// Open directories are kept on an explicit stack, `current` being the innermost one, so the
    /// depth of the archive never translates into depth of the call stack.
    fn decode_tree(&mut self, root: DirectoryNode<&'a [u8]>) -> Result<DirectoryNode<&'a [u8]>> {
        let mut current = root;
        let mut parents: Vec<DirectoryNode<&'a [u8]>> = Vec::new();

        loop {
            match self.next_entry()? {
                Some(record) if record.is_directory() => {
                    if parents.len() + 1 >= MAX_DEPTH {
                        return Err(FormatError::NestingTooDeep(MAX_DEPTH).into());
                    }
                    let child = DirectoryNode::new(record.name(), record.timestamp);
                    parents.push(mem::replace(&mut current, child));
                }
                Some(record) => {
                    let file = self.file_node(&record)?;
                    trace!(name = %file.name, offset = file.offset, size = file.size, "decoded file");
                    current.append_child(Node::File(file));
                }
                None => match parents.pop() {
                    Some(parent) => {
                        let finished = mem::replace(&mut current, parent);
                        current.append_child(Node::Directory(finished));
                    }
                    None => return Ok(current),
                },
            }
        }
    }

    fn file_node(&self, record: &DirEntry) -> Result<FileNode<&'a [u8]>> {
        let start = record.offset as usize;
        let data = start
            .checked_add(record.size as usize)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| FormatError::PayloadOutOfRange {
                name: record.name().into_owned(),
                offset: record.offset,
                size: record.size,
            })?;

        Ok(FileNode {
            name: record.name().into_owned(),
            last_modified: record.timestamp,
            offset: record.offset,
            size: record.size,
            data,
        })
    }
}
