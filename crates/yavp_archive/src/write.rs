//! Types for writing VP archives
//!

use binrw::BinWrite;
use std::io::{Seek, Write};
use std::mem;
use tracing::{debug, instrument, trace};

use crate::error::{Error, Result};
use crate::tree::{DirectoryNode, Node};
use crate::types::{DirEntry, VpHeader, HEADER_SIZE, VERSION};

/// VP archive generator
///
/// The header is computed from the tree up front, so the payloads and directory table are written
/// in a single pass without seeking back.
///
/// ```
/// # fn doit() -> yavp_archive::error::Result<()>
/// # {
/// use yavp_archive::{plan::assign_offsets, DirectoryNode, FileNode, Node, VpWriter};
///
/// let mut root = DirectoryNode::root(0);
/// root.append_child(Node::File(FileNode {
///     name: "hello_world.txt".into(),
///     last_modified: 0,
///     offset: 0,
///     size: 0,
///     data: b"Hello, World!".to_vec(),
/// }));
/// assign_offsets(&mut root)?;
///
/// // We use a buffer here, though you'd normally use a `File`
/// let vp = VpWriter::new(std::io::Cursor::new(Vec::new())).finish(root)?;
/// assert_eq!(&vp.get_ref()[..4], b"VPVP");
///
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct VpWriter<W: Write + Seek> {
    inner: W,
    start: u64,
}

impl<W: Write + Seek> VpWriter<W> {
    /// Initializes the archive at the current position of `inner`.
    pub fn new(inner: W) -> VpWriter<W> {
        VpWriter { inner, start: 0 }
    }

    /// Write `root` as a complete archive and return the inner writer.
    ///
    /// Every file must already carry the offset it will be written at, as produced by
    /// [`crate::plan::plan`] or [`crate::plan::assign_offsets`]. Payloads are dropped as soon as they
    /// have been written.
    #[instrument(skip_all, err)]
    pub fn finish<D>(mut self, mut root: DirectoryNode<D>) -> Result<W>
    where
        D: AsRef<[u8]> + Default,
    {
        self.start = self.inner.stream_position()?;

        let header = VpHeader {
            version: VERSION,
            directory_offset: payload_end(&root)?,
            directory_entries: u32::try_from(1 + table_records(&root, false))
                .map_err(|_| Error::ArchiveTooLarge)?,
        };
        debug!(?header, "writing header");
        header.write(&mut self.inner)?;

        self.write_payloads(&mut root)?;

        let end = self.position()?;
        if end != header.directory_offset as u64 {
            return Err(Error::LayoutMismatch {
                name: "directory table".into(),
                field: "offset",
                expected: header.directory_offset,
                actual: end,
            });
        }

        DirEntry::new(&root.name, 0, 0, root.last_modified)?.write(&mut self.inner)?;
        self.write_table(&root, false)?;

        self.inner.flush()?;
        Ok(self.inner)
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()? - self.start)
    }

    fn write_payloads<D>(&mut self, directory: &mut DirectoryNode<D>) -> Result<()>
    where
        D: AsRef<[u8]> + Default,
    {
        for child in directory.children.iter_mut() {
            match child {
                Node::Directory(dir) => self.write_payloads(dir)?,
                Node::File(file) => {
                    let len = file.data.as_ref().len() as u64;
                    if len != file.size as u64 {
                        return Err(Error::LayoutMismatch {
                            name: file.name.clone(),
                            field: "size",
                            expected: file.size,
                            actual: len,
                        });
                    }
                    if file.size == 0 {
                        return Err(Error::EmptyFile(file.name.clone()));
                    }

                    let position = self.position()?;
                    if position != file.offset as u64 {
                        return Err(Error::LayoutMismatch {
                            name: file.name.clone(),
                            field: "offset",
                            expected: file.offset,
                            actual: position,
                        });
                    }

                    trace!(name = %file.name, offset = file.offset, size = file.size, "writing payload");
                    let data = mem::take(&mut file.data);
                    self.inner.write_all(data.as_ref())?;
                }
            }
        }
        Ok(())
    }

    /// Write one record per child, each subdirectory's table right after its own record, then the
    /// `..` sentinel unless `terminated` is false.
    fn write_table<D>(&mut self, directory: &DirectoryNode<D>, terminated: bool) -> Result<()> {
        for child in directory.children.iter() {
            DirEntry::new(
                child.name(),
                child.offset(),
                child.size(),
                child.last_modified(),
            )?
            .write(&mut self.inner)?;

            if let Node::Directory(dir) = child {
                self.write_table(dir, true)?;
            }
        }

        if terminated {
            DirEntry::sentinel().write(&mut self.inner)?;
        }
        Ok(())
    }
}

/// Directory offset implied by the sizes in the tree.
fn payload_end<D>(root: &DirectoryNode<D>) -> Result<u32> {
    let end = HEADER_SIZE as u64 + root.total_size();
    u32::try_from(end).map_err(|_| Error::ArchiveTooLarge)
}

/// Records written for the table of `directory`, not counting its own record.
fn table_records<D>(directory: &DirectoryNode<D>, terminated: bool) -> usize {
    let nested: usize = directory
        .children
        .iter()
        .filter_map(Node::as_directory)
        .map(|dir| table_records(dir, true))
        .sum();
    directory.children.len() + nested + usize::from(terminated)
}
