//! Replaying a tree onto the filesystem or into a listing.

use bon::Builder;
use filetime::FileTime;
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};
use tracing::{debug, info, instrument};

use crate::error::{Error, FormatError, Result};
use crate::tree::{DirectoryNode, FileNode, Node};

/// Options for how entries are written out
#[derive(Debug, Clone, Copy, Builder)]
pub struct ExtractOptions {
    /// Replace files that already exist instead of failing
    #[builder(default)]
    pub overwrite: bool,

    /// Set each file's modification time to the one stored in the archive
    #[builder(default = true)]
    pub preserve_mtime: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions::builder().build()
    }
}

/// Write `root` and everything below it into `destination`.
///
/// The root itself becomes a directory inside `destination`, so an archive whose root is `data`
/// ends up under `destination/data`. Files written before a failure are left in place.
#[instrument(skip(root, destination), fields(destination = %destination.as_ref().display()), err)]
pub fn extract<D: AsRef<[u8]>>(
    root: &DirectoryNode<D>,
    destination: impl AsRef<Path>,
    options: ExtractOptions,
) -> Result<()> {
    materialize_directory(root, destination.as_ref(), &options)
}

/// Write the entry at `path` into `destination`.
///
/// A file is written as `destination/<name>`, a directory is written with its whole subtree. Nothing
/// is written when `path` does not resolve.
#[instrument(skip(root, destination), fields(destination = %destination.as_ref().display()), err)]
pub fn extract_path<D: AsRef<[u8]>>(
    root: &DirectoryNode<D>,
    path: &str,
    destination: impl AsRef<Path>,
    options: ExtractOptions,
) -> Result<()> {
    let node = root
        .find(path)
        .ok_or_else(|| Error::PathNotFound(path.to_owned()))?;

    let destination = destination.as_ref();
    fs::create_dir_all(destination)?;

    match node {
        Node::Directory(dir) => materialize_directory(dir, destination, &options),
        Node::File(file) => materialize_file(file, destination, &options),
    }
}

/// Print one line per entry, indented with a tab per level, starting with the root itself.
///
/// Never touches the filesystem.
pub fn list<D, W: Write>(root: &DirectoryNode<D>, writer: &mut W) -> Result<()> {
    writeln!(writer, "{}", root.name)?;
    for (depth, node) in root.walk() {
        writeln!(writer, "{}{}", "\t".repeat(depth + 1), node.name())?;
    }
    Ok(())
}

fn materialize_directory<D: AsRef<[u8]>>(
    directory: &DirectoryNode<D>,
    parent: &Path,
    options: &ExtractOptions,
) -> Result<()> {
    let path = parent.join(safe_name(&directory.name)?);
    debug!("creating {}", path.display());
    fs::create_dir_all(&path)?;

    for child in directory.children.iter() {
        match child {
            Node::Directory(dir) => materialize_directory(dir, &path, options)?,
            Node::File(file) => materialize_file(file, &path, options)?,
        }
    }
    Ok(())
}

fn materialize_file<D: AsRef<[u8]>>(
    file: &FileNode<D>,
    parent: &Path,
    options: &ExtractOptions,
) -> Result<()> {
    let path = parent.join(safe_name(&file.name)?);
    info!("writing {}", path.display());

    let mut out = if options.overwrite {
        File::create(&path)?
    } else {
        File::create_new(&path)?
    };
    out.write_all(file.data.as_ref())?;
    drop(out);

    if options.preserve_mtime {
        filetime::set_file_mtime(&path, FileTime::from_unix_time(file.last_modified as i64, 0))?;
    }
    Ok(())
}

/// Reject names that would leave the directory they are joined onto.
fn safe_name(name: &str) -> Result<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
    {
        return Err(FormatError::UnsafeName(name.to_owned()).into());
    }
    Ok(name)
}
