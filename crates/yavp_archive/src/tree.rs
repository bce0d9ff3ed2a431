//! In-memory tree shared by packing and unpacking.
//!
//! The wire format tags directories with a zero size. In memory the tag is explicit: a [`Node`] is
//! either a [`DirectoryNode`] holding children or a [`FileNode`] holding a payload of type `D`.
//! Packing uses owned buffers (`Vec<u8>`), unpacking borrows slices of the archive (`&[u8]`), so a
//! parsed tree can never outlive the bytes it was decoded from.

use std::slice;

use crate::types::ROOT_NAME;

/// A file or directory inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<D> {
    Directory(DirectoryNode<D>),
    File(FileNode<D>),
}

/// A directory and its children, in enumeration (pack) or decode (unpack) order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode<D> {
    /// Name of the directory, without any path
    pub name: String,
    /// Seconds since the Unix epoch, zero when unknown
    pub last_modified: u32,
    /// Children in the order they appear in the directory table
    pub children: Vec<Node<D>>,
}

/// A file and the location of its payload in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode<D> {
    /// Name of the file, without any path
    pub name: String,
    /// Seconds since the Unix epoch
    pub last_modified: u32,
    /// Offset of the payload from the start of the archive
    pub offset: u32,
    /// Length of the payload, never zero
    pub size: u32,
    /// The payload itself
    pub data: D,
}

impl<D> Node<D> {
    pub fn name(&self) -> &str {
        match self {
            Node::Directory(dir) => &dir.name,
            Node::File(file) => &file.name,
        }
    }

    pub fn last_modified(&self) -> u32 {
        match self {
            Node::Directory(dir) => dir.last_modified,
            Node::File(file) => file.last_modified,
        }
    }

    /// Payload offset, always zero for directories
    pub fn offset(&self) -> u32 {
        match self {
            Node::Directory(_) => 0,
            Node::File(file) => file.offset,
        }
    }

    /// Payload size, always zero for directories
    pub fn size(&self) -> u32 {
        match self {
            Node::Directory(_) => 0,
            Node::File(file) => file.size,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode<D>> {
        match self {
            Node::Directory(dir) => Some(dir),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode<D>> {
        match self {
            Node::Directory(_) => None,
            Node::File(file) => Some(file),
        }
    }
}

impl<D> DirectoryNode<D> {
    pub fn new(name: impl Into<String>, last_modified: u32) -> Self {
        DirectoryNode {
            name: name.into(),
            last_modified,
            children: Vec::new(),
        }
    }

    /// The top level `data` directory every archive starts with.
    pub fn root(last_modified: u32) -> Self {
        Self::new(ROOT_NAME, last_modified)
    }

    /// Add a child after the existing ones and return it.
    pub fn append_child(&mut self, child: Node<D>) -> &mut Node<D> {
        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Iterate over every descendant depth first, children before siblings.
    ///
    /// Each item carries its depth, direct children of `self` being at depth 0.
    pub fn walk(&self) -> Walk<'_, D> {
        Walk {
            stack: vec![(0, self.children.iter())],
        }
    }

    /// Number of files anywhere below this directory
    pub fn file_count(&self) -> usize {
        self.walk().filter(|(_, node)| !node.is_directory()).count()
    }

    /// Number of directories anywhere below this directory
    pub fn directory_count(&self) -> usize {
        self.walk().filter(|(_, node)| node.is_directory()).count()
    }

    /// Sum of all payload sizes below this directory
    pub fn total_size(&self) -> u64 {
        self.walk().map(|(_, node)| node.size() as u64).sum()
    }

    /// Resolve a `/` separated path relative to this directory.
    ///
    /// Empty components are ignored. A leading component naming this directory itself (such as
    /// `data/` on a root) is skipped unless a child of that name exists.
    pub fn find(&self, path: &str) -> Option<&Node<D>> {
        let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();

        if components.peek() == Some(&self.name.as_str())
            && !self.children.iter().any(|c| c.name() == self.name)
        {
            components.next();
        }

        let first = components.next()?;
        let mut current = self.child(first)?;
        for component in components {
            current = current.as_directory()?.child(component)?;
        }
        Some(current)
    }

    fn child(&self, name: &str) -> Option<&Node<D>> {
        self.children.iter().find(|c| c.name() == name)
    }
}

impl<D: AsRef<[u8]>> DirectoryNode<D> {
    /// A view of this tree whose files borrow their payload from `self`.
    pub fn to_borrowed(&self) -> DirectoryNode<&[u8]> {
        DirectoryNode {
            name: self.name.clone(),
            last_modified: self.last_modified,
            children: self
                .children
                .iter()
                .map(|child| match child {
                    Node::Directory(dir) => Node::Directory(dir.to_borrowed()),
                    Node::File(file) => Node::File(FileNode {
                        name: file.name.clone(),
                        last_modified: file.last_modified,
                        offset: file.offset,
                        size: file.size,
                        data: file.data.as_ref(),
                    }),
                })
                .collect(),
        }
    }
}

/// Depth first iterator returned by [`DirectoryNode::walk`]
pub struct Walk<'a, D> {
    stack: Vec<(usize, slice::Iter<'a, Node<D>>)>,
}

impl<'a, D> Iterator for Walk<'a, D> {
    type Item = (usize, &'a Node<D>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, iter)) = self.stack.last_mut() {
            let depth = *depth;
            match iter.next() {
                Some(node) => {
                    if let Node::Directory(dir) = node {
                        self.stack.push((depth + 1, dir.children.iter()));
                    }
                    return Some((depth, node));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}
