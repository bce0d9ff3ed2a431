use std::fs;
use std::io::Cursor;

use binrw::BinRead;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tracing_test::traced_test;
use yavp_archive::{
    error::{Error, FormatError, Result},
    extract::{extract, extract_path},
    plan::{assign_offsets, plan},
    types::{DirEntry, VpHeader, ENTRY_SIZE, HEADER_SIZE},
    DirectoryNode, ExtractOptions, FileNode, Node, PlanOptions, VpArchive, VpWriter,
};

fn file(name: &str, data: Vec<u8>) -> Node<Vec<u8>> {
    Node::File(FileNode {
        name: name.into(),
        last_modified: 0,
        offset: 0,
        size: 0,
        data,
    })
}

/// readme.txt (11 bytes) followed by assets/icon.png (4096 bytes)
fn readme_and_assets() -> Result<Vec<u8>> {
    let mut root = DirectoryNode::root(0);
    root.append_child(file("readme.txt", b"hello world".to_vec()));
    let mut assets = DirectoryNode::new("assets", 0);
    assets.append_child(file("icon.png", vec![0x42; 4096]));
    root.append_child(Node::Directory(assets));
    assign_offsets(&mut root)?;

    Ok(VpWriter::new(Cursor::new(Vec::new()))
        .finish(root)?
        .into_inner())
}

fn table(archive: &[u8]) -> Result<(VpHeader, Vec<DirEntry>)> {
    let mut reader = Cursor::new(archive);
    let header = VpHeader::read(&mut reader)?;

    let mut records = Vec::new();
    let mut position = header.directory_offset as usize;
    while position < archive.len() {
        records.push(DirEntry::read(&mut Cursor::new(&archive[position..]))?);
        position += ENTRY_SIZE as usize;
    }
    assert_eq!(position, archive.len());

    Ok((header, records))
}

#[traced_test]
#[test]
fn readme_and_assets_layout() -> Result<()> {
    let archive = readme_and_assets()?;
    let (header, records) = table(&archive)?;

    assert_eq!(header.version, 2);
    assert_eq!(header.directory_offset, 16 + 11 + 4096);
    assert_eq!(header.directory_entries, 5);

    let summary = records
        .iter()
        .map(|r| (r.name().into_owned(), r.offset, r.size))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            ("data".to_owned(), 0, 0),
            ("readme.txt".to_owned(), 16, 11),
            ("assets".to_owned(), 0, 0),
            ("icon.png".to_owned(), 27, 4096),
            ("..".to_owned(), 0, 0),
        ]
    );

    assert_eq!(&archive[16..27], b"hello world");
    assert!(archive[27..4123].iter().all(|b| *b == 0x42));

    Ok(())
}

#[test]
fn only_the_last_listing_lacks_a_sentinel() -> Result<()> {
    let mut root = DirectoryNode::root(0);
    let mut a = DirectoryNode::new("a", 0);
    let mut b = DirectoryNode::new("b", 0);
    b.append_child(file("deep.bin", vec![1, 2, 3]));
    a.append_child(Node::Directory(b));
    root.append_child(Node::Directory(a));
    root.append_child(Node::Directory(DirectoryNode::new("c", 0)));
    root.append_child(file("last.txt", b"end".to_vec()));
    assign_offsets(&mut root)?;

    let archive = VpWriter::new(Cursor::new(Vec::new()))
        .finish(root)?
        .into_inner();
    let (header, records) = table(&archive)?;

    let names = records
        .iter()
        .map(|r| r.name().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec!["data", "a", "b", "deep.bin", "..", "..", "c", "..", "last.txt"]
    );
    assert_eq!(header.directory_entries as usize, records.len());
    assert!(!records.last().map(DirEntry::is_sentinel).unwrap_or(true));

    let vp = VpArchive::new(&archive)?;
    assert_eq!(vp.by_path("a/b/deep.bin")?.size(), 3);
    assert_eq!(vp.by_path("last.txt")?.offset(), 19);
    assert!(vp.by_path("c")?.is_directory());

    Ok(())
}

#[test]
fn offsets_are_contiguous_in_depth_first_order() -> Result<()> {
    let source = TempDir::new()?;
    for (i, dir) in ["x", "x/y", "x/y/z", "w"].iter().enumerate() {
        fs::create_dir_all(source.path().join(dir))?;
        fs::write(source.path().join(dir).join("f.bin"), vec![i as u8; 100 * (i + 1)])?;
    }
    fs::write(source.path().join("top.bin"), b"top")?;

    let root = plan(source.path(), PlanOptions::default())?;
    let archive = VpWriter::new(Cursor::new(Vec::new()))
        .finish(root)?
        .into_inner();
    let vp = VpArchive::new(&archive)?;

    let mut expected_offset = HEADER_SIZE;
    for (_, node) in vp.root().walk() {
        if let Some(f) = node.as_file() {
            assert_eq!(f.offset, expected_offset, "{} is out of place", f.name);
            expected_offset += f.size;
        }
    }
    assert_eq!(expected_offset, vp.header().directory_offset);
    assert_eq!(vp.len(), 5);

    Ok(())
}

#[test]
fn wrong_magic_fails_before_extraction() -> Result<()> {
    let destination = TempDir::new()?;
    let target = destination.path().join("out");
    let bogus = b"PK\x03\x04 this is a zip file, not a vp".to_vec();

    let result = VpArchive::new(&bogus).and_then(|vp| {
        extract(vp.root(), &target, ExtractOptions::default())
    });

    assert!(matches!(
        result,
        Err(Error::InvalidArchive(FormatError::BadMagic(_)))
    ));
    assert!(!target.exists());

    Ok(())
}

#[test]
fn missing_path_fails_without_writing() -> Result<()> {
    let archive = readme_and_assets()?;
    let vp = VpArchive::new(&archive)?;

    let destination = TempDir::new()?;
    let target = destination.path().join("out");
    let result = extract_path(vp.root(), "assets/missing.png", &target, ExtractOptions::default());

    assert!(matches!(result, Err(Error::PathNotFound(_))));
    assert!(!target.exists());

    Ok(())
}
