//! Base types for structure of VP file.

use binrw::{BinRead, BinWrite};
use std::borrow::Cow;

use crate::error::{Error, Result};

/// Size in bytes of [`VpHeader`] on disk
pub const HEADER_SIZE: u32 = 16;

/// Size in bytes of a [`DirEntry`] on disk
pub const ENTRY_SIZE: u32 = 44;

/// Width of the null padded name field of a [`DirEntry`]
pub const NAME_LENGTH: usize = 32;

/// The only version of the format this crate writes
pub const VERSION: u32 = 2;

/// Name of the top level directory every archive starts with
pub const ROOT_NAME: &str = "data";

/// Name of the record closing a directory's listing
pub const SENTINEL_NAME: &str = "..";

/// VP file header
///
/// Defines the header of the VP file which always starts with "VPVP" followed by the version.
/// All data is stored in little endian format
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Eq)]
#[brw(magic = b"VPVP", little)]
pub struct VpHeader {
    /// Format version, always 2 for archives written by this crate
    pub version: u32,

    /// The offset from the beginning of the file where the directory table starts
    pub directory_offset: u32,

    /// The number of records in the directory table, counting the root record and sentinels
    pub directory_entries: u32,
}

impl Default for VpHeader {
    fn default() -> Self {
        Self {
            version: VERSION,
            directory_offset: HEADER_SIZE,
            directory_entries: 0,
        }
    }
}

/// VP directory table record
///
/// Describes a file, a directory, or the end of a directory's listing
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct DirEntry {
    /// The offset to the data for this record from the start of the file, zero for directories
    pub offset: u32,

    /// The size of the data for this record, zero marks a directory
    pub size: u32,

    /// Null padded name, not terminated when all 32 bytes are used
    pub name: [u8; NAME_LENGTH],

    /// Last modification time in seconds since the Unix epoch
    pub timestamp: u32,
}

impl DirEntry {
    /// Build a record, failing if `name` does not fit in the name field with a terminator.
    pub fn new(name: &str, offset: u32, size: u32, timestamp: u32) -> Result<Self> {
        Ok(DirEntry {
            offset,
            size,
            name: encode_name(name)?,
            timestamp,
        })
    }

    /// The `..` record closing a directory's listing.
    pub fn sentinel() -> Self {
        let mut name = [0u8; NAME_LENGTH];
        name[..SENTINEL_NAME.len()].copy_from_slice(SENTINEL_NAME.as_bytes());
        DirEntry {
            name,
            ..Default::default()
        }
    }

    /// Get the name bytes up to the first null.
    pub fn name_raw(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(NAME_LENGTH);
        &self.name[..end]
    }

    /// Get the name, replacing invalid UTF-8 sequences.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_raw())
    }

    pub fn is_sentinel(&self) -> bool {
        self.name_raw() == SENTINEL_NAME.as_bytes()
    }

    pub fn is_directory(&self) -> bool {
        self.size == 0
    }
}

/// Check that `name` can be stored in a record and read back as the same entry.
///
/// Names must leave room for a terminating null and may not contain path separators, nulls, or
/// collide with the `..` sentinel.
pub fn validate_name(name: &str) -> Result<()> {
    if name.len() >= NAME_LENGTH {
        return Err(Error::NameTooLong(name.to_owned()));
    }
    if name.is_empty()
        || name == "."
        || name == SENTINEL_NAME
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
    {
        return Err(Error::InvalidName(name.to_owned()));
    }
    Ok(())
}

fn encode_name(name: &str) -> Result<[u8; NAME_LENGTH]> {
    validate_name(name)?;

    let bytes = name.as_bytes();
    let mut field = [0u8; NAME_LENGTH];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinRead;
    use binrw::BinWrite;
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::types::{DirEntry, VpHeader};

    #[test]
    fn read_header() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x56, 0x50, 0x56, 0x50,
            0x02, 0x00, 0x00, 0x00,
            0x1B, 0x10, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00,
        ]);

        let expected = VpHeader {
            version: 2,
            directory_offset: 4123,
            directory_entries: 5,
        };

        assert_eq!(VpHeader::read(&mut input)?, expected);

        Ok(())
    }

    #[test]
    fn read_header_with_bad_magic() {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x45, 0x45, 0x52, 0x54,
            0x02, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
        ]);

        assert!(VpHeader::read(&mut input).is_err());
    }

    #[test]
    fn write_empty_header() -> Result<()> {
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x56, 0x50, 0x56, 0x50,
            0x02, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let mut actual = Vec::new();
        VpHeader::default().write(&mut Cursor::new(&mut actual))?;

        assert_eq!(actual, expected);

        Ok(())
    }

    #[test]
    fn write_record() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0x10, 0x00, 0x00, 0x00,
            0x0B, 0x00, 0x00, 0x00,
            0x72, 0x65, 0x61, 0x64, 0x6D, 0x65, 0x2E, 0x74,
            0x78, 0x74, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0xE1, 0xF5, 0x05,
        ];

        let record = DirEntry::new("readme.txt", 16, 11, 100_000_000)?;

        let mut actual = Vec::new();
        record.write(&mut Cursor::new(&mut actual))?;

        assert_eq!(actual, expected);

        Ok(())
    }

    #[test]
    fn read_sentinel() -> Result<()> {
        let mut input = vec![0u8; 44];
        input[8] = b'.';
        input[9] = b'.';

        let record = DirEntry::read(&mut Cursor::new(input))?;

        assert_eq!(record, DirEntry::sentinel());
        assert!(record.is_sentinel());
        assert!(record.is_directory());

        Ok(())
    }

    #[test]
    fn read_name_without_terminator() -> Result<()> {
        let mut input = vec![0u8; 44];
        input[4] = 1;
        input[8..40].copy_from_slice(&[b'a'; 32]);

        let record = DirEntry::read(&mut Cursor::new(input))?;

        assert_eq!(record.name_raw().len(), 32);
        assert_eq!(record.name(), "a".repeat(32));
        assert!(!record.is_sentinel());

        Ok(())
    }

    #[test]
    fn reject_long_name() {
        let name = "b".repeat(32);
        assert!(matches!(
            DirEntry::new(&name, 0, 0, 0),
            Err(Error::NameTooLong(n)) if n == name
        ));
        assert!(DirEntry::new(&name[..31], 0, 0, 0).is_ok());
    }

    #[test]
    fn reject_reserved_names() {
        for name in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(DirEntry::new(name, 0, 1, 0), Err(Error::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }
}
