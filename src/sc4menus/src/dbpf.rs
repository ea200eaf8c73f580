//! Minimal DBPF package reader/writer.
//!
//! SimCity 4 plugin archives use DBPF version 1.0 with index version
//! 7.0: a 96-byte header, the raw record data, and a trailing index of
//! 20-byte entries (type, group, instance, offset, size, all u32 LE).
//! Only what the build pipeline needs is supported; in particular
//! QFS-compressed records are not decoded, readers simply carry the
//! raw bytes through.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom};
use thiserror::Error;

/// Exemplar record type id.
pub const TYPE_EXEMPLAR: u32 = 0x6534284a;
/// Cohort record type id.
pub const TYPE_COHORT: u32 = 0x05342861;
/// PNG image record type id.
pub const TYPE_PNG: u32 = 0x856ddbac;
/// LTEXT (localizable text) record type id.
pub const TYPE_LTEXT: u32 = 0x2026960b;

const MAGIC: &[u8; 4] = b"DBPF";
const HEADER_SIZE: u32 = 96;
const INDEX_ENTRY_SIZE: u32 = 20;

/// Type/group/instance address of a record inside a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tgi {
    pub type_id: u32,
    pub group: u32,
    pub instance: u32,
}

impl fmt::Display for Tgi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T=0x{:08x} G=0x{:08x} I=0x{:08x}",
            self.type_id, self.group, self.instance
        )
    }
}

/// One record: an address plus its raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub tgi: Tgi,
    pub data: Vec<u8>,
}

/// An in-memory DBPF package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    pub records: Vec<Record>,
}

#[derive(Error, Debug)]
pub enum DbpfError {
    #[error("not a DBPF package")]
    BadMagic,

    #[error("unsupported DBPF version {0}.{1}")]
    Version(u32, u32),

    #[error("truncated package")]
    Truncated,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by full TGI.
    pub fn find(&self, tgi: Tgi) -> Option<&Record> {
        self.records.iter().find(|r| r.tgi == tgi)
    }

    /// Records of one type, in index order.
    pub fn records_of_type(&self, type_id: u32) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.tgi.type_id == type_id)
    }

    /// Serialize the package. Record data follows the header in append
    /// order, the index trails the data; timestamps stay zero so the
    /// same records always produce identical bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        write_u32(&mut out, 1); // major version
        write_u32(&mut out, 0); // minor version
        out.resize(32, 0); // unknown + timestamps
        write_u32(&mut out, 7); // index major version
        write_u32(&mut out, self.records.len() as u32);

        let data_size: u32 = self.records.iter().map(|r| r.data.len() as u32).sum();
        write_u32(&mut out, HEADER_SIZE + data_size); // index offset
        write_u32(&mut out, self.records.len() as u32 * INDEX_ENTRY_SIZE); // index size
        out.resize(60, 0); // hole table (empty)
        write_u32(&mut out, 0); // index minor version
        out.resize(HEADER_SIZE as usize, 0);

        let mut offsets = Vec::with_capacity(self.records.len());
        for record in &self.records {
            offsets.push(out.len() as u32);
            out.extend_from_slice(&record.data);
        }
        for (record, offset) in self.records.iter().zip(offsets) {
            write_u32(&mut out, record.tgi.type_id);
            write_u32(&mut out, record.tgi.group);
            write_u32(&mut out, record.tgi.instance);
            write_u32(&mut out, offset);
            write_u32(&mut out, record.data.len() as u32);
        }
        out
    }

    /// Parse a serialized package.
    pub fn parse(bytes: &[u8]) -> Result<Package, DbpfError> {
        let mut cursor = Cursor::new(bytes);

        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic).map_err(truncated)?;
        if &magic != MAGIC {
            return Err(DbpfError::BadMagic);
        }
        let major = read_u32(&mut cursor)?;
        let minor = read_u32(&mut cursor)?;
        if (major, minor) != (1, 0) {
            return Err(DbpfError::Version(major, minor));
        }

        cursor.seek(SeekFrom::Start(36)).map_err(truncated)?;
        let count = read_u32(&mut cursor)?;
        let index_offset = read_u32(&mut cursor)?;

        // The count is attacker-controlled on downloaded packages;
        // bound it by the bytes actually present before allocating.
        let index_end = u64::from(index_offset)
            + u64::from(count) * u64::from(INDEX_ENTRY_SIZE);
        if index_end > bytes.len() as u64 {
            return Err(DbpfError::Truncated);
        }

        cursor
            .seek(SeekFrom::Start(index_offset.into()))
            .map_err(truncated)?;
        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let type_id = read_u32(&mut cursor)?;
            let group = read_u32(&mut cursor)?;
            let instance = read_u32(&mut cursor)?;
            let offset = read_u32(&mut cursor)? as usize;
            let size = read_u32(&mut cursor)? as usize;

            let end = offset.checked_add(size).ok_or(DbpfError::Truncated)?;
            let data = bytes.get(offset..end).ok_or(DbpfError::Truncated)?;
            records.push(Record {
                tgi: Tgi {
                    type_id,
                    group,
                    instance,
                },
                data: data.to_vec(),
            });
        }

        Ok(Package { records })
    }
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    // Writing to a Vec cannot fail.
    out.write_u32::<LittleEndian>(value).unwrap();
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, DbpfError> {
    cursor.read_u32::<LittleEndian>().map_err(truncated)
}

fn truncated(_: std::io::Error) -> DbpfError {
    DbpfError::Truncated
}
