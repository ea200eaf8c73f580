//! Binary Cohort/Exemplar record encoding.
//!
//! Both record kinds share one layout: an 8-byte signature (`EQZB1###`
//! for exemplars, `CQZB1###` for cohorts), the parent cohort TGI, a
//! property count, then the properties. Each property is
//! `id:u32 type:u16 key:u16 unused:u8`, followed for keyed (list)
//! properties by a `u32` repetition count and the values, or for scalar
//! properties by the single value. Values are little-endian.
//!
//! Only the value types the pipeline emits or inspects are decoded;
//! properties of other known types are skipped by size when reading.

use crate::dbpf::Tgi;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};
use thiserror::Error;

const EXEMPLAR_MAGIC: &[u8; 8] = b"EQZB1###";
const COHORT_MAGIC: &[u8; 8] = b"CQZB1###";

// Value type codes used on disk.
const TYPE_UINT8: u16 = 0x100;
const TYPE_UINT16: u16 = 0x200;
const TYPE_UINT32: u16 = 0x300;
const TYPE_SINT32: u16 = 0x700;
const TYPE_SINT64: u16 = 0x800;
const TYPE_FLOAT32: u16 = 0x900;
const TYPE_BOOL: u16 = 0xb00;
const TYPE_STRING: u16 = 0xc00;

const KEY_SCALAR: u16 = 0x00;
const KEY_LIST: u16 = 0x80;

/// Well-known property ids.
pub mod prop {
    /// Exemplar Type.
    pub const EXEMPLAR_TYPE: u32 = 0x0000_0010;
    /// Exemplar Name.
    pub const EXEMPLAR_NAME: u32 = 0x0000_0020;
    /// Item Icon.
    pub const ITEM_ICON: u32 = 0x8a26_02b8;
    /// Item Order.
    pub const ITEM_ORDER: u32 = 0x8a26_02b9;
    /// Item Button ID.
    pub const ITEM_BUTTON_ID: u32 = 0x8a26_02bb;
    /// Item Submenu Parent ID.
    pub const ITEM_SUBMENU_PARENT_ID: u32 = 0x8a26_02ca;
    /// Item Button Class.
    pub const ITEM_BUTTON_CLASS: u32 = 0x8a26_02cc;
    /// User Visible Name Key (LTEXT TGI).
    pub const USER_VISIBLE_NAME_KEY: u32 = 0x8a41_6a99;
    /// Item Description Key (LTEXT TGI).
    pub const ITEM_DESCRIPTION_KEY: u32 = 0xca41_6ab5;
    /// Exemplar Patch Targets (group/instance pairs).
    pub const EXEMPLAR_PATCH_TARGETS: u32 = 0x0062_e78a;
    /// Building Submenus (menu ids a building appears under).
    pub const BUILDING_SUBMENUS: u32 = 0xaa1d_d399;
}

/// Exemplar Type value of lot configuration exemplars.
pub const EXEMPLAR_TYPE_LOT_CONFIG: u32 = 0x10;

/// A property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uint32(u32),
    Uint32List(Vec<u32>),
    Bool(bool),
    String(String),
}

/// One property of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: u32,
    pub value: Value,
}

/// Whether a record is an exemplar or a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Exemplar,
    Cohort,
}

#[derive(Error, Debug)]
pub enum ExemplarError {
    #[error("not a binary exemplar or cohort record")]
    BadMagic,

    #[error("unknown property value type 0x{0:x}")]
    UnknownType(u16),

    #[error("truncated record")]
    Truncated,
}

/// A decoded (or to-be-encoded) Cohort/Exemplar record body.
#[derive(Debug, Clone, PartialEq)]
pub struct Exemplar {
    pub kind: RecordKind,
    pub parent: Tgi,
    pub properties: Vec<Property>,
}

impl Exemplar {
    /// A fresh exemplar with no parent cohort.
    pub fn exemplar() -> Self {
        Self::with_kind(RecordKind::Exemplar)
    }

    /// A fresh cohort with no parent.
    pub fn cohort() -> Self {
        Self::with_kind(RecordKind::Cohort)
    }

    fn with_kind(kind: RecordKind) -> Self {
        Exemplar {
            kind,
            parent: Tgi {
                type_id: 0,
                group: 0,
                instance: 0,
            },
            properties: Vec::new(),
        }
    }

    pub fn push(&mut self, id: u32, value: Value) -> &mut Self {
        self.properties.push(Property { id, value });
        self
    }

    /// First u32 of the property, scalar or list.
    pub fn uint32(&self, id: u32) -> Option<u32> {
        match &self.property(id)?.value {
            Value::Uint32(v) => Some(*v),
            Value::Uint32List(v) => v.first().copied(),
            _ => None,
        }
    }

    /// All u32 values of the property.
    pub fn uint32_list(&self, id: u32) -> Option<Vec<u32>> {
        match &self.property(id)?.value {
            Value::Uint32(v) => Some(vec![*v]),
            Value::Uint32List(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn string(&self, id: u32) -> Option<&str> {
        match &self.property(id)?.value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn property(&self, id: u32) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(match self.kind {
            RecordKind::Exemplar => EXEMPLAR_MAGIC,
            RecordKind::Cohort => COHORT_MAGIC,
        });
        write_u32(&mut out, self.parent.type_id);
        write_u32(&mut out, self.parent.group);
        write_u32(&mut out, self.parent.instance);
        write_u32(&mut out, self.properties.len() as u32);

        for property in &self.properties {
            write_u32(&mut out, property.id);
            match &property.value {
                Value::Uint32(v) => {
                    write_header(&mut out, TYPE_UINT32, KEY_SCALAR);
                    write_u32(&mut out, *v);
                }
                Value::Uint32List(values) => {
                    write_header(&mut out, TYPE_UINT32, KEY_LIST);
                    write_u32(&mut out, values.len() as u32);
                    for v in values {
                        write_u32(&mut out, *v);
                    }
                }
                Value::Bool(v) => {
                    write_header(&mut out, TYPE_BOOL, KEY_SCALAR);
                    out.push(u8::from(*v));
                }
                Value::String(s) => {
                    write_header(&mut out, TYPE_STRING, KEY_LIST);
                    write_u32(&mut out, s.len() as u32);
                    out.extend_from_slice(s.as_bytes());
                }
            }
        }
        out
    }

    /// Decode a binary record body.
    pub fn parse(bytes: &[u8]) -> Result<Exemplar, ExemplarError> {
        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 8];
        cursor.read_exact(&mut magic).map_err(truncated)?;
        let kind = match &magic {
            m if m == EXEMPLAR_MAGIC => RecordKind::Exemplar,
            m if m == COHORT_MAGIC => RecordKind::Cohort,
            _ => return Err(ExemplarError::BadMagic),
        };

        let parent = Tgi {
            type_id: read_u32(&mut cursor)?,
            group: read_u32(&mut cursor)?,
            instance: read_u32(&mut cursor)?,
        };
        let count = read_u32(&mut cursor)?;
        // Each property occupies at least 9 bytes; a count promising
        // more than the record holds is corruption, not a reason to
        // allocate.
        ensure_remaining(&cursor, u64::from(count) * 9)?;

        let mut properties = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = read_u32(&mut cursor)?;
            let value_type = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            let key_type = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            cursor.read_u8().map_err(truncated)?; // unused

            let reps = if key_type == KEY_LIST {
                read_u32(&mut cursor)? as usize
            } else {
                1
            };

            let value = match value_type {
                TYPE_UINT32 if key_type == KEY_SCALAR => Value::Uint32(read_u32(&mut cursor)?),
                TYPE_UINT32 => {
                    ensure_remaining(&cursor, reps as u64 * 4)?;
                    let mut values = Vec::with_capacity(reps);
                    for _ in 0..reps {
                        values.push(read_u32(&mut cursor)?);
                    }
                    Value::Uint32List(values)
                }
                TYPE_BOOL => {
                    let raw = cursor.read_u8().map_err(truncated)?;
                    Value::Bool(raw != 0)
                }
                TYPE_STRING => {
                    ensure_remaining(&cursor, reps as u64)?;
                    let mut raw = vec![0u8; reps];
                    cursor.read_exact(&mut raw).map_err(truncated)?;
                    Value::String(String::from_utf8_lossy(&raw).into_owned())
                }
                other => {
                    // Skip properties we do not model.
                    let size = value_size(other)?;
                    ensure_remaining(&cursor, size as u64 * reps as u64)?;
                    let mut skipped = vec![0u8; size * reps];
                    cursor.read_exact(&mut skipped).map_err(truncated)?;
                    continue;
                }
            };
            properties.push(Property { id, value });
        }

        Ok(Exemplar {
            kind,
            parent,
            properties,
        })
    }
}

fn value_size(value_type: u16) -> Result<usize, ExemplarError> {
    match value_type {
        TYPE_UINT8 | TYPE_BOOL => Ok(1),
        TYPE_UINT16 => Ok(2),
        TYPE_UINT32 | TYPE_SINT32 | TYPE_FLOAT32 => Ok(4),
        TYPE_SINT64 => Ok(8),
        TYPE_STRING => Ok(1),
        other => Err(ExemplarError::UnknownType(other)),
    }
}

fn write_header(out: &mut Vec<u8>, value_type: u16, key_type: u16) {
    out.write_u16::<LittleEndian>(value_type).unwrap();
    out.write_u16::<LittleEndian>(key_type).unwrap();
    out.push(0); // unused
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.write_u32::<LittleEndian>(value).unwrap();
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, ExemplarError> {
    cursor.read_u32::<LittleEndian>().map_err(truncated)
}

fn truncated(_: std::io::Error) -> ExemplarError {
    ExemplarError::Truncated
}

/// Fail before allocating when a length field promises more bytes than
/// the record still holds.
fn ensure_remaining(cursor: &Cursor<&[u8]>, needed: u64) -> Result<(), ExemplarError> {
    let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
    if needed > remaining {
        return Err(ExemplarError::Truncated);
    }
    Ok(())
}

/// Encode a DBPF LTEXT record body: a u16 character count, a 0x0010
/// control word, then UTF-16LE text.
pub fn encode_ltext(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut out = Vec::with_capacity(4 + units.len() * 2);
    out.write_u16::<LittleEndian>(units.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(0x0010).unwrap();
    for unit in units {
        out.write_u16::<LittleEndian>(unit).unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exemplar_roundtrip() {
        let mut record = Exemplar::exemplar();
        record
            .push(prop::EXEMPLAR_TYPE, Value::Uint32(EXEMPLAR_TYPE_LOT_CONFIG))
            .push(prop::EXEMPLAR_NAME, Value::String("Beach House".into()))
            .push(prop::BUILDING_SUBMENUS, Value::Uint32List(vec![1, 2, 3]))
            .push(0x99, Value::Bool(true));

        let parsed = Exemplar::parse(&record.to_bytes()).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(
            parsed.uint32(prop::EXEMPLAR_TYPE),
            Some(EXEMPLAR_TYPE_LOT_CONFIG)
        );
        assert_eq!(parsed.string(prop::EXEMPLAR_NAME), Some("Beach House"));
    }

    #[test]
    fn test_cohort_magic() {
        let cohort = Exemplar::cohort();
        let bytes = cohort.to_bytes();
        assert!(bytes.starts_with(b"CQZB1###"));
        assert_eq!(Exemplar::parse(&bytes).unwrap().kind, RecordKind::Cohort);
    }

    #[test]
    fn test_bad_magic() {
        let err = Exemplar::parse(b"XXXX1###rest").unwrap_err();
        assert!(matches!(err, ExemplarError::BadMagic));
    }

    #[test]
    fn test_forged_huge_property_count() {
        // Property count lives right after the 8-byte magic and the
        // 12-byte parent TGI.
        let mut bytes = Exemplar::exemplar().to_bytes();
        bytes[20..24].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = Exemplar::parse(&bytes).unwrap_err();
        assert!(matches!(err, ExemplarError::Truncated));
    }

    #[test]
    fn test_forged_huge_rep_count() {
        let mut record = Exemplar::exemplar();
        record.push(prop::BUILDING_SUBMENUS, Value::Uint32List(vec![1]));
        let mut bytes = record.to_bytes();
        // Rep count follows the 9-byte property header of the first
        // (only) property.
        bytes[33..37].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = Exemplar::parse(&bytes).unwrap_err();
        assert!(matches!(err, ExemplarError::Truncated));
    }

    #[test]
    fn test_truncated() {
        let record = Exemplar::exemplar();
        let bytes = record.to_bytes();
        let err = Exemplar::parse(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, ExemplarError::Truncated));
    }

    #[test]
    fn test_ltext_encoding() {
        let bytes = encode_ltext("Hi");
        assert_eq!(bytes, vec![2, 0, 0x10, 0, b'H', 0, b'i', 0]);
    }
}
