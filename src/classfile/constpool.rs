//! Constant pool model.
//!
//! Entries are kept at their original indices (slot 0 and the slot after
//! every `Long`/`Double` are empty) so a parsed pool serializes back to the
//! exact same bytes. `Utf8` entries hold the raw modified-UTF-8 bytes for the
//! same reason; use [`ConstantPool::utf8_string`] to decode them.

use crate::error::ClassFileError;

use super::reader::ByteReader;

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(Vec<u8>),
    Integer(i32),
    /// Raw IEEE-754 bits, so NaN payloads survive a round trip.
    Float(u32),
    Long(i64),
    /// Raw IEEE-754 bits.
    Double(u64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
    pub const CONSTANT_METHODHANDLE: u8 = 15;
    pub const CONSTANT_METHODTYPE: u8 = 16;
    pub const CONSTANT_DYNAMIC: u8 = 17;
    pub const CONSTANT_INVOKEDYNAMIC: u8 = 18;
    pub const CONSTANT_MODULE: u8 = 19;
    pub const CONSTANT_PACKAGE: u8 = 20;
}

impl Constant {
    /// Long and double constants occupy two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    fn parse(r: &mut ByteReader<'_>, index: u16) -> Result<Self, ClassFileError> {
        use constant_tags::*;
        let tag = r.u8()?;
        let constant = match tag {
            CONSTANT_UTF8 => {
                let len = r.u16()? as usize;
                Constant::Utf8(r.take(len)?.to_vec())
            }
            CONSTANT_INTEGER => Constant::Integer(r.u32()? as i32),
            CONSTANT_FLOAT => Constant::Float(r.u32()?),
            CONSTANT_LONG => Constant::Long(r.u64()? as i64),
            CONSTANT_DOUBLE => Constant::Double(r.u64()?),
            CONSTANT_CLASS => Constant::Class(r.u16()?),
            CONSTANT_STRING => Constant::String(r.u16()?),
            CONSTANT_FIELDREF => Constant::FieldRef(r.u16()?, r.u16()?),
            CONSTANT_METHODREF => Constant::MethodRef(r.u16()?, r.u16()?),
            CONSTANT_INTERFACEMETHODREF => Constant::InterfaceMethodRef(r.u16()?, r.u16()?),
            CONSTANT_NAMEANDTYPE => Constant::NameAndType(r.u16()?, r.u16()?),
            CONSTANT_METHODHANDLE => Constant::MethodHandle(r.u8()?, r.u16()?),
            CONSTANT_METHODTYPE => Constant::MethodType(r.u16()?),
            CONSTANT_DYNAMIC => Constant::Dynamic(r.u16()?, r.u16()?),
            CONSTANT_INVOKEDYNAMIC => Constant::InvokeDynamic(r.u16()?, r.u16()?),
            CONSTANT_MODULE => Constant::Module(r.u16()?),
            CONSTANT_PACKAGE => Constant::Package(r.u16()?),
            tag => return Err(ClassFileError::UnknownConstantTag { tag, index }),
        };
        Ok(constant)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
        use constant_tags::*;
        match self {
            Constant::Utf8(bytes) => {
                let len = u16::try_from(bytes.len()).map_err(|_| ClassFileError::TooLarge {
                    what: "utf8 constant",
                    len: bytes.len(),
                    max: u16::MAX as usize,
                })?;
                out.push(CONSTANT_UTF8);
                out.extend_from_slice(&len.to_be_bytes());
                out.extend_from_slice(bytes);
            }
            Constant::Integer(value) => {
                out.push(CONSTANT_INTEGER);
                out.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Float(bits) => {
                out.push(CONSTANT_FLOAT);
                out.extend_from_slice(&bits.to_be_bytes());
            }
            Constant::Long(value) => {
                out.push(CONSTANT_LONG);
                out.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Double(bits) => {
                out.push(CONSTANT_DOUBLE);
                out.extend_from_slice(&bits.to_be_bytes());
            }
            Constant::Class(name_index) => {
                out.push(CONSTANT_CLASS);
                out.extend_from_slice(&name_index.to_be_bytes());
            }
            Constant::String(string_index) => {
                out.push(CONSTANT_STRING);
                out.extend_from_slice(&string_index.to_be_bytes());
            }
            Constant::FieldRef(class_index, nat_index) => {
                out.push(CONSTANT_FIELDREF);
                out.extend_from_slice(&class_index.to_be_bytes());
                out.extend_from_slice(&nat_index.to_be_bytes());
            }
            Constant::MethodRef(class_index, nat_index) => {
                out.push(CONSTANT_METHODREF);
                out.extend_from_slice(&class_index.to_be_bytes());
                out.extend_from_slice(&nat_index.to_be_bytes());
            }
            Constant::InterfaceMethodRef(class_index, nat_index) => {
                out.push(CONSTANT_INTERFACEMETHODREF);
                out.extend_from_slice(&class_index.to_be_bytes());
                out.extend_from_slice(&nat_index.to_be_bytes());
            }
            Constant::NameAndType(name_index, descriptor_index) => {
                out.push(CONSTANT_NAMEANDTYPE);
                out.extend_from_slice(&name_index.to_be_bytes());
                out.extend_from_slice(&descriptor_index.to_be_bytes());
            }
            Constant::MethodHandle(reference_kind, reference_index) => {
                out.push(CONSTANT_METHODHANDLE);
                out.push(*reference_kind);
                out.extend_from_slice(&reference_index.to_be_bytes());
            }
            Constant::MethodType(descriptor_index) => {
                out.push(CONSTANT_METHODTYPE);
                out.extend_from_slice(&descriptor_index.to_be_bytes());
            }
            Constant::Dynamic(bootstrap_index, nat_index) => {
                out.push(CONSTANT_DYNAMIC);
                out.extend_from_slice(&bootstrap_index.to_be_bytes());
                out.extend_from_slice(&nat_index.to_be_bytes());
            }
            Constant::InvokeDynamic(bootstrap_index, nat_index) => {
                out.push(CONSTANT_INVOKEDYNAMIC);
                out.extend_from_slice(&bootstrap_index.to_be_bytes());
                out.extend_from_slice(&nat_index.to_be_bytes());
            }
            Constant::Module(name_index) => {
                out.push(CONSTANT_MODULE);
                out.extend_from_slice(&name_index.to_be_bytes());
            }
            Constant::Package(name_index) => {
                out.push(CONSTANT_PACKAGE);
                out.extend_from_slice(&name_index.to_be_bytes());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Option<Constant>>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            entries: vec![None],
        }
    }

    pub(crate) fn parse(r: &mut ByteReader<'_>) -> Result<Self, ClassFileError> {
        let count = r.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(None);
        let mut index = 1u16;
        while index < count {
            let constant = Constant::parse(r, index)?;
            let wide = constant.is_wide();
            entries.push(Some(constant));
            if wide {
                entries.push(None);
                index = index.saturating_add(1);
            }
            index = index.saturating_add(1);
        }
        Ok(Self { entries })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
        out.extend_from_slice(&self.count().to_be_bytes());
        for constant in self.entries.iter().flatten() {
            constant.write(out)?;
        }
        Ok(())
    }

    /// The `constant_pool_count` value: number of slots including slot 0.
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.entries.get(index as usize).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i as u16, c)))
    }

    pub fn utf8(&self, index: u16) -> Result<&[u8], ClassFileError> {
        match self.get(index) {
            Some(Constant::Utf8(bytes)) => Ok(bytes),
            _ => Err(ClassFileError::BadConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    pub fn utf8_string(&self, index: u16) -> Result<String, ClassFileError> {
        decode_modified_utf8(self.utf8(index)?).ok_or(ClassFileError::BadUtf8 { index })
    }

    /// Internal (slash separated) name of a `Class` entry.
    pub fn class_name(&self, index: u16) -> Result<String, ClassFileError> {
        match self.get(index) {
            Some(Constant::Class(name_index)) => self.utf8_string(*name_index),
            _ => Err(ClassFileError::BadConstant {
                index,
                expected: "Class",
            }),
        }
    }

    pub fn find(&self, constant: &Constant) -> Option<u16> {
        self.iter().find(|(_, c)| *c == constant).map(|(i, _)| i)
    }

    pub fn push(&mut self, constant: Constant) -> Result<u16, ClassFileError> {
        let slots = if constant.is_wide() { 2 } else { 1 };
        if self.entries.len() + slots > u16::MAX as usize {
            return Err(ClassFileError::PoolOverflow);
        }
        let index = self.entries.len() as u16;
        self.entries.push(Some(constant));
        if slots == 2 {
            self.entries.push(None);
        }
        Ok(index)
    }

    /// Returns the index of an equal entry, appending one if none exists.
    pub fn intern(&mut self, constant: Constant) -> Result<u16, ClassFileError> {
        match self.find(&constant) {
            Some(index) => Ok(index),
            None => self.push(constant),
        }
    }

    pub fn intern_utf8(&mut self, value: &str) -> Result<u16, ClassFileError> {
        self.intern(Constant::Utf8(encode_modified_utf8(value)))
    }

    pub fn intern_class(&mut self, internal_name: &str) -> Result<u16, ClassFileError> {
        let name_index = self.intern_utf8(internal_name)?;
        self.intern(Constant::Class(name_index))
    }

    pub fn intern_string(&mut self, value: &str) -> Result<u16, ClassFileError> {
        let string_index = self.intern_utf8(value)?;
        self.intern(Constant::String(string_index))
    }

    pub fn intern_name_and_type(
        &mut self,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassFileError> {
        let name_index = self.intern_utf8(name)?;
        let descriptor_index = self.intern_utf8(descriptor)?;
        self.intern(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn intern_method_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassFileError> {
        let class_index = self.intern_class(class)?;
        let nat_index = self.intern_name_and_type(name, descriptor)?;
        self.intern(Constant::MethodRef(class_index, nat_index))
    }
}

/// Decodes JVM modified UTF-8 (JVMS 4.4.7). Returns `None` for malformed
/// input, embedded raw NUL bytes, or unpaired surrogates.
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i] as u16;
        if b & 0x80 == 0 {
            if b == 0 {
                return None;
            }
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = continuation(bytes, i + 1)?;
            units.push(((b & 0x1F) << 6) | b2);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = continuation(bytes, i + 1)?;
            let b3 = continuation(bytes, i + 2)?;
            units.push(((b & 0x0F) << 12) | (b2 << 6) | b3);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], at: usize) -> Option<u16> {
    let b = *bytes.get(at)?;
    if b & 0xC0 != 0x80 {
        return None;
    }
    Some((b & 0x3F) as u16)
}

pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_constants_take_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.push(Constant::Long(7)).unwrap();
        let utf8 = pool.intern_utf8("next").unwrap();
        assert_eq!(long, 1);
        assert_eq!(utf8, 3);
        assert_eq!(pool.count(), 4);
        assert!(pool.get(2).is_none());
    }

    #[test]
    fn parse_preserves_indices_and_bytes() {
        let mut pool = ConstantPool::new();
        pool.intern_class("com/x/Foo").unwrap();
        pool.push(Constant::Double(f64::NAN.to_bits() | 1)).unwrap();
        pool.intern_string("hello").unwrap();

        let mut bytes = Vec::new();
        pool.write(&mut bytes).unwrap();

        let mut r = ByteReader::new(&bytes);
        let parsed = ConstantPool::parse(&mut r).unwrap();
        assert_eq!(parsed, pool);
        assert_eq!(parsed.class_name(2).unwrap(), "com/x/Foo");

        let mut again = Vec::new();
        parsed.write(&mut again).unwrap();
        assert_eq!(again, bytes);
    }

    #[test]
    fn intern_reuses_existing_entries() {
        let mut pool = ConstantPool::new();
        let first = pool
            .intern_method_ref(
                "java/lang/UnsupportedOperationException",
                "<init>",
                "(Ljava/lang/String;)V",
            )
            .unwrap();
        let count = pool.count();
        let second = pool
            .intern_method_ref(
                "java/lang/UnsupportedOperationException",
                "<init>",
                "(Ljava/lang/String;)V",
            )
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.count(), count);
    }

    #[test]
    fn bad_index_is_an_error() {
        let pool = ConstantPool::new();
        assert!(matches!(
            pool.utf8(5),
            Err(ClassFileError::BadConstant { index: 5, .. })
        ));
    }

    #[test]
    fn modified_utf8_encodes_nul_and_supplementary_chars() {
        let value = "a\u{0}é\u{1F600}";
        let encoded = encode_modified_utf8(value);
        assert_eq!(&encoded[..3], &[b'a', 0xC0, 0x80]);
        assert!(!encoded.contains(&0));
        // surrogate pair: two 3-byte sequences
        assert_eq!(encoded.len(), 1 + 2 + 2 + 6);
        assert_eq!(decode_modified_utf8(&encoded).as_deref(), Some(value));
    }

    #[test]
    fn decode_rejects_raw_nul_and_truncated_sequences() {
        assert!(decode_modified_utf8(&[b'a', 0]).is_none());
        assert!(decode_modified_utf8(&[0xE0, 0x80]).is_none());
    }
}
