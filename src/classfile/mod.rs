//! JVM class file model, parser and writer.
//!
//! Only the structure the rewriter needs is decoded: the constant pool, the
//! access flags, the member tables and attribute headers. Attribute payloads
//! stay raw bytes, so everything that is not explicitly modified is written
//! back exactly as it was read.

pub mod access;
pub mod code;
pub mod constpool;
pub mod descriptor;
mod reader;

use crate::error::ClassFileError;

pub use access::*;
pub use code::{Code, ExceptionTableEntry};
pub use constpool::{Constant, ConstantPool};
pub use descriptor::argument_slots;

use reader::ByteReader;

pub const MAGIC: u32 = 0xCAFEBABE;
pub const JAVA_8: u16 = 52;

pub const CODE_ATTRIBUTE: &str = "Code";
pub const EXCEPTIONS_ATTRIBUTE: &str = "Exceptions";

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name_index: u16,
    pub info: Vec<u8>,
}

/// A `field_info` or `method_info` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    pub fn has_flag(&self, flag: u16) -> bool {
        self.access_flags & flag != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// An empty class with the given internal names. `super_name` is `None`
    /// only for `java/lang/Object`.
    pub fn new(
        major_version: u16,
        access_flags: u16,
        name: &str,
        super_name: Option<&str>,
    ) -> Result<Self, ClassFileError> {
        let mut constant_pool = ConstantPool::new();
        let this_class = constant_pool.intern_class(name)?;
        let super_class = match super_name {
            Some(super_name) => constant_pool.intern_class(super_name)?,
            None => 0,
        };
        Ok(Self {
            minor_version: 0,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFileError> {
        let mut r = ByteReader::new(bytes);
        let magic = r.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        let minor_version = r.u16()?;
        let major_version = r.u16()?;
        let constant_pool = ConstantPool::parse(&mut r)?;
        let access_flags = r.u16()?;
        let this_class = r.u16()?;
        let super_class = r.u16()?;

        let interface_count = r.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(r.u16()?);
        }

        let fields = parse_members(&mut r)?;
        let methods = parse_members(&mut r)?;
        let attributes = parse_attributes(&mut r)?;

        if r.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.constant_pool.write(&mut out)?;
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());

        out.extend_from_slice(&u16_len("interfaces", self.interfaces.len())?.to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }

        write_members("fields", &self.fields, &mut out)?;
        write_members("methods", &self.methods, &mut out)?;
        write_attributes(&self.attributes, &mut out)?;
        Ok(out)
    }

    pub fn has_flag(&self, flag: u16) -> bool {
        self.access_flags & flag != 0
    }

    /// Internal name, e.g. `com/x/Foo`.
    pub fn name(&self) -> Result<String, ClassFileError> {
        self.constant_pool.class_name(self.this_class)
    }

    pub fn super_name(&self) -> Result<Option<String>, ClassFileError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    pub fn interface_names(&self) -> Result<Vec<String>, ClassFileError> {
        self.interfaces
            .iter()
            .map(|&index| self.constant_pool.class_name(index))
            .collect()
    }

    pub fn member_name(&self, member: &MemberInfo) -> Result<String, ClassFileError> {
        self.constant_pool.utf8_string(member.name_index)
    }

    pub fn member_descriptor(&self, member: &MemberInfo) -> Result<String, ClassFileError> {
        self.constant_pool.utf8_string(member.descriptor_index)
    }

    pub fn attribute_name(&self, attribute: &Attribute) -> Result<String, ClassFileError> {
        self.constant_pool.utf8_string(attribute.name_index)
    }

    /// First attribute of `member` with the given name.
    pub fn find_attribute<'a>(&self, member: &'a MemberInfo, name: &str) -> Option<&'a Attribute> {
        member
            .attributes
            .iter()
            .find(|a| is_attribute_named(&self.constant_pool, a, name))
    }

    pub fn add_field(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
    ) -> Result<&mut MemberInfo, ClassFileError> {
        let member = self.new_member(access_flags, name, descriptor)?;
        let index = self.fields.len();
        self.fields.push(member);
        Ok(&mut self.fields[index])
    }

    /// Adds a method; `code` is `None` for abstract and native methods.
    pub fn add_method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        code: Option<Code>,
    ) -> Result<&mut MemberInfo, ClassFileError> {
        let mut member = self.new_member(access_flags, name, descriptor)?;
        if let Some(code) = code {
            let code_name = self.constant_pool.intern_utf8(CODE_ATTRIBUTE)?;
            member.attributes.push(code.into_attribute(code_name)?);
        }
        let index = self.methods.len();
        self.methods.push(member);
        Ok(&mut self.methods[index])
    }

    fn new_member(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
    ) -> Result<MemberInfo, ClassFileError> {
        Ok(MemberInfo {
            access_flags,
            name_index: self.constant_pool.intern_utf8(name)?,
            descriptor_index: self.constant_pool.intern_utf8(descriptor)?,
            attributes: Vec::new(),
        })
    }
}

pub(crate) fn is_attribute_named(pool: &ConstantPool, attribute: &Attribute, name: &str) -> bool {
    pool.utf8(attribute.name_index)
        .is_ok_and(|bytes| bytes == name.as_bytes())
}

fn parse_members(r: &mut ByteReader<'_>) -> Result<Vec<MemberInfo>, ClassFileError> {
    let count = r.u16()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access_flags = r.u16()?;
        let name_index = r.u16()?;
        let descriptor_index = r.u16()?;
        let attributes = parse_attributes(r)?;
        members.push(MemberInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
    }
    Ok(members)
}

pub(crate) fn parse_attributes(r: &mut ByteReader<'_>) -> Result<Vec<Attribute>, ClassFileError> {
    let count = r.u16()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = r.u16()?;
        let len = r.u32()? as usize;
        let info = r.take(len)?.to_vec();
        attributes.push(Attribute { name_index, info });
    }
    Ok(attributes)
}

fn write_members(
    what: &'static str,
    members: &[MemberInfo],
    out: &mut Vec<u8>,
) -> Result<(), ClassFileError> {
    out.extend_from_slice(&u16_len(what, members.len())?.to_be_bytes());
    for member in members {
        out.extend_from_slice(&member.access_flags.to_be_bytes());
        out.extend_from_slice(&member.name_index.to_be_bytes());
        out.extend_from_slice(&member.descriptor_index.to_be_bytes());
        write_attributes(&member.attributes, out)?;
    }
    Ok(())
}

pub(crate) fn write_attributes(
    attributes: &[Attribute],
    out: &mut Vec<u8>,
) -> Result<(), ClassFileError> {
    out.extend_from_slice(&u16_len("attributes", attributes.len())?.to_be_bytes());
    for attribute in attributes {
        let len = u32::try_from(attribute.info.len()).map_err(|_| ClassFileError::TooLarge {
            what: "attribute",
            len: attribute.info.len(),
            max: u32::MAX as usize,
        })?;
        out.extend_from_slice(&attribute.name_index.to_be_bytes());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&attribute.info);
    }
    Ok(())
}

pub(crate) fn u16_len(what: &'static str, len: usize) -> Result<u16, ClassFileError> {
    u16::try_from(len).map_err(|_| ClassFileError::TooLarge {
        what,
        len,
        max: u16::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::code::opcodes::*;
    use super::*;

    fn sample_class() -> ClassFile {
        let mut class = ClassFile::new(
            JAVA_8,
            ACC_PUBLIC | ACC_SUPER,
            "com/x/Foo",
            Some("java/lang/Object"),
        )
        .unwrap();
        let runnable = class.constant_pool.intern_class("java/lang/Runnable").unwrap();
        class.interfaces.push(runnable);
        class.add_field(ACC_PRIVATE, "count", "I").unwrap();
        class
            .add_method(
                ACC_PUBLIC,
                "run",
                "()V",
                Some(Code::new(0, 1, vec![RETURN])),
            )
            .unwrap();
        class
    }

    #[test]
    fn parse_round_trips_written_bytes() {
        let class = sample_class();
        let bytes = class.to_bytes().unwrap();
        let parsed = ClassFile::parse(&bytes).unwrap();
        assert_eq!(parsed, class);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn names_resolve_through_the_pool() {
        let class = sample_class();
        assert_eq!(class.name().unwrap(), "com/x/Foo");
        assert_eq!(class.super_name().unwrap().as_deref(), Some("java/lang/Object"));
        assert_eq!(class.interface_names().unwrap(), vec!["java/lang/Runnable"]);

        let method = &class.methods[0];
        assert_eq!(class.member_name(method).unwrap(), "run");
        assert_eq!(class.member_descriptor(method).unwrap(), "()V");
        let code = class.find_attribute(method, CODE_ATTRIBUTE).unwrap();
        assert_eq!(Code::parse(&code.info).unwrap().code, vec![RETURN]);
    }

    #[test]
    fn parse_rejects_bad_magic_and_trailing_bytes() {
        assert!(matches!(
            ClassFile::parse(&[0xDE, 0xAD, 0xBE, 0xEF]),
            Err(ClassFileError::BadMagic(0xDEADBEEF))
        ));

        let mut bytes = sample_class().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            ClassFile::parse(&bytes),
            Err(ClassFileError::TrailingBytes(1))
        ));
    }

    #[test]
    fn parse_rejects_truncated_input() {
        let bytes = sample_class().to_bytes().unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(
            ClassFile::parse(cut),
            Err(ClassFileError::Truncated { .. })
        ));
    }
}
