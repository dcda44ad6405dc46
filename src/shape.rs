//! Declared shape of a class: everything a compiler or reflection can see,
//! with method bodies left out. Two class files with equal shapes are
//! interchangeable at compile time.

use serde::Serialize;

use crate::classfile::{CODE_ATTRIBUTE, ClassFile, FlagContext, MemberInfo, flag_names};
use crate::error::ClassFileError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassShape {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub version: String,
    pub access_flags: u16,
    pub flags: Vec<&'static str>,
    pub attributes: Vec<String>,
    pub fields: Vec<MemberShape>,
    pub methods: Vec<MemberShape>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberShape {
    pub name: String,
    pub descriptor: String,
    pub access_flags: u16,
    pub flags: Vec<&'static str>,
    /// Attribute names in declaration order, `Code` excluded.
    pub attributes: Vec<String>,
}

impl ClassShape {
    pub fn of(class_file: &ClassFile) -> Result<Self, ClassFileError> {
        let attributes = class_file
            .attributes
            .iter()
            .map(|a| class_file.attribute_name(a))
            .collect::<Result<Vec<_>, _>>()?;
        let fields = class_file
            .fields
            .iter()
            .map(|f| MemberShape::of(class_file, f, FlagContext::Field))
            .collect::<Result<Vec<_>, _>>()?;
        let methods = class_file
            .methods
            .iter()
            .map(|m| MemberShape::of(class_file, m, FlagContext::Method))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: class_file.name()?,
            super_name: class_file.super_name()?,
            interfaces: class_file.interface_names()?,
            version: format!("{}.{}", class_file.major_version, class_file.minor_version),
            access_flags: class_file.access_flags,
            flags: flag_names(class_file.access_flags, FlagContext::Class),
            attributes,
            fields,
            methods,
        })
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MemberShape> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

impl MemberShape {
    fn of(
        class_file: &ClassFile,
        member: &MemberInfo,
        context: FlagContext,
    ) -> Result<Self, ClassFileError> {
        let mut attributes = Vec::with_capacity(member.attributes.len());
        for attribute in &member.attributes {
            let name = class_file.attribute_name(attribute)?;
            if name != CODE_ATTRIBUTE {
                attributes.push(name);
            }
        }
        Ok(Self {
            name: class_file.member_name(member)?,
            descriptor: class_file.member_descriptor(member)?,
            access_flags: member.access_flags,
            flags: flag_names(member.access_flags, context),
            attributes,
        })
    }
}
