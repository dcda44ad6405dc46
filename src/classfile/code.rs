//! `Code` attribute payload (JVMS 4.7.3).

use crate::error::ClassFileError;

use super::reader::ByteReader;
use super::{Attribute, parse_attributes, write_attributes};

pub mod opcodes {
    pub const ILOAD_1: u8 = 0x1b;
    pub const ILOAD_2: u8 = 0x1c;
    pub const ALOAD_0: u8 = 0x2a;
    pub const LDC: u8 = 0x12;
    pub const LDC_W: u8 = 0x13;
    pub const DUP: u8 = 0x59;
    pub const IADD: u8 = 0x60;
    pub const IRETURN: u8 = 0xac;
    pub const ARETURN: u8 = 0xb0;
    pub const RETURN: u8 = 0xb1;
    pub const INVOKESPECIAL: u8 = 0xb7;
    pub const NEW: u8 = 0xbb;
    pub const ATHROW: u8 = 0xbf;
}

const MAX_CODE_LENGTH: usize = 65535;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<Attribute>,
}

impl Code {
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn parse(info: &[u8]) -> Result<Self, ClassFileError> {
        let mut r = ByteReader::new(info);
        let max_stack = r.u16()?;
        let max_locals = r.u16()?;
        let code_length = r.u32()? as usize;
        let code = r.take(code_length)?.to_vec();

        let table_length = r.u16()?;
        let mut exception_table = Vec::with_capacity(table_length as usize);
        for _ in 0..table_length {
            exception_table.push(ExceptionTableEntry {
                start_pc: r.u16()?,
                end_pc: r.u16()?,
                handler_pc: r.u16()?,
                catch_type: r.u16()?,
            });
        }

        let attributes = parse_attributes(&mut r)?;
        if r.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ClassFileError> {
        if self.code.is_empty() || self.code.len() > MAX_CODE_LENGTH {
            return Err(ClassFileError::TooLarge {
                what: "method code",
                len: self.code.len(),
                max: MAX_CODE_LENGTH,
            });
        }

        let mut out = Vec::with_capacity(12 + self.code.len());
        out.extend_from_slice(&self.max_stack.to_be_bytes());
        out.extend_from_slice(&self.max_locals.to_be_bytes());
        out.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.code);

        let table_length = super::u16_len("exception table", self.exception_table.len())?;
        out.extend_from_slice(&table_length.to_be_bytes());
        for entry in &self.exception_table {
            out.extend_from_slice(&entry.start_pc.to_be_bytes());
            out.extend_from_slice(&entry.end_pc.to_be_bytes());
            out.extend_from_slice(&entry.handler_pc.to_be_bytes());
            out.extend_from_slice(&entry.catch_type.to_be_bytes());
        }

        write_attributes(&self.attributes, &mut out)?;
        Ok(out)
    }

    pub fn into_attribute(self, name_index: u16) -> Result<Attribute, ClassFileError> {
        Ok(Attribute {
            name_index,
            info: self.to_bytes()?,
        })
    }
}
