use crate::class_parser::constants::{cp_info_to_tag, CPInfo, CPTag};
use crate::class_parser::ParseError;

pub type U1 = u8;
pub type U2 = u16;
pub type U4 = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub access_flags: U2,
    pub name_index: U2,
    pub descriptor_index: U2,
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Code(code) => Some(code),
            _ => None
        })
    }

    pub fn constant_value_index(&self) -> Option<U2> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::ConstantValue(index) => Some(*index),
            _ => None
        })
    }

    pub fn exception_indices(&self) -> &[U2] {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Exceptions(indices) => Some(indices.as_slice()),
            _ => None
        }).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: U2,
    pub end_pc: U2,
    pub handler_pc: U2,
    pub catch_type: U2, // 0 means catch-all
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineNumberEntry {
    pub start_pc: U2,
    pub line_number: U2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttribute {
    pub max_stack: U2,
    pub max_locals: U2,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    pub fn line_numbers(&self) -> Vec<LineNumberEntry> {
        self.attributes.iter().filter_map(|a| match a {
            Attribute::LineNumberTable(entries) => Some(entries.iter().cloned()),
            _ => None
        }).flatten().collect()
    }
}

/// Attributes the VM understands are decoded, everything else is kept as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Code(CodeAttribute),
    ConstantValue(U2),
    Exceptions(Vec<U2>),
    LineNumberTable(Vec<LineNumberEntry>),
    SourceFile(U2),
    Unparsed { name: String, info: Vec<u8> },
}

#[derive(Debug)]
pub struct ParsedClass {
    pub minor_version: U2,
    pub major_version: U2,
    pub constant_pool: Vec<CPInfo>, // of length constant_pool_count-1
    pub access_flags: U2,
    pub this_class: U2,
    pub super_class: U2,
    pub interfaces: Vec<U2>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

impl ParsedClass {
    pub fn get_cp_info_raw(&self, index: U2, cp_info_type: CPTag) -> Option<&CPInfo> {
        let elem = self.constant_pool.get((index as usize).checked_sub(1)?)?;
        let tag = cp_info_to_tag(elem)?;
        if tag == cp_info_type {
            Some(elem)
        } else {
            None
        }
    }

    pub fn utf8(&self, index: U2) -> Result<&str, ParseError> {
        match self.get_cp_info_raw(index, CPTag::Utf8) {
            Some(CPInfo::Utf8(s)) => Ok(s.as_str()),
            _ => Err(ParseError::BadConstant(index, CPTag::Utf8))
        }
    }

    pub fn class_name_at(&self, index: U2) -> Result<&str, ParseError> {
        match self.get_cp_info_raw(index, CPTag::Class) {
            Some(CPInfo::Class(name)) => self.utf8(*name),
            _ => Err(ParseError::BadConstant(index, CPTag::Class))
        }
    }

    pub fn name_and_type(&self, index: U2) -> Result<(&str, &str), ParseError> {
        match self.get_cp_info_raw(index, CPTag::NameAndType) {
            Some(CPInfo::NameAndType(name, descriptor)) =>
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?)),
            _ => Err(ParseError::BadConstant(index, CPTag::NameAndType))
        }
    }

    pub fn class_name(&self) -> Result<&str, ParseError> {
        self.class_name_at(self.this_class)
    }

    /// `None` only for `java/lang/Object`.
    pub fn super_class_name(&self) -> Result<Option<&str>, ParseError> {
        if self.super_class == 0 {
            Ok(None)
        } else {
            self.class_name_at(self.super_class).map(Some)
        }
    }

    pub fn interface_names(&self) -> Result<Vec<&str>, ParseError> {
        self.interfaces.iter().map(|i| self.class_name_at(*i)).collect()
    }

    pub fn source_file(&self) -> Option<&str> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::SourceFile(index) => self.utf8(*index).ok(),
            _ => None
        })
    }
}
