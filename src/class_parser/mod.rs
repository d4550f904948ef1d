use std::io::{Cursor, Read};
use thiserror::Error;
use crate::class_parser::types::{Attribute, CodeAttribute, ExceptionTableEntry, LineNumberEntry, MemberInfo, ParsedClass, U1, U2, U4};
use crate::class_parser::be_reader::{BEReader, read_bytes, read_table};
use crate::class_parser::constants::{CPInfo, CPTag};

pub mod types;
pub mod constants;
mod be_reader;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("Not a class file")]
    BadMagic,
    #[error("Unknown constant pool tag {0}")]
    UnknownTag(u8),
    #[error("Format error at constant pool item {0}, expected {1:?}")]
    BadConstant(U2, CPTag),
    #[error("Malformed modified UTF-8 string")]
    BadUtf8,
    #[error("Class file is longer than expected")]
    TrailingBytes,
}

/// Decodes the modified UTF-8 used by class files (two-byte NUL, surrogate pairs
/// encoded separately).
fn decode_mutf8(bytes: &[u8]) -> Result<String, ParseError> {
    let mut chars = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i] as u16;
        if b & 0x80 == 0 {
            chars.push(b);
            i += 1;
        } else if b & 0xe0 == 0xc0 {
            let b2 = *bytes.get(i + 1).ok_or(ParseError::BadUtf8)? as u16;
            chars.push(((b & 0x1f) << 6) | (b2 & 0x3f));
            i += 2;
        } else if b & 0xf0 == 0xe0 {
            let b2 = *bytes.get(i + 1).ok_or(ParseError::BadUtf8)? as u16;
            let b3 = *bytes.get(i + 2).ok_or(ParseError::BadUtf8)? as u16;
            chars.push(((b & 0x0f) << 12) | ((b2 & 0x3f) << 6) | (b3 & 0x3f));
            i += 3;
        } else {
            return Err(ParseError::BadUtf8);
        }
    }
    Ok(String::from_utf16_lossy(&chars))
}

fn parse_cp_info(reader: &mut impl Read, constant_pool: &mut Vec<CPInfo>) -> Result<(), ParseError> {
    use CPTag::*;

    let tag = U1::read(reader)?;
    let tag = CPTag::try_from(tag).map_err(|_| ParseError::UnknownTag(tag))?;

    match tag {
        Utf8 => {
            let length = U2::read(reader)? as usize;
            let buf = read_bytes(reader, length)?;
            constant_pool.push(CPInfo::Utf8(decode_mutf8(&buf)?));
        }
        Class => constant_pool.push(CPInfo::Class(U2::read(reader)?)),
        String => constant_pool.push(CPInfo::String(U2::read(reader)?)),
        MethodType => constant_pool.push(CPInfo::MethodType(U2::read(reader)?)),
        Module => constant_pool.push(CPInfo::Module(U2::read(reader)?)),
        Package => constant_pool.push(CPInfo::Package(U2::read(reader)?)),
        Integer => constant_pool.push(CPInfo::Integer(U4::read(reader)?)),
        Float => constant_pool.push(CPInfo::Float(U4::read(reader)?)),
        Fieldref | Methodref | InterfaceMethodref | NameAndType | Dynamic | InvokeDynamic => {
            let u2_1 = U2::read(reader)?;
            let u2_2 = U2::read(reader)?;
            constant_pool.push(match tag {
                Fieldref => CPInfo::Fieldref(u2_1, u2_2),
                Methodref => CPInfo::Methodref(u2_1, u2_2),
                InterfaceMethodref => CPInfo::InterfaceMethodref(u2_1, u2_2),
                NameAndType => CPInfo::NameAndType(u2_1, u2_2),
                Dynamic => CPInfo::Dynamic(u2_1, u2_2),
                _ => CPInfo::InvokeDynamic(u2_1, u2_2),
            });
        }
        Long | Double => {
            let high = U4::read(reader)? as u64;
            let low = U4::read(reader)? as u64;
            let bits = high << 32 | low;
            constant_pool.push(if tag == Long { CPInfo::Long(bits) } else { CPInfo::Double(bits) });
            constant_pool.push(CPInfo::Hole);
        }
        MethodHandle => {
            let u1 = U1::read(reader)?;
            let u2 = U2::read(reader)?;
            constant_pool.push(CPInfo::MethodHandle(u1, u2));
        }
    }

    Ok(())
}

fn parse_member_info(reader: &mut Cursor<&[u8]>, constant_pool: &[CPInfo]) -> Result<MemberInfo, ParseError> {
    let access_flags = U2::read(reader)?;
    let name_index = U2::read(reader)?;
    let descriptor_index = U2::read(reader)?;
    let attributes = read_table(reader, |r| parse_attribute(r, constant_pool))?;

    Ok(MemberInfo {
        access_flags,
        name_index,
        descriptor_index,
        attributes,
    })
}

fn parse_attribute(reader: &mut Cursor<&[u8]>, constant_pool: &[CPInfo]) -> Result<Attribute, ParseError> {
    let attribute_name_index = U2::read(reader)?;
    let attribute_length = U4::read(reader)? as usize;
    let info = read_bytes(reader, attribute_length)?;

    let name = match (attribute_name_index as usize).checked_sub(1).and_then(|i| constant_pool.get(i)) {
        Some(CPInfo::Utf8(name)) => name.as_str(),
        _ => return Err(ParseError::BadConstant(attribute_name_index, CPTag::Utf8))
    };

    let mut cursor = Cursor::new(info.as_slice());
    let attribute = match name {
        "Code" => {
            let max_stack = U2::read(&mut cursor)?;
            let max_locals = U2::read(&mut cursor)?;
            let code_length = U4::read(&mut cursor)? as usize;
            let code = read_bytes(&mut cursor, code_length)?;
            let exception_table = read_table(&mut cursor, |r| Ok(ExceptionTableEntry {
                start_pc: U2::read(r)?,
                end_pc: U2::read(r)?,
                handler_pc: U2::read(r)?,
                catch_type: U2::read(r)?,
            }))?;
            let attributes = read_table(&mut cursor, |r| parse_attribute(r, constant_pool))?;

            Attribute::Code(CodeAttribute { max_stack, max_locals, code, exception_table, attributes })
        }
        "ConstantValue" => Attribute::ConstantValue(U2::read(&mut cursor)?),
        "Exceptions" => Attribute::Exceptions(read_table(&mut cursor, |r| U2::read(r))?),
        "LineNumberTable" => Attribute::LineNumberTable(read_table(&mut cursor, |r| Ok(LineNumberEntry {
            start_pc: U2::read(r)?,
            line_number: U2::read(r)?,
        }))?),
        "SourceFile" => Attribute::SourceFile(U2::read(&mut cursor)?),
        _ => Attribute::Unparsed { name: name.to_string(), info },
    };

    Ok(attribute)
}

pub fn parse_class(buf: &[u8]) -> Result<ParsedClass, ParseError> {
    let mut cursor = Cursor::new(buf);

    let magic = U4::read(&mut cursor)?;
    if magic != 0xCAFEBABE {
        return Err(ParseError::BadMagic);
    }

    let minor_version = U2::read(&mut cursor)?;
    let major_version = U2::read(&mut cursor)?;

    let constant_pool_count = U2::read(&mut cursor)?.saturating_sub(1);
    let mut constant_pool = Vec::with_capacity(constant_pool_count as usize);
    while constant_pool.len() < constant_pool_count as usize {
        parse_cp_info(&mut cursor, &mut constant_pool)?;
    }

    let access_flags = U2::read(&mut cursor)?;
    let this_class = U2::read(&mut cursor)?;
    let super_class = U2::read(&mut cursor)?;

    let interfaces = read_table(&mut cursor, |r| U2::read(r))?;
    let fields = read_table(&mut cursor, |r| parse_member_info(r, &constant_pool))?;
    let methods = read_table(&mut cursor, |r| parse_member_info(r, &constant_pool))?;
    let attributes = read_table(&mut cursor, |r| parse_attribute(r, &constant_pool))?;

    if cursor.position() as usize != buf.len() {
        return Err(ParseError::TrailingBytes);
    }

    Ok(ParsedClass {
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes
    })
}
