use num_enum::{IntoPrimitive, TryFromPrimitive};
use crate::class_parser::types::{U1, U2, U4};

#[derive(TryFromPrimitive, Debug, PartialEq, Copy, Clone)]
#[repr(u8)]
pub enum CPTag {
    Utf8 = 1,
    Integer = 3,        // START loadable
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,         // END
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

pub const fn cp_info_to_tag(cp_info: &CPInfo) -> Option<CPTag> {
    match cp_info {
        CPInfo::Class(_) => Some(CPTag::Class),
        CPInfo::String(_) => Some(CPTag::String),
        CPInfo::MethodType(_) => Some(CPTag::MethodType),
        CPInfo::Module(_) => Some(CPTag::Module),
        CPInfo::Package(_) => Some(CPTag::Package),
        CPInfo::Integer(_) => Some(CPTag::Integer),
        CPInfo::Float(_) => Some(CPTag::Float),
        CPInfo::MethodHandle(_, _) => Some(CPTag::MethodHandle),
        CPInfo::Fieldref(_, _) => Some(CPTag::Fieldref),
        CPInfo::Methodref(_, _) => Some(CPTag::Methodref),
        CPInfo::InterfaceMethodref(_, _) => Some(CPTag::InterfaceMethodref),
        CPInfo::NameAndType(_, _) => Some(CPTag::NameAndType),
        CPInfo::Dynamic(_, _) => Some(CPTag::Dynamic),
        CPInfo::InvokeDynamic(_, _) => Some(CPTag::InvokeDynamic),
        CPInfo::Long(_) => Some(CPTag::Long),
        CPInfo::Double(_) => Some(CPTag::Double),
        CPInfo::Utf8(_) => Some(CPTag::Utf8),
        CPInfo::Hole => None
    }
}

/// Raw constant pool entry. Numeric values are kept as raw bits, strings are already decoded
/// from modified UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub enum CPInfo {
    Class(U2),
    String(U2),
    MethodType(U2),
    Module(U2),
    Package(U2),
    Integer(U4),
    Float(U4),
    MethodHandle(U1, U2),
    Fieldref(U2, U2),
    Methodref(U2, U2),
    InterfaceMethodref(U2, U2),
    NameAndType(U2, U2),
    Dynamic(U2, U2),
    InvokeDynamic(U2, U2),
    Long(u64),
    Double(u64),
    Utf8(std::string::String),
    Hole, // Used for marking an empty slot in the constant pool (for long, double)
}

#[derive(IntoPrimitive, Copy, Clone, Debug)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum AccessFlagClass {
    ACC_PUBLIC = 0x0001,
    ACC_FINAL = 0x0010,
    ACC_SUPER = 0x0020,
    ACC_INTERFACE = 0x0200,
    ACC_ABSTRACT = 0x0400,
    ACC_SYNTHETIC = 0x1000,
    ACC_ANNOTATION = 0x2000,
    ACC_ENUM = 0x4000,
}

#[derive(IntoPrimitive, Copy, Clone, Debug)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum AccessFlagField {
    ACC_PUBLIC = 0x0001,
    ACC_PRIVATE = 0x0002,
    ACC_PROTECTED = 0x0004,
    ACC_STATIC = 0x0008,
    ACC_FINAL = 0x0010,
    ACC_VOLATILE = 0x0040,
    ACC_TRANSIENT = 0x0080,
    ACC_SYNTHETIC = 0x1000,
    ACC_ENUM = 0x4000,
}

#[derive(IntoPrimitive, Copy, Clone, Debug)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum AccessFlagMethod {
    ACC_PUBLIC = 0x0001,
    ACC_PRIVATE = 0x0002,
    ACC_PROTECTED = 0x0004,
    ACC_STATIC = 0x0008,
    ACC_FINAL = 0x0010,
    ACC_SYNCHRONIZED = 0x0020,
    ACC_BRIDGE = 0x0040,
    ACC_VARARGS = 0x0080,
    ACC_NATIVE = 0x0100,
    ACC_ABSTRACT = 0x0400,
    ACC_STRICT = 0x0800,
    ACC_SYNTHETIC = 0x1000,
}
