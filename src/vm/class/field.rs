use std::fmt::{Display, Formatter};
use crate::class_parser::constants::AccessFlagField;
use crate::helper::has_flag;
use crate::vm::class::class::ClassRef;
use crate::vm::error::{VmError, VmResult};

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum FieldType {
    B,
    C,
    D,
    F,
    I,
    J,
    L(String),
    S,
    Z,
    A(Box<FieldType>), // [
    V
}

impl FieldType {
    /// Array class name for the `atype` operand of `newarray`.
    pub fn convert_newarray_type(atype: u8) -> VmResult<&'static str> {
        Ok(match atype {
            4 => "[Z",
            5 => "[C",
            6 => "[F",
            7 => "[D",
            8 => "[B",
            9 => "[S",
            10 => "[I",
            11 => "[J",
            _ => return Err(VmError::internal(format!("invalid newarray type {}", atype)))
        })
    }

    /// Number of slots a value of this type occupies.
    pub fn slot_count(&self) -> usize {
        match self {
            FieldType::J | FieldType::D => 2,
            FieldType::V => 0,
            _ => 1
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::L(_) | FieldType::A(_))
    }

    /// Name of the class representing values of this type: `int`, `java/lang/String`, `[I`.
    pub fn class_name(&self) -> String {
        match self {
            FieldType::L(name) => name.clone(),
            FieldType::A(_) => self.to_string(),
            primitive => primitive.primitive_name().unwrap_or_default().to_string()
        }
    }

    pub fn primitive_name(&self) -> Option<&'static str> {
        Some(match self {
            FieldType::B => "byte",
            FieldType::C => "char",
            FieldType::D => "double",
            FieldType::F => "float",
            FieldType::I => "int",
            FieldType::J => "long",
            FieldType::S => "short",
            FieldType::Z => "boolean",
            FieldType::V => "void",
            _ => return None
        })
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::B => write!(f, "B"),
            FieldType::C => write!(f, "C"),
            FieldType::D => write!(f, "D"),
            FieldType::F => write!(f, "F"),
            FieldType::I => write!(f, "I"),
            FieldType::J => write!(f, "J"),
            FieldType::L(name) => write!(f, "L{};", name),
            FieldType::S => write!(f, "S"),
            FieldType::Z => write!(f, "Z"),
            FieldType::A(component) => write!(f, "[{}", component),
            FieldType::V => write!(f, "V"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Field {
    pub flag: u16,
    pub name: String,
    pub descriptor: FieldType,
    pub class: ClassRef,
    /// Index into the static variables or into the instance slots, assigned at preparation.
    pub slot_id: usize,
    pub const_value_index: Option<u16>,
}

/// Resolved field: owning class and index into its field table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: ClassRef,
    pub index: usize,
}

impl Field {
    pub fn is_static(&self) -> bool {
        has_flag(self.flag, AccessFlagField::ACC_STATIC)
    }

    pub fn is_final(&self) -> bool {
        has_flag(self.flag, AccessFlagField::ACC_FINAL)
    }

    pub fn is_public(&self) -> bool {
        has_flag(self.flag, AccessFlagField::ACC_PUBLIC)
    }

    pub fn slot_count(&self) -> usize {
        self.descriptor.slot_count()
    }
}
