use std::fmt::{Display, Formatter};
use std::rc::Rc;
use crate::class_parser::constants::AccessFlagMethod;
use crate::helper::has_flag;
use crate::vm::class::class::ClassRef;
use crate::vm::class::field::FieldType;

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub ret: FieldType
}

impl MethodDescriptor {
    pub fn parameter_slots(&self) -> usize {
        self.parameters.iter().map(FieldType::slot_count).sum()
    }
}

impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for p in &self.parameters {
            write!(f, "{}", p)?;
        }
        write!(f, "){}", self.ret)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionHandler {
    pub start_pc: usize,
    pub end_pc: usize,
    pub handler_pc: usize,
    /// Constant pool index of the caught class, `None` catches everything.
    pub catch_type: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    pub max_stack: usize,
    pub max_locals: usize,
    pub code: Vec<u8>,
    pub exception_handlers: Vec<ExceptionHandler>,
    pub line_numbers: Vec<(u16, u16)>, // (start_pc, line)
}

impl Code {
    pub fn line_number(&self, pc: usize) -> Option<u16> {
        self.line_numbers.iter()
            .filter(|(start, _)| *start as usize <= pc)
            .max_by_key(|(start, _)| *start)
            .map(|(_, line)| *line)
    }
}

/// Opcode reserved for the native method bridge.
pub const INVOKE_NATIVE: u8 = 0xfe;

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub flag: u16,
    pub name: String,
    pub descriptor: MethodDescriptor,
    pub class: ClassRef,
    pub code: Rc<Code>,
    /// Parameter slots plus one for `this` on instance methods.
    pub arg_slot_count: usize,
    pub exceptions: Vec<String>,
}

/// Resolved method: owning class and index into its method table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: ClassRef,
    pub index: usize,
}

impl Method {
    pub fn new(flag: u16, name: String, descriptor: MethodDescriptor, code: Option<Code>,
               exceptions: Vec<String>) -> Method {
        let mut arg_slot_count = descriptor.parameter_slots();
        if !has_flag(flag, AccessFlagMethod::ACC_STATIC) {
            arg_slot_count += 1;
        }

        let code = if has_flag(flag, AccessFlagMethod::ACC_NATIVE) {
            Self::native_code(&descriptor, arg_slot_count)
        } else {
            code.unwrap_or_default()
        };

        Method {
            flag,
            name,
            descriptor,
            class: ClassRef::UNASSIGNED,
            code: Rc::new(code),
            arg_slot_count,
            exceptions,
        }
    }

    /// Natives run through a two instruction body: the bridge opcode followed by the return
    /// matching the descriptor.
    fn native_code(descriptor: &MethodDescriptor, arg_slot_count: usize) -> Code {
        let ret = match descriptor.ret {
            FieldType::V => 0xb1,
            FieldType::D => 0xaf,
            FieldType::F => 0xae,
            FieldType::J => 0xad,
            FieldType::L(_) | FieldType::A(_) => 0xb0,
            _ => 0xac,
        };

        Code {
            max_stack: 4,
            max_locals: arg_slot_count,
            code: vec![INVOKE_NATIVE, ret],
            ..Default::default()
        }
    }

    pub fn is_static(&self) -> bool {
        has_flag(self.flag, AccessFlagMethod::ACC_STATIC)
    }

    pub fn is_public(&self) -> bool {
        has_flag(self.flag, AccessFlagMethod::ACC_PUBLIC)
    }

    pub fn is_private(&self) -> bool {
        has_flag(self.flag, AccessFlagMethod::ACC_PRIVATE)
    }

    pub fn is_protected(&self) -> bool {
        has_flag(self.flag, AccessFlagMethod::ACC_PROTECTED)
    }

    pub fn is_abstract(&self) -> bool {
        has_flag(self.flag, AccessFlagMethod::ACC_ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        has_flag(self.flag, AccessFlagMethod::ACC_NATIVE)
    }

    pub fn is_clinit(&self) -> bool {
        self.name == "<clinit>" && self.is_static()
            && self.descriptor.parameters.is_empty() && self.descriptor.ret == FieldType::V
    }
}
