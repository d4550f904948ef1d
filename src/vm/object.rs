use std::fmt::{Display, Formatter};
use crate::vm::class::class::ClassRef;
use crate::vm::error::{VmError, VmResult};
use crate::vm::thread::slot::Slots;

/// Handle of an object in the heap arena. Null references are `Option<ObjectRef>::None`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub(crate) u32);

impl ObjectRef {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Identity hash code: the allocation index.
    pub fn identity_hash(&self) -> i32 {
        self.0 as i32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Fields(Slots),
    Bytes(Vec<i8>), // byte[] and boolean[]
    Shorts(Vec<i16>),
    Chars(Vec<u16>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Refs(Vec<Option<ObjectRef>>),
}

impl ObjectData {
    pub fn array_length(&self) -> Option<usize> {
        Some(match self {
            ObjectData::Fields(_) => return None,
            ObjectData::Bytes(v) => v.len(),
            ObjectData::Shorts(v) => v.len(),
            ObjectData::Chars(v) => v.len(),
            ObjectData::Ints(v) => v.len(),
            ObjectData::Longs(v) => v.len(),
            ObjectData::Floats(v) => v.len(),
            ObjectData::Doubles(v) => v.len(),
            ObjectData::Refs(v) => v.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackTraceElement {
    pub file_name: Option<String>,
    pub class_name: String,
    pub method_name: String,
    pub line_number: Option<u16>,
}

impl Display for StackTraceElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}(", self.class_name, self.method_name)?;
        match (&self.file_name, self.line_number) {
            (Some(file), Some(line)) => write!(f, "{}:{})", file, line),
            (Some(file), None) => write!(f, "{})", file),
            _ => write!(f, "Unknown Source)")
        }
    }
}

/// Host-side payload attached to an object.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Extra {
    #[default]
    None,
    /// The object is the `java/lang/Class` mirror of this class.
    Mirror(ClassRef),
    StackTrace(Vec<StackTraceElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub class: ClassRef,
    pub data: ObjectData,
    pub extra: Extra,
}

impl Object {
    pub fn fields(&self) -> VmResult<&Slots> {
        match &self.data {
            ObjectData::Fields(slots) => Ok(slots),
            _ => Err(VmError::internal("array used as a plain object"))
        }
    }

    pub fn fields_mut(&mut self) -> VmResult<&mut Slots> {
        match &mut self.data {
            ObjectData::Fields(slots) => Ok(slots),
            _ => Err(VmError::internal("array used as a plain object"))
        }
    }

    pub fn is_array(&self) -> bool {
        !matches!(self.data, ObjectData::Fields(_))
    }

    pub fn mirrored_class(&self) -> Option<ClassRef> {
        match self.extra {
            Extra::Mirror(class) => Some(class),
            _ => None
        }
    }
}
