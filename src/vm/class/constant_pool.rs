use crate::class_parser::constants::{CPInfo, CPTag};
use crate::class_parser::types::ParsedClass;
use crate::class_parser::ParseError;
use crate::helper::utod;
use crate::vm::class::class::ClassRef;
use crate::vm::class::field::{FieldRef, FieldType};
use crate::vm::class::method::{MethodDescriptor, MethodRef};
use crate::vm::error::{JavaErrorKind, VmError, VmResult};

/// Memoized outcome of resolving a symbolic reference. A failure is final.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Unresolved,
    Resolved(T),
    Failed(JavaErrorKind, String),
}

impl<T: Copy> Resolution<T> {
    /// `None` while unresolved, otherwise the memoized result.
    pub fn get(&self) -> Option<VmResult<T>> {
        match self {
            Resolution::Unresolved => None,
            Resolution::Resolved(v) => Some(Ok(*v)),
            Resolution::Failed(kind, message) => Some(Err(VmError::java(*kind, message.clone())))
        }
    }

    /// Records `result`; internal errors are not memoized since they never reach Java code.
    pub fn record(&mut self, result: &VmResult<T>) {
        match result {
            Ok(v) => *self = Resolution::Resolved(*v),
            Err(VmError::Java { kind, message }) => *self = Resolution::Failed(*kind, message.clone()),
            Err(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSymRef {
    pub name: String,
    pub resolved: Resolution<ClassRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSymRef {
    pub class_index: u16,
    pub name: String,
    pub descriptor: FieldType,
    pub resolved: Resolution<FieldRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSymRef {
    pub class_index: u16,
    pub name: String,
    pub descriptor: MethodDescriptor,
    pub resolved: Resolution<MethodRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String), // interned lazily, when first loaded
    Class(ClassSymRef),
    Field(FieldSymRef),
    Method(MethodSymRef),
    InterfaceMethod(MethodSymRef),
}

/// Runtime constant pool. Index 0 and the second slot of longs and doubles are empty, as are
/// entries the VM does not use directly (UTF-8, name-and-type, method handles, ...).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstantPool {
    entries: Vec<Option<Constant>>,
}

impl ConstantPool {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u16) -> VmResult<&Constant> {
        self.entries.get(index as usize).and_then(Option::as_ref)
            .ok_or_else(|| VmError::internal(format!("invalid constant pool index {}", index)))
    }

    pub fn get_mut(&mut self, index: u16) -> VmResult<&mut Constant> {
        self.entries.get_mut(index as usize).and_then(Option::as_mut)
            .ok_or_else(|| VmError::internal(format!("invalid constant pool index {}", index)))
    }

    pub fn class_name(&self, index: u16) -> VmResult<&str> {
        match self.get(index)? {
            Constant::Class(sym) => Ok(sym.name.as_str()),
            other => Err(wrong_kind(index, "class", other))
        }
    }

    pub fn from_parsed(parsed: &ParsedClass) -> Result<ConstantPool, ParseError> {
        let mut entries = Vec::with_capacity(parsed.constant_pool.len() + 1);
        entries.push(None);

        for (i, entry) in parsed.constant_pool.iter().enumerate() {
            let index = (i + 1) as u16;
            let constant = match entry {
                CPInfo::Integer(v) => Some(Constant::Integer(*v as i32)),
                CPInfo::Float(v) => Some(Constant::Float(f32::from_bits(*v))),
                CPInfo::Long(v) => Some(Constant::Long(*v as i64)),
                CPInfo::Double(v) => Some(Constant::Double(utod(*v))),
                CPInfo::String(s) => Some(Constant::String(parsed.utf8(*s)?.to_string())),
                CPInfo::Class(name) => Some(Constant::Class(ClassSymRef {
                    name: parsed.utf8(*name)?.to_string(),
                    resolved: Resolution::Unresolved,
                })),
                CPInfo::Fieldref(class_index, nat) => {
                    let (name, descriptor) = parsed.name_and_type(*nat)?;
                    let descriptor = FieldType::parse(descriptor)
                        .ok_or(ParseError::BadConstant(index, CPTag::Fieldref))?;
                    Some(Constant::Field(FieldSymRef {
                        class_index: *class_index,
                        name: name.to_string(),
                        descriptor,
                        resolved: Resolution::Unresolved,
                    }))
                }
                CPInfo::Methodref(class_index, nat) | CPInfo::InterfaceMethodref(class_index, nat) => {
                    let (name, descriptor) = parsed.name_and_type(*nat)?;
                    let descriptor = MethodDescriptor::parse(descriptor)
                        .ok_or(ParseError::BadConstant(index, CPTag::Methodref))?;
                    let sym = MethodSymRef {
                        class_index: *class_index,
                        name: name.to_string(),
                        descriptor,
                        resolved: Resolution::Unresolved,
                    };
                    Some(if matches!(entry, CPInfo::Methodref(..)) {
                        Constant::Method(sym)
                    } else {
                        Constant::InterfaceMethod(sym)
                    })
                }
                _ => None
            };
            entries.push(constant);
        }

        Ok(ConstantPool { entries })
    }
}

pub fn wrong_kind(index: u16, expected: &str, found: &Constant) -> VmError {
    VmError::internal(format!("constant {} is not a {} reference: {:?}", index, expected, found))
}

#[cfg(test)]
mod tests {
    use crate::class_parser::parse_class;
    use crate::vm::class::class::ClassRef;
    use crate::vm::class::constant_pool::{Constant, ConstantPool, Resolution};
    use crate::vm::class::field::FieldType;
    use crate::vm::error::{JavaErrorKind, VmError};
    use crate::vm::testing::ClassBuilder;

    #[test]
    fn typed_constants() {
        let mut builder = ClassBuilder::new("A", Some("java/lang/Object"));
        let int = builder.int(-5);
        let long = builder.long(1 << 40);
        let string = builder.string("hello");
        let field = builder.field_ref("B", "x", "[J");
        let parsed = parse_class(&builder.build()).unwrap();

        let pool = ConstantPool::from_parsed(&parsed).unwrap();
        assert_eq!(pool.get(int).unwrap(), &Constant::Integer(-5));
        assert_eq!(pool.get(long).unwrap(), &Constant::Long(1 << 40));
        assert!(pool.get(long + 1).unwrap_err().is_internal());
        assert_eq!(pool.get(string).unwrap(), &Constant::String("hello".to_string()));
        assert!(pool.get(0).is_err());

        match pool.get(field).unwrap() {
            Constant::Field(sym) => {
                assert_eq!(sym.name, "x");
                assert_eq!(sym.descriptor, FieldType::A(Box::new(FieldType::J)));
                assert_eq!(pool.class_name(sym.class_index).unwrap(), "B");
            }
            other => panic!("{:?}", other)
        }
    }

    #[test]
    fn failures_are_memoized() {
        let mut resolution: Resolution<ClassRef> = Resolution::Unresolved;
        assert!(resolution.get().is_none());

        resolution.record(&Err(VmError::internal("boom")));
        assert_eq!(resolution, Resolution::Unresolved);

        resolution.record(&Err(VmError::java(JavaErrorKind::IllegalAccessError, "A")));
        assert_eq!(resolution.get().unwrap().unwrap_err().kind(), Some(JavaErrorKind::IllegalAccessError));
    }
}
