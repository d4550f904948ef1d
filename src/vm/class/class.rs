use crate::class_parser::constants::AccessFlagClass;
use crate::helper::{has_flag, package_name};
use crate::vm::class::constant_pool::ConstantPool;
use crate::vm::class::field::{Field, FieldType};
use crate::vm::class::method::{Method, MethodDescriptor};
use crate::vm::class::name_parsers::java_name;
use crate::vm::object::ObjectRef;
use crate::vm::thread::slot::Slots;

/// Handle of a class in the loader's arena
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassRef(pub(crate) u32);

impl ClassRef {
    /// Placeholder carried by members until their class is registered.
    pub(crate) const UNASSIGNED: ClassRef = ClassRef(u32::MAX);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Runtime representation of a class in the method area
#[derive(Debug, Clone)]
pub struct Class {
    pub flag: u16,
    pub name: String,
    pub super_name: Option<String>,
    pub interface_names: Vec<String>,
    pub constant_pool: ConstantPool,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub source_file: Option<String>,

    pub super_class: Option<ClassRef>,
    pub interfaces: Vec<ClassRef>,
    pub instance_slot_count: usize,
    pub static_slot_count: usize,
    pub static_vars: Slots,
    /// Set once `<clinit>` has been scheduled, never cleared.
    pub init_started: bool,
    /// Element class of an array class.
    pub component_class: Option<ClassRef>,
    /// The `java/lang/Class` instance standing for this class.
    pub mirror: Option<ObjectRef>,
}

impl Class {
    pub fn new(flag: u16, name: String, super_name: Option<String>, interface_names: Vec<String>) -> Class {
        Class {
            flag,
            name,
            super_name,
            interface_names,
            constant_pool: ConstantPool::default(),
            fields: vec![],
            methods: vec![],
            source_file: None,
            super_class: None,
            interfaces: vec![],
            instance_slot_count: 0,
            static_slot_count: 0,
            static_vars: Slots::default(),
            init_started: false,
            component_class: None,
            mirror: None,
        }
    }

    pub fn is_public(&self) -> bool {
        has_flag(self.flag, AccessFlagClass::ACC_PUBLIC)
    }

    pub fn is_interface(&self) -> bool {
        has_flag(self.flag, AccessFlagClass::ACC_INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        has_flag(self.flag, AccessFlagClass::ACC_ABSTRACT)
    }

    pub fn is_super(&self) -> bool {
        has_flag(self.flag, AccessFlagClass::ACC_SUPER)
    }

    pub fn is_array(&self) -> bool {
        self.name.starts_with('[')
    }

    pub fn is_primitive(&self) -> bool {
        FieldType::from_primitive_name(&self.name).is_some()
    }

    pub fn package_name(&self) -> &str {
        package_name(&self.name)
    }

    /// Dotted name, as used in messages and `Class.getName`.
    pub fn java_name(&self) -> String {
        java_name(&self.name)
    }

    /// Index of a method declared by this class itself.
    pub fn find_method(&self, name: &str, descriptor: &MethodDescriptor) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name && &m.descriptor == descriptor)
    }

    /// Index of a field declared by this class itself.
    pub fn find_field(&self, name: &str, descriptor: &FieldType) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name && &f.descriptor == descriptor)
    }

    pub fn clinit(&self) -> Option<usize> {
        self.methods.iter().position(Method::is_clinit)
    }

    pub fn main_method(&self) -> Option<usize> {
        self.methods.iter().position(|m| {
            m.name == "main" && m.is_static()
                && m.descriptor.ret == FieldType::V
                && m.descriptor.parameters == [FieldType::A(Box::new(FieldType::L("java/lang/String".to_string())))]
        })
    }
}
