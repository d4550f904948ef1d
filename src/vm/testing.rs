//! Class file writer and in-memory class path used by the unit tests.

use std::collections::HashMap;
use crate::class_parser::parse_class;
use crate::classpath::{ClassSource, ClasspathError};
use crate::vm::class::method::{MethodDescriptor, MethodRef};
use crate::vm::thread::slot::Slot;
use crate::vm::thread::thread::ThreadStatus;
use crate::vm::vm::{Vm, VmOptions};

const OBJECT: &str = "java/lang/Object";

struct FieldDef {
    flags: u16,
    name: u16,
    descriptor: u16,
    constant_value: Option<u16>,
}

struct CodeDef {
    max_stack: u16,
    max_locals: u16,
    code: Vec<u8>,
    handlers: Vec<[u16; 4]>,
    line_numbers: Vec<(u16, u16)>,
}

struct MethodDef {
    flags: u16,
    name: String,
    name_index: u16,
    descriptor: u16,
    code: Option<CodeDef>,
}

/// Assembles a version 52 class file. Constant pool entries are shared between equal
/// constants, and every helper returns the pool index of its entry.
pub struct ClassBuilder {
    flags: u16,
    super_name: Option<String>,
    this_class: u16,
    super_class: u16,
    pool: Vec<Vec<u8>>,
    pool_indices: HashMap<Vec<u8>, u16>,
    next_index: u16,
    interfaces: Vec<u16>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    source_file: Option<(u16, u16)>,
}

impl ClassBuilder {
    pub fn new(name: &str, super_name: Option<&str>) -> ClassBuilder {
        ClassBuilder::with_flags(0x0021, name, super_name)
    }

    pub fn interface_class(name: &str) -> ClassBuilder {
        ClassBuilder::with_flags(0x0601, name, Some(OBJECT))
    }

    pub fn with_flags(flags: u16, name: &str, super_name: Option<&str>) -> ClassBuilder {
        let mut builder = ClassBuilder {
            flags,
            super_name: super_name.map(str::to_string),
            this_class: 0,
            super_class: 0,
            pool: vec![],
            pool_indices: HashMap::new(),
            next_index: 1,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            source_file: None,
        };
        builder.this_class = builder.class_ref(name);
        if let Some(super_name) = super_name {
            builder.super_class = builder.class_ref(super_name);
        }
        builder
    }

    fn entry(&mut self, bytes: Vec<u8>, width: u16) -> u16 {
        if let Some(index) = self.pool_indices.get(&bytes) {
            return *index;
        }
        let index = self.next_index;
        self.next_index += width;
        self.pool_indices.insert(bytes.clone(), index);
        self.pool.push(bytes);
        index
    }

    fn tagged(tag: u8, parts: &[u16]) -> Vec<u8> {
        let mut bytes = vec![tag];
        for part in parts {
            bytes.extend_from_slice(&part.to_be_bytes());
        }
        bytes
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        bytes.extend_from_slice(value.as_bytes());
        self.entry(bytes, 1)
    }

    pub fn class_ref(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.entry(Self::tagged(7, &[name]), 1)
    }

    pub fn string(&mut self, value: &str) -> u16 {
        let value = self.utf8(value);
        self.entry(Self::tagged(8, &[value]), 1)
    }

    pub fn int(&mut self, value: i32) -> u16 {
        let mut bytes = vec![3];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.entry(bytes, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut bytes = vec![5];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.entry(bytes, 2)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.entry(Self::tagged(12, &[name, descriptor]), 1)
    }

    fn member_ref(&mut self, tag: u8, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class_ref(class);
        let name_and_type = self.name_and_type(name, descriptor);
        self.entry(Self::tagged(tag, &[class, name_and_type]), 1)
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(9, class, name, descriptor)
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(10, class, name, descriptor)
    }

    pub fn interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(11, class, name, descriptor)
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.class_ref(name);
        self.interfaces.push(index);
        self
    }

    pub fn field(&mut self, flags: u16, name: &str, descriptor: &str) -> &mut Self {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.fields.push(FieldDef { flags, name, descriptor, constant_value: None });
        self
    }

    /// A `static final` field initialized from a ConstantValue attribute.
    pub fn static_const(&mut self, name: &str, descriptor: &str, value: impl FnOnce(&mut ClassBuilder) -> u16)
        -> &mut Self {
        self.utf8("ConstantValue");
        let value = value(self);
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.fields.push(FieldDef { flags: 0x0018, name, descriptor, constant_value: Some(value) });
        self
    }

    pub fn static_const_int(&mut self, name: &str, value: i32) -> &mut Self {
        self.static_const(name, "I", |b| b.int(value))
    }

    /// Abstract and native methods given no code get no Code attribute.
    pub fn method(&mut self, flags: u16, name: &str, descriptor: &str, max_stack: u16, max_locals: u16,
                  code: Vec<u8>) -> &mut Self {
        let code = if code.is_empty() && flags & 0x0500 != 0 {
            None
        } else {
            self.utf8("Code");
            Some(CodeDef { max_stack, max_locals, code, handlers: vec![], line_numbers: vec![] })
        };
        let name_index = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.methods.push(MethodDef { flags, name: name.to_string(), name_index, descriptor, code });
        self
    }

    pub fn native_method(&mut self, flags: u16, name: &str, descriptor: &str) -> &mut Self {
        self.method(flags | 0x0100, name, descriptor, 0, 0, vec![])
    }

    /// `<init>()V` calling the super class constructor.
    pub fn default_constructor(&mut self) -> &mut Self {
        let super_name = self.super_name.clone().unwrap_or_else(|| OBJECT.to_string());
        let init = self.method_ref(&super_name, "<init>", "()V");
        self.method(0x0001, "<init>", "()V", 1, 1, vec![0x2a, 0xb7, (init >> 8) as u8, init as u8, 0xb1])
    }

    fn code_of(&mut self, method: &str) -> &mut CodeDef {
        self.methods.iter_mut()
            .filter(|m| m.name == method)
            .find_map(|m| m.code.as_mut())
            .unwrap_or_else(|| panic!("no method {} with code", method))
    }

    pub fn handler(&mut self, method: &str, start_pc: u16, end_pc: u16, handler_pc: u16, catch_type: Option<u16>)
        -> &mut Self {
        self.code_of(method).handlers.push([start_pc, end_pc, handler_pc, catch_type.unwrap_or(0)]);
        self
    }

    pub fn line_numbers(&mut self, method: &str, entries: Vec<(u16, u16)>) -> &mut Self {
        self.utf8("LineNumberTable");
        self.code_of(method).line_numbers = entries;
        self
    }

    pub fn source_file(&mut self, name: &str) -> &mut Self {
        let attribute = self.utf8("SourceFile");
        let name = self.utf8(name);
        self.source_file = Some((attribute, name));
        self
    }

    fn index_of(&self, utf8: &str) -> u16 {
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(utf8.len() as u16).to_be_bytes());
        bytes.extend_from_slice(utf8.as_bytes());
        self.pool_indices[&bytes]
    }

    fn code_attribute(&self, code: &CodeDef) -> Vec<u8> {
        let mut body = vec![];
        body.extend_from_slice(&code.max_stack.to_be_bytes());
        body.extend_from_slice(&code.max_locals.to_be_bytes());
        body.extend_from_slice(&(code.code.len() as u32).to_be_bytes());
        body.extend_from_slice(&code.code);
        body.extend_from_slice(&(code.handlers.len() as u16).to_be_bytes());
        for handler in &code.handlers {
            for part in handler {
                body.extend_from_slice(&part.to_be_bytes());
            }
        }

        if code.line_numbers.is_empty() {
            body.extend_from_slice(&0u16.to_be_bytes());
        } else {
            body.extend_from_slice(&1u16.to_be_bytes());
            body.extend_from_slice(&self.index_of("LineNumberTable").to_be_bytes());
            body.extend_from_slice(&(2 + 4 * code.line_numbers.len() as u32).to_be_bytes());
            body.extend_from_slice(&(code.line_numbers.len() as u16).to_be_bytes());
            for (start_pc, line) in &code.line_numbers {
                body.extend_from_slice(&start_pc.to_be_bytes());
                body.extend_from_slice(&line.to_be_bytes());
            }
        }

        let mut attribute = vec![];
        attribute.extend_from_slice(&self.index_of("Code").to_be_bytes());
        attribute.extend_from_slice(&(body.len() as u32).to_be_bytes());
        attribute.extend(body);
        attribute
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 52];
        out.extend_from_slice(&self.next_index.to_be_bytes());
        for entry in &self.pool {
            out.extend_from_slice(entry);
        }

        for value in [self.flags, self.this_class, self.super_class, self.interfaces.len() as u16] {
            out.extend_from_slice(&value.to_be_bytes());
        }
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }

        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            for value in [field.flags, field.name, field.descriptor] {
                out.extend_from_slice(&value.to_be_bytes());
            }
            match field.constant_value {
                Some(value) => {
                    out.extend_from_slice(&1u16.to_be_bytes());
                    out.extend_from_slice(&self.index_of("ConstantValue").to_be_bytes());
                    out.extend_from_slice(&2u32.to_be_bytes());
                    out.extend_from_slice(&value.to_be_bytes());
                }
                None => out.extend_from_slice(&0u16.to_be_bytes())
            }
        }

        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            for value in [method.flags, method.name_index, method.descriptor] {
                out.extend_from_slice(&value.to_be_bytes());
            }
            match &method.code {
                Some(code) => {
                    out.extend_from_slice(&1u16.to_be_bytes());
                    out.extend(self.code_attribute(code));
                }
                None => out.extend_from_slice(&0u16.to_be_bytes())
            }
        }

        match self.source_file {
            Some((attribute, name)) => {
                out.extend_from_slice(&1u16.to_be_bytes());
                out.extend_from_slice(&attribute.to_be_bytes());
                out.extend_from_slice(&2u32.to_be_bytes());
                out.extend_from_slice(&name.to_be_bytes());
            }
            None => out.extend_from_slice(&0u16.to_be_bytes())
        }
        out
    }
}

/// Class files keyed by `name.class`.
#[derive(Default)]
pub struct MemoryClassPath {
    classes: HashMap<String, Vec<u8>>,
}

impl MemoryClassPath {
    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) {
        self.classes.insert(format!("{}.class", name), bytes);
    }
}

impl ClassSource for MemoryClassPath {
    fn read_class(&self, file_name: &str) -> Result<(Vec<u8>, String), ClasspathError> {
        self.classes.get(file_name)
            .map(|bytes| (bytes.clone(), "memory".to_string()))
            .ok_or_else(|| ClasspathError::NotFound(file_name.to_string()))
    }
}

/// `<init>()V` and `<init>(Ljava/lang/String;)V`, both delegating to the super class.
fn throwable_subclass(name: &str, super_name: &str) -> Vec<u8> {
    let mut class = ClassBuilder::new(name, Some(super_name));
    let init = class.method_ref(super_name, "<init>", "()V");
    let init_message = class.method_ref(super_name, "<init>", "(Ljava/lang/String;)V");
    class.method(0x0001, "<init>", "()V", 1, 1, vec![0x2a, 0xb7, (init >> 8) as u8, init as u8, 0xb1]);
    class.method(0x0001, "<init>", "(Ljava/lang/String;)V", 2, 2, vec![
        0x2a, 0x2b, 0xb7, (init_message >> 8) as u8, init_message as u8, 0xb1,
    ]);
    class.build()
}

fn throwable() -> Vec<u8> {
    let mut class = ClassBuilder::new("java/lang/Throwable", Some(OBJECT));
    class.interface("java/io/Serializable");
    class.field(0x0002, "detailMessage", "Ljava/lang/String;");
    let init = class.method_ref(OBJECT, "<init>", "()V");
    let message = class.field_ref("java/lang/Throwable", "detailMessage", "Ljava/lang/String;");
    let fill = class.method_ref("java/lang/Throwable", "fillInStackTrace", "()Ljava/lang/Throwable;");
    let fill_native = class.method_ref("java/lang/Throwable", "fillInStackTrace", "(I)Ljava/lang/Throwable;");

    class.method(0x0001, "<init>", "()V", 1, 1, vec![
        0x2a, 0xb7, (init >> 8) as u8, init as u8,
        0x2a, 0xb6, (fill >> 8) as u8, fill as u8, 0x57, 0xb1,
    ]);
    class.method(0x0001, "<init>", "(Ljava/lang/String;)V", 2, 2, vec![
        0x2a, 0xb7, (init >> 8) as u8, init as u8,
        0x2a, 0x2b, 0xb5, (message >> 8) as u8, message as u8,
        0x2a, 0xb6, (fill >> 8) as u8, fill as u8, 0x57, 0xb1,
    ]);
    class.method(0x0021, "fillInStackTrace", "()Ljava/lang/Throwable;", 2, 1, vec![
        0x2a, 0x03, 0xb7, (fill_native >> 8) as u8, fill_native as u8, 0xb0,
    ]);
    class.native_method(0x0002, "fillInStackTrace", "(I)Ljava/lang/Throwable;");
    class.build()
}

/// Just enough of the Java class library for the interpreter tests.
fn bootstrap_classes() -> Vec<(&'static str, Vec<u8>)> {
    let mut object = ClassBuilder::new(OBJECT, None);
    object.method(0x0001, "<init>", "()V", 0, 1, vec![0xb1]);
    object.native_method(0x0001, "hashCode", "()I");
    object.native_method(0x0011, "getClass", "()Ljava/lang/Class;");
    object.native_method(0x0004, "clone", "()Ljava/lang/Object;");

    let mut string = ClassBuilder::with_flags(0x0031, "java/lang/String", Some(OBJECT));
    string.interface("java/io/Serializable");
    string.field(0x0012, "value", "[C");
    string.native_method(0x0001, "intern", "()Ljava/lang/String;");

    let mut class = ClassBuilder::with_flags(0x0031, "java/lang/Class", Some(OBJECT));
    class.native_method(0x0002, "getName0", "()Ljava/lang/String;");

    let mut classes = vec![
        (OBJECT, object.build()),
        ("java/lang/Cloneable", ClassBuilder::interface_class("java/lang/Cloneable").build()),
        ("java/io/Serializable", ClassBuilder::interface_class("java/io/Serializable").build()),
        ("java/lang/String", string.build()),
        ("java/lang/Class", class.build()),
        ("java/lang/Throwable", throwable()),
    ];

    let hierarchy = [
        ("java/lang/Exception", "java/lang/Throwable"),
        ("java/lang/Error", "java/lang/Throwable"),
        ("java/lang/RuntimeException", "java/lang/Exception"),
        ("java/lang/NullPointerException", "java/lang/RuntimeException"),
        ("java/lang/ClassCastException", "java/lang/RuntimeException"),
        ("java/lang/NegativeArraySizeException", "java/lang/RuntimeException"),
        ("java/lang/IndexOutOfBoundsException", "java/lang/RuntimeException"),
        ("java/lang/ArrayIndexOutOfBoundsException", "java/lang/IndexOutOfBoundsException"),
        ("java/lang/ArrayStoreException", "java/lang/RuntimeException"),
        ("java/lang/ArithmeticException", "java/lang/RuntimeException"),
        ("java/lang/IllegalStateException", "java/lang/RuntimeException"),
        ("java/lang/IllegalArgumentException", "java/lang/RuntimeException"),
        ("java/lang/CloneNotSupportedException", "java/lang/Exception"),
        ("java/lang/ReflectiveOperationException", "java/lang/Exception"),
        ("java/lang/ClassNotFoundException", "java/lang/ReflectiveOperationException"),
        ("java/lang/LinkageError", "java/lang/Error"),
        ("java/lang/IncompatibleClassChangeError", "java/lang/LinkageError"),
        ("java/lang/NoSuchFieldError", "java/lang/IncompatibleClassChangeError"),
        ("java/lang/NoSuchMethodError", "java/lang/IncompatibleClassChangeError"),
        ("java/lang/IllegalAccessError", "java/lang/IncompatibleClassChangeError"),
        ("java/lang/AbstractMethodError", "java/lang/IncompatibleClassChangeError"),
        ("java/lang/InstantiationError", "java/lang/IncompatibleClassChangeError"),
        ("java/lang/ClassFormatError", "java/lang/LinkageError"),
        ("java/lang/ClassCircularityError", "java/lang/LinkageError"),
        ("java/lang/UnsatisfiedLinkError", "java/lang/LinkageError"),
        ("java/lang/VirtualMachineError", "java/lang/Error"),
        ("java/lang/StackOverflowError", "java/lang/VirtualMachineError"),
    ];
    classes.extend(hierarchy.iter().map(|(name, super_name)| (*name, throwable_subclass(name, super_name))));
    classes
}

/// A VM over the bootstrap classes plus `classes`, which replace bootstrap classes of the same name.
pub fn test_vm(classes: Vec<Vec<u8>>) -> Vm {
    let named: Vec<(String, Vec<u8>)> = classes.into_iter()
        .map(|bytes| (parse_class(&bytes).unwrap().class_name().unwrap().to_string(), bytes))
        .collect();
    test_vm_with_files(named.iter().map(|(name, bytes)| (name.as_str(), bytes.clone())).collect())
}

/// Like [`test_vm`], with the class names given so that malformed files can be supplied.
pub fn test_vm_with_files(files: Vec<(&str, Vec<u8>)>) -> Vm {
    let mut classpath = MemoryClassPath::default();
    for (name, bytes) in bootstrap_classes() {
        classpath.insert(name, bytes);
    }
    for (name, bytes) in files {
        classpath.insert(name, bytes);
    }

    let mut vm = Vm::new(Box::new(classpath), VmOptions::default());
    vm.load_basic_classes().unwrap();
    vm
}

impl Vm {
    /// Interprets the static method `class.name` on a fresh thread.
    pub fn run_static(&mut self, class: &str, name: &str, descriptor: &str, args: &[Slot]) -> ThreadStatus {
        let class = match self.load_class(class) {
            Ok(class) => class,
            Err(e) => return ThreadStatus::FAILED(e.to_string()),
        };
        let descriptor = MethodDescriptor::parse(descriptor).unwrap();
        let index = self.classes[class].find_method(name, &descriptor)
            .unwrap_or_else(|| panic!("no method {}{}", name, descriptor));
        self.interpret(MethodRef { class, index }, args)
    }
}
