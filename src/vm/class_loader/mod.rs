use std::collections::HashMap;
use std::ops::{Index, IndexMut};
use crate::classpath::ClassSource;
use crate::vm::class::class::{Class, ClassRef};
use crate::vm::class::field::{Field, FieldRef};
use crate::vm::class::method::{Method, MethodRef};

pub mod bootstrap;
pub mod array;
pub mod resolve;
pub mod init;
pub mod native;

/// Bootstrap class loader: owns every class of the VM, addressed by `ClassRef`.
pub struct ClassLoader {
    classes: Vec<Class>,
    by_name: HashMap<String, ClassRef>,
    /// Names currently being defined, to detect circular super types.
    loading: Vec<String>,
    classpath: Box<dyn ClassSource>,
}

impl ClassLoader {
    pub fn new(classpath: Box<dyn ClassSource>) -> ClassLoader {
        ClassLoader {
            classes: vec![],
            by_name: HashMap::new(),
            loading: vec![],
            classpath,
        }
    }

    pub fn find(&self, name: &str) -> Option<ClassRef> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn refs(&self) -> impl Iterator<Item = ClassRef> {
        (0..self.classes.len() as u32).map(ClassRef)
    }

    pub fn classpath(&self) -> &dyn ClassSource {
        self.classpath.as_ref()
    }

    /// Registers a fully linked class and hands its members their owner.
    pub(crate) fn add(&mut self, mut class: Class) -> ClassRef {
        let class_ref = ClassRef(self.classes.len() as u32);
        for f in &mut class.fields {
            f.class = class_ref;
        }
        for m in &mut class.methods {
            m.class = class_ref;
        }

        self.by_name.insert(class.name.clone(), class_ref);
        self.classes.push(class);
        class_ref
    }

    pub(crate) fn begin_loading(&mut self, name: &str) -> bool {
        if self.loading.iter().any(|n| n == name) {
            return false;
        }
        self.loading.push(name.to_string());
        true
    }

    pub(crate) fn end_loading(&mut self, name: &str) {
        self.loading.retain(|n| n != name);
    }

    pub fn method(&self, method: MethodRef) -> &Method {
        &self[method.class].methods[method.index]
    }

    pub fn method_mut(&mut self, method: MethodRef) -> &mut Method {
        &mut self[method.class].methods[method.index]
    }

    pub fn field(&self, field: FieldRef) -> &Field {
        &self[field.class].fields[field.index]
    }
}

impl Index<ClassRef> for ClassLoader {
    type Output = Class;

    fn index(&self, index: ClassRef) -> &Class {
        &self.classes[index.index()]
    }
}

impl IndexMut<ClassRef> for ClassLoader {
    fn index_mut(&mut self, index: ClassRef) -> &mut Class {
        &mut self.classes[index.index()]
    }
}
