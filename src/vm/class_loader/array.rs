use log::debug;
use crate::class_parser::constants::AccessFlagClass;
use crate::vm::class::class::{Class, ClassRef};
use crate::vm::class::name_parsers::{component_class_name, java_name};
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::vm::Vm;

const ARRAY_INTERFACES: [&str; 2] = ["java/lang/Cloneable", "java/io/Serializable"];

impl Vm {
    /// Array classes have no class file: they extend Object, implement Cloneable and
    /// Serializable and need no initialization.
    pub(crate) fn load_array_class(&mut self, name: &str) -> VmResult<ClassRef> {
        let component_name = component_class_name(name)
            .ok_or_else(|| VmError::java(JavaErrorKind::ClassNotFoundException, java_name(name)))?;
        let component = self.load_class(&component_name)?;

        let object = self.load_class("java/lang/Object")?;
        let mut interfaces = Vec::with_capacity(ARRAY_INTERFACES.len());
        for iface in ARRAY_INTERFACES {
            interfaces.push(self.load_class(iface)?);
        }

        // arrays are as visible as their element class
        let flag = if self.classes[component].is_public() { AccessFlagClass::ACC_PUBLIC as u16 } else { 0 };

        let mut class = Class::new(flag, name.to_string(), Some("java/lang/Object".to_string()),
                                   ARRAY_INTERFACES.iter().map(|s| s.to_string()).collect());
        class.super_class = Some(object);
        class.interfaces = interfaces;
        class.instance_slot_count = self.classes[object].instance_slot_count;
        class.component_class = Some(component);
        class.init_started = true;

        let class = self.classes.add(class);
        debug!("Created array class {}", name);
        self.attach_mirror(class);
        Ok(class)
    }

    pub(crate) fn load_primitive_class(&mut self, name: &str) -> VmResult<ClassRef> {
        let mut class = Class::new(AccessFlagClass::ACC_PUBLIC as u16, name.to_string(), None, vec![]);
        class.init_started = true;

        let class = self.classes.add(class);
        debug!("Created primitive class {}", name);
        self.attach_mirror(class);
        Ok(class)
    }
}

#[cfg(test)]
mod tests {
    use crate::vm::error::JavaErrorKind;
    use crate::vm::testing::{ClassBuilder, test_vm};

    #[test]
    fn array_visibility_follows_component() {
        let hidden = ClassBuilder::with_flags(0x0020, "pkg/Hidden", Some("java/lang/Object")).build();
        let mut vm = test_vm(vec![hidden]);

        let array = vm.load_class("[Lpkg/Hidden;").unwrap();
        assert!(!vm.classes[array].is_public());
        let ints = vm.load_class("[I").unwrap();
        assert!(vm.classes[ints].is_public());
        assert!(vm.classes[vm.classes[ints].component_class.unwrap()].is_primitive());
    }

    #[test]
    fn bad_array_names() {
        let mut vm = test_vm(vec![]);
        assert_eq!(vm.load_class("[Q").unwrap_err().kind(), Some(JavaErrorKind::ClassNotFoundException));
        assert_eq!(vm.load_class("[Lpkg/Nope;").unwrap_err().kind(), Some(JavaErrorKind::ClassNotFoundException));
    }
}
