use log::debug;
use crate::vm::class::class::ClassRef;
use crate::vm::class::constant_pool::{Constant, wrong_kind};
use crate::vm::class::field::FieldRef;
use crate::vm::class::method::{MethodDescriptor, MethodRef};
use crate::vm::class::name_parsers::java_name;
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::vm::Vm;

/// Symbolic reference resolution. Every reference is resolved at most once per constant pool
/// entry: later calls return the memoized class/member (or the memoized failure) without
/// repeating lookup or access checks.
impl Vm {
    pub fn resolve_class(&mut self, current: ClassRef, index: u16) -> VmResult<ClassRef> {
        let name = match self.classes[current].constant_pool.get(index)? {
            Constant::Class(sym) => match sym.resolved.get() {
                Some(result) => return result,
                None => sym.name.clone()
            },
            other => return Err(wrong_kind(index, "class", other))
        };

        let result = self.load_class(&name).and_then(|class| {
            if self.classes.is_class_accessible(class, current) {
                Ok(class)
            } else {
                Err(VmError::java(JavaErrorKind::IllegalAccessError,
                                  format!("{} cannot access {}", self.classes[current].java_name(), java_name(&name))))
            }
        });
        debug!("Resolved class {} from {}: {:?}", name, self.classes[current].name, result);

        if let Constant::Class(sym) = self.classes[current].constant_pool.get_mut(index)? {
            sym.resolved.record(&result);
        }
        result
    }

    pub fn resolve_field(&mut self, current: ClassRef, index: u16) -> VmResult<FieldRef> {
        let (class_index, name, descriptor) = match self.classes[current].constant_pool.get(index)? {
            Constant::Field(sym) => match sym.resolved.get() {
                Some(result) => return result,
                None => (sym.class_index, sym.name.clone(), sym.descriptor.clone())
            },
            other => return Err(wrong_kind(index, "field", other))
        };

        let result = self.resolve_class(current, class_index).and_then(|class| {
            let field = self.classes.lookup_field(class, &name, &descriptor)
                .ok_or_else(|| VmError::java(JavaErrorKind::NoSuchFieldError, name.clone()))?;

            let f = self.classes.field(field);
            if !self.classes.is_member_accessible(f.flag, f.class, current) {
                return Err(VmError::java(JavaErrorKind::IllegalAccessError,
                                         format!("{}.{}", self.classes[f.class].java_name(), name)));
            }
            Ok(field)
        });
        debug!("Resolved field {}:{} from {}: {:?}", name, descriptor, self.classes[current].name, result);

        if let Constant::Field(sym) = self.classes[current].constant_pool.get_mut(index)? {
            sym.resolved.record(&result);
        }
        result
    }

    /// Resolves a method reference. Interface method constants are accepted too, as
    /// `invokestatic` and `invokespecial` may name either kind.
    pub fn resolve_method(&mut self, current: ClassRef, index: u16) -> VmResult<MethodRef> {
        let (class_index, name, descriptor) = match self.classes[current].constant_pool.get(index)? {
            Constant::InterfaceMethod(_) => return self.resolve_interface_method(current, index),
            Constant::Method(sym) => match sym.resolved.get() {
                Some(result) => return result,
                None => (sym.class_index, sym.name.clone(), sym.descriptor.clone())
            },
            other => return Err(wrong_kind(index, "method", other))
        };

        let result = self.resolve_class(current, class_index).and_then(|class| {
            if self.classes[class].is_interface() {
                return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                         format!("{} is an interface", self.classes[class].java_name())));
            }

            let method = self.classes.lookup_method(class, &name, &descriptor)
                .ok_or_else(|| no_such_method(&self.classes[class].java_name(), &name, &descriptor))?;
            self.check_method_access(method, current)?;
            Ok(method)
        });
        debug!("Resolved method {}{} from {}: {:?}", name, descriptor, self.classes[current].name, result);

        if let Constant::Method(sym) = self.classes[current].constant_pool.get_mut(index)? {
            sym.resolved.record(&result);
        }
        result
    }

    pub fn resolve_interface_method(&mut self, current: ClassRef, index: u16) -> VmResult<MethodRef> {
        let (class_index, name, descriptor) = match self.classes[current].constant_pool.get(index)? {
            Constant::InterfaceMethod(sym) => match sym.resolved.get() {
                Some(result) => return result,
                None => (sym.class_index, sym.name.clone(), sym.descriptor.clone())
            },
            other => return Err(wrong_kind(index, "interface method", other))
        };

        let result = self.resolve_class(current, class_index).and_then(|iface| {
            if !self.classes[iface].is_interface() {
                return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                         format!("{} is not an interface", self.classes[iface].java_name())));
            }

            let method = self.classes[iface].find_method(&name, &descriptor)
                .map(|index| MethodRef { class: iface, index })
                .or_else(|| self.classes.lookup_method_in_interfaces(&self.classes[iface].interfaces, &name, &descriptor))
                .ok_or_else(|| no_such_method(&self.classes[iface].java_name(), &name, &descriptor))?;
            self.check_method_access(method, current)?;
            Ok(method)
        });
        debug!("Resolved interface method {}{} from {}: {:?}", name, descriptor, self.classes[current].name, result);

        if let Constant::InterfaceMethod(sym) = self.classes[current].constant_pool.get_mut(index)? {
            sym.resolved.record(&result);
        }
        result
    }

    /// The class named by the `class_index` of a method or interface method constant.
    pub fn resolve_method_class(&mut self, current: ClassRef, index: u16) -> VmResult<ClassRef> {
        let class_index = match self.classes[current].constant_pool.get(index)? {
            Constant::Method(sym) | Constant::InterfaceMethod(sym) => sym.class_index,
            other => return Err(wrong_kind(index, "method", other))
        };
        self.resolve_class(current, class_index)
    }

    fn check_method_access(&self, method: MethodRef, current: ClassRef) -> VmResult<()> {
        let m = self.classes.method(method);
        if self.classes.is_member_accessible(m.flag, method.class, current) {
            Ok(())
        } else {
            Err(VmError::java(JavaErrorKind::IllegalAccessError,
                              format!("{}.{}{}", self.classes[method.class].java_name(), m.name, m.descriptor)))
        }
    }
}

fn no_such_method(class: &str, name: &str, descriptor: &MethodDescriptor) -> VmError {
    VmError::java(JavaErrorKind::NoSuchMethodError, format!("{}.{}{}", class, name, descriptor))
}

#[cfg(test)]
mod tests {
    use crate::vm::class::method::MethodRef;
    use crate::vm::error::JavaErrorKind;
    use crate::vm::testing::{ClassBuilder, test_vm};

    fn library() -> Vec<u8> {
        let mut lib = ClassBuilder::new("lib/Lib", Some("java/lang/Object"));
        lib.field(0x0002, "secret", "I");
        lib.field(0x0001, "open", "J");
        lib.method(0x0009, "util", "(JI)I", 2, 3, vec![0x03, 0xac]);
        lib.method(0x000a, "hidden", "()V", 0, 0, vec![0xb1]);
        lib.build()
    }

    #[test]
    fn method_resolution_is_memoized() {
        let mut user = ClassBuilder::new("app/User", Some("java/lang/Object"));
        let util = user.method_ref("lib/Lib", "util", "(JI)I");
        let mut vm = test_vm(vec![library(), user.build()]);
        let user = vm.load_class("app/User").unwrap();

        let first = vm.resolve_method(user, util).unwrap();
        assert_eq!(vm.classes.method(first).name, "util");

        // Making the target private afterwards is not observed: no second access check.
        vm.classes.method_mut(first).flag = 0x000a;
        assert_eq!(vm.resolve_method(user, util).unwrap(), first);

        // A fresh reference to the same method does see the change.
        let lib = vm.classes.find("lib/Lib").unwrap();
        assert!(!vm.classes.is_member_accessible(vm.classes.method(first).flag, lib, user));
    }

    #[test]
    fn failures_are_permanent() {
        let mut user = ClassBuilder::new("app/User", Some("java/lang/Object"));
        let hidden = user.method_ref("lib/Lib", "hidden", "()V");
        let missing = user.field_ref("lib/Lib", "missing", "I");
        let secret = user.field_ref("lib/Lib", "secret", "I");
        let open = user.field_ref("lib/Lib", "open", "J");
        let mut vm = test_vm(vec![library(), user.build()]);
        let user = vm.load_class("app/User").unwrap();

        assert_eq!(vm.resolve_method(user, hidden).unwrap_err().kind(), Some(JavaErrorKind::IllegalAccessError));
        let m = MethodRef { class: vm.classes.find("lib/Lib").unwrap(), index: 1 };
        vm.classes.method_mut(m).flag = 0x0009;
        assert_eq!(vm.resolve_method(user, hidden).unwrap_err().kind(), Some(JavaErrorKind::IllegalAccessError));

        assert_eq!(vm.resolve_field(user, missing).unwrap_err().kind(), Some(JavaErrorKind::NoSuchFieldError));
        assert_eq!(vm.resolve_field(user, secret).unwrap_err().kind(), Some(JavaErrorKind::IllegalAccessError));
        let field = vm.resolve_field(user, open).unwrap();
        assert_eq!(vm.classes.field(field).slot_id, 1);
    }

    #[test]
    fn interface_mismatch() {
        let mut iface = ClassBuilder::interface_class("lib/Shape");
        iface.method(0x0401, "area", "()I", 0, 0, vec![]);
        let mut user = ClassBuilder::new("app/User", Some("java/lang/Object"));
        let as_method = user.method_ref("lib/Shape", "area", "()I");
        let as_iface_method = user.interface_method_ref("lib/Shape", "area", "()I");
        let on_class = user.interface_method_ref("java/lang/Object", "hashCode", "()I");
        let mut vm = test_vm(vec![iface.build(), user.build()]);
        let user = vm.load_class("app/User").unwrap();

        assert_eq!(vm.resolve_method(user, as_method).unwrap_err().kind(),
                   Some(JavaErrorKind::IncompatibleClassChangeError));
        assert!(vm.resolve_interface_method(user, as_iface_method).is_ok());
        assert_eq!(vm.resolve_interface_method(user, on_class).unwrap_err().kind(),
                   Some(JavaErrorKind::IncompatibleClassChangeError));
    }

    #[test]
    fn inaccessible_class() {
        let hidden = ClassBuilder::with_flags(0x0020, "lib/Hidden", Some("java/lang/Object")).build();
        let mut user = ClassBuilder::new("app/User", Some("java/lang/Object"));
        let class = user.class_ref("lib/Hidden");
        let mut vm = test_vm(vec![hidden, user.build()]);
        let user = vm.load_class("app/User").unwrap();

        assert_eq!(vm.resolve_class(user, class).unwrap_err().kind(), Some(JavaErrorKind::IllegalAccessError));
        assert!(vm.resolve_field(user, class).unwrap_err().is_internal());
    }
}
