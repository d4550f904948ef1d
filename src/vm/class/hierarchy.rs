use crate::vm::class::class::ClassRef;
use crate::vm::class::field::{FieldRef, FieldType};
use crate::vm::class::method::{MethodDescriptor, MethodRef};
use crate::vm::class_loader::ClassLoader;

/// Subtype tests and member lookup over the loaded class graph.
impl ClassLoader {
    /// Super classes of `class`, starting with the class itself.
    pub fn class_chain(&self, class: ClassRef) -> impl Iterator<Item = ClassRef> + '_ {
        std::iter::successors(Some(class), move |c| self[*c].super_class)
    }

    /// Strict subclass test.
    pub fn is_subclass_of(&self, class: ClassRef, other: ClassRef) -> bool {
        self.class_chain(class).skip(1).any(|c| c == other)
    }

    pub fn is_sub_interface_of(&self, iface: ClassRef, other: ClassRef) -> bool {
        self[iface].interfaces.iter().any(|i| *i == other || self.is_sub_interface_of(*i, other))
    }

    pub fn implements(&self, class: ClassRef, iface: ClassRef) -> bool {
        self.class_chain(class).any(|c| {
            self[c].interfaces.iter().any(|i| *i == iface || self.is_sub_interface_of(*i, iface))
        })
    }

    fn is_object(&self, class: ClassRef) -> bool {
        self[class].name == "java/lang/Object"
    }

    /// Whether a value of class `from` may be used where `to` is expected.
    pub fn is_assignable(&self, from: ClassRef, to: ClassRef) -> bool {
        if from == to {
            return true;
        }

        let (s, t) = (&self[from], &self[to]);
        if !s.is_array() {
            if !s.is_interface() {
                if !t.is_interface() {
                    self.is_subclass_of(from, to)
                } else {
                    self.implements(from, to)
                }
            } else if !t.is_interface() {
                self.is_object(to)
            } else {
                self.is_sub_interface_of(from, to)
            }
        } else if !t.is_array() {
            if !t.is_interface() {
                self.is_object(to)
            } else {
                t.name == "java/lang/Cloneable" || t.name == "java/io/Serializable"
            }
        } else {
            match (s.component_class, t.component_class) {
                (Some(sc), Some(tc)) => {
                    // primitive components only match themselves
                    !self[sc].is_primitive() && !self[tc].is_primitive() && self.is_assignable(sc, tc)
                }
                _ => false
            }
        }
    }

    pub fn is_same_package(&self, a: ClassRef, b: ClassRef) -> bool {
        self[a].package_name() == self[b].package_name()
    }

    pub fn is_class_accessible(&self, class: ClassRef, from: ClassRef) -> bool {
        self[class].is_public() || self.is_same_package(class, from)
    }

    /// Accessibility of a member with access flags `flag` declared by `owner`, seen from `from`.
    pub fn is_member_accessible(&self, flag: u16, owner: ClassRef, from: ClassRef) -> bool {
        const PUBLIC: u16 = 0x0001;
        const PRIVATE: u16 = 0x0002;
        const PROTECTED: u16 = 0x0004;

        if flag & PUBLIC != 0 {
            true
        } else if flag & PROTECTED != 0 {
            from == owner || self.is_subclass_of(from, owner) || self.is_same_package(owner, from)
        } else if flag & PRIVATE != 0 {
            from == owner
        } else {
            self.is_same_package(owner, from)
        }
    }

    pub fn lookup_method_in_class(&self, class: ClassRef, name: &str, descriptor: &MethodDescriptor)
        -> Option<MethodRef> {
        self.class_chain(class).find_map(|c| {
            self[c].find_method(name, descriptor).map(|index| MethodRef { class: c, index })
        })
    }

    /// Depth first search through `interfaces` and their super interfaces.
    pub fn lookup_method_in_interfaces(&self, interfaces: &[ClassRef], name: &str,
                                       descriptor: &MethodDescriptor) -> Option<MethodRef> {
        for iface in interfaces {
            if let Some(index) = self[*iface].find_method(name, descriptor) {
                return Some(MethodRef { class: *iface, index });
            }
            if let Some(m) = self.lookup_method_in_interfaces(&self[*iface].interfaces, name, descriptor) {
                return Some(m);
            }
        }
        None
    }

    /// Class chain first, then the interfaces of every class in it.
    pub fn lookup_method(&self, class: ClassRef, name: &str, descriptor: &MethodDescriptor) -> Option<MethodRef> {
        self.lookup_method_in_class(class, name, descriptor).or_else(|| {
            self.class_chain(class)
                .find_map(|c| self.lookup_method_in_interfaces(&self[c].interfaces, name, descriptor))
        })
    }

    fn lookup_field_in_interfaces(&self, interfaces: &[ClassRef], name: &str, descriptor: &FieldType)
        -> Option<FieldRef> {
        for iface in interfaces {
            if let Some(index) = self[*iface].find_field(name, descriptor) {
                return Some(FieldRef { class: *iface, index });
            }
            if let Some(f) = self.lookup_field_in_interfaces(&self[*iface].interfaces, name, descriptor) {
                return Some(f);
            }
        }
        None
    }

    /// Own fields, then the super class chain, then interfaces.
    pub fn lookup_field(&self, class: ClassRef, name: &str, descriptor: &FieldType) -> Option<FieldRef> {
        self.class_chain(class)
            .find_map(|c| self[c].find_field(name, descriptor).map(|index| FieldRef { class: c, index }))
            .or_else(|| self.class_chain(class)
                .find_map(|c| self.lookup_field_in_interfaces(&self[c].interfaces, name, descriptor)))
    }
}
