use std::collections::HashMap;
use log::trace;
use crate::vm::class::field::FieldType;
use crate::vm::error::{VmError, VmResult};
use crate::vm::object::{Extra, Object, ObjectData, ObjectRef};
use crate::vm::vm::Vm;

const STRING_CLASS: &str = "java/lang/String";

/// Intern table for `java/lang/String` objects.
#[derive(Debug, Default)]
pub struct StringPool {
    interned: HashMap<String, ObjectRef>,
}

impl StringPool {
    pub fn get(&self, value: &str) -> Option<ObjectRef> {
        self.interned.get(value).copied()
    }

    pub fn insert(&mut self, value: String, string: ObjectRef) {
        self.interned.insert(value, string);
    }

    pub fn len(&self) -> usize {
        self.interned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interned.is_empty()
    }
}

fn value_field() -> FieldType {
    FieldType::A(Box::new(FieldType::C))
}

impl Vm {
    /// Allocates a new, not interned String holding `value` as UTF-16 chars.
    pub fn new_string(&mut self, value: &str) -> VmResult<ObjectRef> {
        let string_class = self.load_class(STRING_CLASS)?;
        let char_array_class = self.load_class("[C")?;

        let chars = self.heap.alloc(Object {
            class: char_array_class,
            data: ObjectData::Chars(value.encode_utf16().collect()),
            extra: Extra::None,
        });

        let field = self.classes.lookup_field(string_class, "value", &value_field())
            .ok_or_else(|| VmError::internal("java/lang/String has no value field"))?;
        let slot_id = self.classes.field(field).slot_id;

        let string = self.new_object(string_class);
        self.heap[string].fields_mut()?.set_ref(slot_id, Some(chars))?;
        Ok(string)
    }

    pub fn intern_string(&mut self, value: &str) -> VmResult<ObjectRef> {
        if let Some(string) = self.strings.get(value) {
            return Ok(string);
        }

        let string = self.new_string(value)?;
        trace!("Interned string {:?}", value);
        self.strings.insert(value.to_string(), string);
        Ok(string)
    }

    /// `String.intern` on an existing object: returns the canonical instance, which is the
    /// object itself if its value was not interned yet.
    pub fn intern_object(&mut self, string: ObjectRef) -> VmResult<ObjectRef> {
        let value = self.rust_string(string)?;
        match self.strings.get(&value) {
            Some(interned) => Ok(interned),
            None => {
                self.strings.insert(value, string);
                Ok(string)
            }
        }
    }

    pub fn rust_string(&self, string: ObjectRef) -> VmResult<String> {
        let class = self.heap[string].class;
        let field = self.classes.lookup_field(class, "value", &value_field())
            .ok_or_else(|| VmError::internal(format!("{} is not a string", self.classes[class].name)))?;
        let slot_id = self.classes.field(field).slot_id;

        match self.heap[string].fields()?.get_ref(slot_id)? {
            None => Ok(String::new()),
            Some(chars) => match &self.heap[chars].data {
                ObjectData::Chars(chars) => Ok(String::from_utf16_lossy(chars)),
                _ => Err(VmError::internal("string value is not a char array"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::vm::testing::test_vm;

    #[test]
    fn interning() {
        let mut vm = test_vm(vec![]);
        let a = vm.intern_string("h\u{e9}llo \u{1f600}").unwrap();
        let b = vm.intern_string("h\u{e9}llo \u{1f600}").unwrap();
        assert_eq!(a, b);
        assert_eq!(vm.rust_string(a).unwrap(), "h\u{e9}llo \u{1f600}");

        let fresh = vm.new_string("other").unwrap();
        assert_eq!(vm.intern_object(fresh).unwrap(), fresh);
        let again = vm.new_string("other").unwrap();
        assert_eq!(vm.intern_object(again).unwrap(), fresh);

        let copy = vm.new_string("h\u{e9}llo \u{1f600}").unwrap();
        assert_ne!(copy, a);
        assert_eq!(vm.intern_object(copy).unwrap(), a);
    }
}
