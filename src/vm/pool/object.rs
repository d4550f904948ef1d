use std::ops::{Index, IndexMut};
use crate::vm::class::class::ClassRef;
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::object::{Extra, Object, ObjectData, ObjectRef};
use crate::vm::thread::slot::Slots;
use crate::vm::vm::Vm;

/// Heap of all objects. Nothing is ever freed, so an `ObjectRef` stays valid for the
/// lifetime of the VM.
#[derive(Debug, Default)]
pub struct ObjectArena {
    objects: Vec<Object>,
}

impl ObjectArena {
    pub fn alloc(&mut self, object: Object) -> ObjectRef {
        self.objects.push(object);
        ObjectRef((self.objects.len() - 1) as u32)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Index<ObjectRef> for ObjectArena {
    type Output = Object;

    fn index(&self, index: ObjectRef) -> &Object {
        &self.objects[index.index()]
    }
}

impl IndexMut<ObjectRef> for ObjectArena {
    fn index_mut(&mut self, index: ObjectRef) -> &mut Object {
        &mut self.objects[index.index()]
    }
}

impl Vm {
    pub fn new_object(&mut self, class: ClassRef) -> ObjectRef {
        let slots = self.classes[class].instance_slot_count;
        self.heap.alloc(Object {
            class,
            data: ObjectData::Fields(Slots::new(slots)),
            extra: Extra::None,
        })
    }

    /// Allocates a zeroed array of the given array class.
    pub fn new_array(&mut self, array_class: ClassRef, length: i32) -> VmResult<ObjectRef> {
        if length < 0 {
            return Err(VmError::java(JavaErrorKind::NegativeArraySizeException, length.to_string()));
        }
        let len = length as usize;

        let data = match self.classes[array_class].name.as_bytes() {
            [b'[', b'Z'] | [b'[', b'B'] => ObjectData::Bytes(vec![0; len]),
            [b'[', b'C'] => ObjectData::Chars(vec![0; len]),
            [b'[', b'S'] => ObjectData::Shorts(vec![0; len]),
            [b'[', b'I'] => ObjectData::Ints(vec![0; len]),
            [b'[', b'J'] => ObjectData::Longs(vec![0; len]),
            [b'[', b'F'] => ObjectData::Floats(vec![0.0; len]),
            [b'[', b'D'] => ObjectData::Doubles(vec![0.0; len]),
            [b'[', ..] => ObjectData::Refs(vec![None; len]),
            _ => return Err(VmError::internal(format!("{} is not an array class", self.classes[array_class].name)))
        };

        Ok(self.heap.alloc(Object { class: array_class, data, extra: Extra::None }))
    }

    /// Array of references from already allocated objects, e.g. `String[]` for `main`.
    pub fn new_ref_array(&mut self, array_class: ClassRef, values: Vec<Option<ObjectRef>>) -> ObjectRef {
        self.heap.alloc(Object { class: array_class, data: ObjectData::Refs(values), extra: Extra::None })
    }

    pub fn array_length(&self, array: ObjectRef) -> VmResult<usize> {
        self.heap[array].data.array_length()
            .ok_or_else(|| VmError::internal("arraylength on a non array object"))
    }
}
