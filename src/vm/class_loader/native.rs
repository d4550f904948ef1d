use std::collections::HashMap;
use log::debug;
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

/// Host implementation of a native method. It runs on the native method's own frame: the
/// arguments are its local variables and the return value (if any) is pushed on its operand
/// stack, from where the following return instruction hands it to the caller.
pub type NativeFnPtr = fn(&mut Vm, &mut VMThread) -> VmResult<()>;

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct NativeMethodRef {
    pub class_name: String,
    pub method_name: String,
    pub descriptor: String,
}

impl NativeMethodRef {
    pub fn new(class_name: &str, method_name: &str, descriptor: &str) -> NativeMethodRef {
        NativeMethodRef {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }
}

#[derive(Default)]
pub struct NativeRegistry {
    store: HashMap<NativeMethodRef, NativeFnPtr>,
}

fn no_op(_: &mut Vm, _: &mut VMThread) -> VmResult<()> {
    Ok(())
}

impl NativeRegistry {
    pub fn register(&mut self, class_name: &str, method_name: &str, descriptor: &str, f: NativeFnPtr) {
        self.store.insert(NativeMethodRef::new(class_name, method_name, descriptor), f);
    }

    /// `registerNatives()V` needs no registration: it is accepted as a no-op everywhere.
    pub fn find(&self, class_name: &str, method_name: &str, descriptor: &str) -> VmResult<NativeFnPtr> {
        let key = NativeMethodRef::new(class_name, method_name, descriptor);
        if let Some(f) = self.store.get(&key) {
            return Ok(*f);
        }
        if method_name == "registerNatives" && descriptor == "()V" {
            return Ok(no_op);
        }

        debug!("No native implementation for {}.{}{}", class_name, method_name, descriptor);
        Err(VmError::java(JavaErrorKind::UnsatisfiedLinkError,
                          format!("{}.{}{}", class_name.replace('/', "."), method_name, descriptor)))
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn register_defaults(&mut self) {
        self.register("java/lang/Object", "getClass", "()Ljava/lang/Class;", lang::object::get_class);
        self.register("java/lang/Object", "hashCode", "()I", lang::object::hash_code);
        self.register("java/lang/Object", "clone", "()Ljava/lang/Object;", lang::object::clone);

        self.register("java/lang/Class", "getPrimitiveClass", "(Ljava/lang/String;)Ljava/lang/Class;",
                      lang::class::get_primitive_class);
        self.register("java/lang/Class", "getName0", "()Ljava/lang/String;", lang::class::get_name0);
        self.register("java/lang/Class", "desiredAssertionStatus0", "(Ljava/lang/Class;)Z",
                      lang::class::desired_assertion_status0);

        self.register("java/lang/Float", "floatToRawIntBits", "(F)I", lang::copy_bits);
        self.register("java/lang/Float", "intBitsToFloat", "(I)F", lang::copy_bits);
        self.register("java/lang/Double", "doubleToRawLongBits", "(D)J", lang::copy_bits);
        self.register("java/lang/Double", "longBitsToDouble", "(J)D", lang::copy_bits);

        self.register("java/lang/String", "intern", "()Ljava/lang/String;", lang::intern);
        self.register("java/lang/System", "arraycopy", "(Ljava/lang/Object;ILjava/lang/Object;II)V",
                      lang::system::arraycopy);
        self.register("java/lang/Throwable", "fillInStackTrace", "(I)Ljava/lang/Throwable;",
                      lang::throwable::fill_in_stack_trace);

        self.register("sun/misc/VM", "initialize", "()V", no_op);
    }
}

mod lang {
    use crate::vm::error::{JavaErrorKind, VmError, VmResult};
    use crate::vm::thread::thread::VMThread;
    use crate::vm::vm::Vm;

    pub fn npe() -> VmError {
        VmError::java(JavaErrorKind::NullPointerException, "")
    }

    /// The raw bit conversions of Float and Double: slots already hold the bit pattern.
    pub fn copy_bits(_: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
        let frame = thread.current_frame_mut()?;
        for i in 0..frame.local_vars.len() {
            let slot = frame.local_vars.get(i)?;
            frame.stack.push_slot(slot)?;
        }
        Ok(())
    }

    pub fn intern(vm: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
        let frame = thread.current_frame_mut()?;
        let this = frame.local_vars.get_ref(0)?.ok_or_else(npe)?;
        let interned = vm.intern_object(this)?;
        frame.stack.push_ref(Some(interned))
    }

    pub mod object {
        use crate::vm::error::{JavaErrorKind, VmError, VmResult};
        use crate::vm::thread::thread::VMThread;
        use crate::vm::vm::Vm;
        use super::npe;

        pub fn get_class(vm: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            let this = frame.local_vars.get_ref(0)?.ok_or_else(npe)?;
            let mirror = vm.class_mirror(vm.heap[this].class)?;
            frame.stack.push_ref(Some(mirror))
        }

        pub fn hash_code(_: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            let this = frame.local_vars.get_ref(0)?.ok_or_else(npe)?;
            frame.stack.push_int(this.identity_hash())
        }

        pub fn clone(vm: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            let this = frame.local_vars.get_ref(0)?.ok_or_else(npe)?;

            let class = vm.heap[this].class;
            let cloneable = vm.load_class("java/lang/Cloneable")?;
            if !vm.classes.is_assignable(class, cloneable) {
                return Err(VmError::java(JavaErrorKind::CloneNotSupportedException, vm.classes[class].java_name()));
            }

            let copy = vm.heap[this].clone();
            let copy = vm.heap.alloc(copy);
            frame.stack.push_ref(Some(copy))
        }
    }

    pub mod class {
        use crate::vm::error::{VmError, VmResult};
        use crate::vm::thread::thread::VMThread;
        use crate::vm::vm::Vm;
        use super::npe;

        pub fn get_primitive_class(vm: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            let name = frame.local_vars.get_ref(0)?.ok_or_else(npe)?;
            let name = vm.rust_string(name)?;

            let class = vm.load_class(&name)?;
            let mirror = vm.class_mirror(class)?;
            frame.stack.push_ref(Some(mirror))
        }

        pub fn get_name0(vm: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            let this = frame.local_vars.get_ref(0)?.ok_or_else(npe)?;
            let class = vm.heap[this].mirrored_class()
                .ok_or_else(|| VmError::internal("getName0 on an object that is not a class mirror"))?;

            let name = vm.classes[class].java_name();
            let name = vm.intern_string(&name)?;
            frame.stack.push_ref(Some(name))
        }

        pub fn desired_assertion_status0(_: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
            thread.current_frame_mut()?.stack.push_bool(false)
        }
    }

    pub mod system {
        use crate::vm::error::{JavaErrorKind, VmError, VmResult};
        use crate::vm::object::ObjectData;
        use crate::vm::thread::thread::VMThread;
        use crate::vm::vm::Vm;
        use super::npe;

        macro_rules! copy_range {
            ($vm: expr, $src: expr, $dest: expr, $src_pos: expr, $dest_pos: expr, $len: expr, $($variant: ident),*) => {
                match &$vm.heap[$src].data {
                    $(ObjectData::$variant(values) => {
                        let copied = values[$src_pos..$src_pos + $len].to_vec();
                        match &mut $vm.heap[$dest].data {
                            ObjectData::$variant(target) => {
                                target[$dest_pos..$dest_pos + $len].copy_from_slice(&copied);
                                Ok(())
                            }
                            _ => Err(VmError::java(JavaErrorKind::ArrayStoreException, "arraycopy: type mismatch"))
                        }
                    })*
                    ObjectData::Fields(_) => Err(VmError::java(JavaErrorKind::ArrayStoreException,
                                                               "arraycopy: source type is not an array"))
                }
            }
        }

        pub fn arraycopy(vm: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
            let frame = thread.current_frame()?;
            let src = frame.local_vars.get_ref(0)?.ok_or_else(npe)?;
            let src_pos = frame.local_vars.get_int(1)?;
            let dest = frame.local_vars.get_ref(2)?.ok_or_else(npe)?;
            let dest_pos = frame.local_vars.get_int(3)?;
            let length = frame.local_vars.get_int(4)?;

            if !vm.heap[dest].is_array() {
                return Err(VmError::java(JavaErrorKind::ArrayStoreException,
                                         "arraycopy: destination type is not an array"));
            }

            let src_len = vm.array_length(src).unwrap_or(0) as i64;
            let dest_len = vm.array_length(dest).unwrap_or(0) as i64;
            if src_pos < 0 || dest_pos < 0 || length < 0
                || src_pos as i64 + length as i64 > src_len
                || dest_pos as i64 + length as i64 > dest_len {
                return Err(VmError::java(JavaErrorKind::ArrayIndexOutOfBoundsException,
                                         "arraycopy: last source index out of bounds"));
            }

            let (src_pos, dest_pos, length) = (src_pos as usize, dest_pos as usize, length as usize);
            copy_range!(vm, src, dest, src_pos, dest_pos, length,
                Bytes, Shorts, Chars, Ints, Longs, Floats, Doubles, Refs)
        }
    }

    pub mod throwable {
        use crate::vm::error::VmResult;
        use crate::vm::object::Extra;
        use crate::vm::thread::thread::VMThread;
        use crate::vm::vm::Vm;
        use super::npe;

        /// Captures the stack trace of `this`. The frames of `fillInStackTrace` itself and of
        /// the constructors of the exception's class hierarchy are left out.
        pub fn fill_in_stack_trace(vm: &mut Vm, thread: &mut VMThread) -> VmResult<()> {
            let this = thread.current_frame()?.local_vars.get_ref(0)?.ok_or_else(npe)?;

            let class = vm.heap[this].class;
            let skip = vm.classes.class_chain(class).count() + 1;
            let trace = vm.stack_trace(thread, skip);
            vm.heap[this].extra = Extra::StackTrace(trace);

            thread.current_frame_mut()?.stack.push_ref(Some(this))
        }
    }
}

impl Vm {
    /// The mirror of `class`, loading `java/lang/Class` first if that has not happened yet.
    pub fn class_mirror(&mut self, class: crate::vm::class::class::ClassRef) -> VmResult<crate::vm::object::ObjectRef> {
        if self.classes[class].mirror.is_none() {
            self.load_class("java/lang/Class")?;
        }
        self.classes[class].mirror
            .ok_or_else(|| VmError::internal(format!("{} has no mirror", self.classes[class].name)))
    }
}
