use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::instructions::{array_index, Instruction, InstructionTable, null_pointer, Operands};
use crate::vm::instructions::reader::{implicit_local, index8, none};
use crate::vm::object::ObjectData;
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::istore, index8, store1);
    table.register(I::fstore, index8, store1);
    table.register(I::astore, index8, store1);
    table.register(I::lstore, index8, store2);
    table.register(I::dstore, index8, store2);
    for i in [I::istore_0, I::istore_1, I::istore_2, I::istore_3,
              I::fstore_0, I::fstore_1, I::fstore_2, I::fstore_3,
              I::astore_0, I::astore_1, I::astore_2, I::astore_3] {
        table.register(i, implicit_local, store1);
    }
    for i in [I::lstore_0, I::lstore_1, I::lstore_2, I::lstore_3,
              I::dstore_0, I::dstore_1, I::dstore_2, I::dstore_3] {
        table.register(i, implicit_local, store2);
    }

    table.register(I::iastore, none, iastore);
    table.register(I::lastore, none, lastore);
    table.register(I::fastore, none, fastore);
    table.register(I::dastore, none, dastore);
    table.register(I::aastore, none, aastore);
    table.register(I::bastore, none, bastore);
    table.register(I::castore, none, castore);
    table.register(I::sastore, none, sastore);
}

pub(super) fn store1(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let frame = thread.current_frame_mut()?;
    let slot = frame.stack.pop_slot()?;
    frame.local_vars.set(operands.local()?, slot)
}

pub(super) fn store2(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let frame = thread.current_frame_mut()?;
    let index = operands.local()?;
    let high = frame.stack.pop_slot()?;
    let low = frame.stack.pop_slot()?;
    frame.local_vars.set(index, low)?;
    frame.local_vars.set(index + 1, high)
}

macro_rules! array_store {
    ($name: ident, $variant: ident, $pop: ident, $convert: expr) => {
        fn $name(vm: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            let value = frame.stack.$pop()?;
            let index = frame.stack.pop_int()?;
            let array = frame.stack.pop_ref()?.ok_or_else(null_pointer)?;

            match &mut vm.heap[array].data {
                ObjectData::$variant(values) => {
                    let i = array_index(index, values.len())?;
                    values[i] = $convert(value);
                    Ok(())
                }
                other => Err(VmError::internal(format!("{} on {:?}", stringify!($name), other)))
            }
        }
    }
}

array_store!(iastore, Ints, pop_int, |v: i32| v);
array_store!(lastore, Longs, pop_long, |v: i64| v);
array_store!(fastore, Floats, pop_float, |v: f32| v);
array_store!(dastore, Doubles, pop_double, |v: f64| v);
array_store!(bastore, Bytes, pop_int, |v: i32| v as i8);
array_store!(castore, Chars, pop_int, |v: i32| v as u16);
array_store!(sastore, Shorts, pop_int, |v: i32| v as i16);

/// Reference stores also check the value against the array's component type.
fn aastore(vm: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    let frame = thread.current_frame_mut()?;
    let value = frame.stack.pop_ref()?;
    let index = frame.stack.pop_int()?;
    let array = frame.stack.pop_ref()?.ok_or_else(null_pointer)?;

    let length = vm.array_length(array)?;
    let i = array_index(index, length)?;

    if let Some(v) = value {
        let component = vm.classes[vm.heap[array].class].component_class
            .ok_or_else(|| VmError::internal("aastore on an array class without component"))?;
        let class = vm.heap[v].class;
        if !vm.classes.is_assignable(class, component) {
            return Err(VmError::java(JavaErrorKind::ArrayStoreException, vm.classes[class].java_name()));
        }
    }

    match &mut vm.heap[array].data {
        ObjectData::Refs(values) => {
            values[i] = value;
            Ok(())
        }
        other => Err(VmError::internal(format!("aastore on {:?}", other)))
    }
}
