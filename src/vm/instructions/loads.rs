use crate::vm::error::{VmError, VmResult};
use crate::vm::instructions::{array_index, Instruction, InstructionTable, null_pointer, Operands};
use crate::vm::instructions::reader::{implicit_local, index8, none};
use crate::vm::object::ObjectData;
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::iload, index8, load1);
    table.register(I::fload, index8, load1);
    table.register(I::aload, index8, load1);
    table.register(I::lload, index8, load2);
    table.register(I::dload, index8, load2);
    for i in [I::iload_0, I::iload_1, I::iload_2, I::iload_3,
              I::fload_0, I::fload_1, I::fload_2, I::fload_3,
              I::aload_0, I::aload_1, I::aload_2, I::aload_3] {
        table.register(i, implicit_local, load1);
    }
    for i in [I::lload_0, I::lload_1, I::lload_2, I::lload_3,
              I::dload_0, I::dload_1, I::dload_2, I::dload_3] {
        table.register(i, implicit_local, load2);
    }

    table.register(I::iaload, none, iaload);
    table.register(I::laload, none, laload);
    table.register(I::faload, none, faload);
    table.register(I::daload, none, daload);
    table.register(I::aaload, none, aaload);
    table.register(I::baload, none, baload);
    table.register(I::caload, none, caload);
    table.register(I::saload, none, saload);
}

/// Slots are untyped, so int, float and reference loads share one implementation.
pub(super) fn load1(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let frame = thread.current_frame_mut()?;
    let slot = frame.local_vars.get(operands.local()?)?;
    frame.stack.push_slot(slot)
}

pub(super) fn load2(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let frame = thread.current_frame_mut()?;
    let index = operands.local()?;
    let low = frame.local_vars.get(index)?;
    let high = frame.local_vars.get(index + 1)?;
    frame.stack.push_slot(low)?;
    frame.stack.push_slot(high)
}

macro_rules! array_load {
    ($name: ident, $variant: ident, $push: ident, $convert: expr) => {
        fn $name(vm: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            let index = frame.stack.pop_int()?;
            let array = frame.stack.pop_ref()?.ok_or_else(null_pointer)?;

            let value = match &vm.heap[array].data {
                ObjectData::$variant(values) => values[array_index(index, values.len())?],
                other => return Err(VmError::internal(format!("{} on {:?}", stringify!($name), other)))
            };
            frame.stack.$push($convert(value))
        }
    }
}

array_load!(iaload, Ints, push_int, |v: i32| v);
array_load!(laload, Longs, push_long, |v: i64| v);
array_load!(faload, Floats, push_float, |v: f32| v);
array_load!(daload, Doubles, push_double, |v: f64| v);
array_load!(aaload, Refs, push_ref, |v: Option<_>| v);
array_load!(baload, Bytes, push_int, |v: i8| v as i32);
array_load!(caload, Chars, push_int, |v: u16| v as i32);
array_load!(saload, Shorts, push_int, |v: i16| v as i32);

#[cfg(test)]
mod tests {
    use crate::vm::testing::{ClassBuilder, test_vm};
    use crate::vm::thread::slot::Slot;
    use crate::vm::thread::thread::ThreadStatus;

    #[test]
    fn char_arrays_are_unsigned() {
        let mut a = ClassBuilder::new("pkg/Chars", Some("java/lang/Object"));
        // char[] c = new char[2]; c[1] = (char) -1; return c[1]
        a.method(0x0009, "run", "()I", 3, 1, vec![
            0x05, 0xbc, 5, 0x4b,        // iconst_2; newarray char; astore_0
            0x2a, 0x04, 0x02, 0x55,     // aload_0 iconst_1 iconst_m1 castore
            0x2a, 0x04, 0x34,           // aload_0 iconst_1 caload
            0xac,
        ]);
        let mut vm = test_vm(vec![a.build()]);
        assert_eq!(vm.run_static("pkg/Chars", "run", "()I", &[]),
                   ThreadStatus::FINISHED([Slot::Num(0xffff)].into_iter().collect()));
    }

    #[test]
    fn out_of_bounds_and_null() {
        let mut a = ClassBuilder::new("pkg/Bounds", Some("java/lang/Object"));
        a.method(0x0009, "oob", "()I", 2, 0, vec![
            0x05, 0xbc, 10,             // iconst_2; newarray int
            0x05, 0x2e,                 // iconst_2; iaload
            0xac,
        ]);
        a.method(0x0009, "npe", "()I", 2, 0, vec![0x01, 0x03, 0x2e, 0xac]);

        let mut vm = test_vm(vec![a.build()]);
        match vm.run_static("pkg/Bounds", "oob", "()I", &[]) {
            ThreadStatus::FAILED(message) => assert!(message.starts_with(
                "java.lang.ArrayIndexOutOfBoundsException: Index 2 out of bounds for length 2"), "{}", message),
            other => panic!("{:?}", other)
        }
        match vm.run_static("pkg/Bounds", "npe", "()I", &[]) {
            ThreadStatus::FAILED(message) => assert!(message.starts_with("java.lang.NullPointerException"), "{}", message),
            other => panic!("{:?}", other)
        }
    }
}
