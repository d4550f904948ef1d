use crate::vm::error::VmResult;
use crate::vm::instructions::{Instruction, InstructionTable, Operands};
use crate::vm::instructions::reader::none;
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::i2l, none, i2l);
    table.register(I::i2f, none, i2f);
    table.register(I::i2d, none, i2d);
    table.register(I::l2i, none, l2i);
    table.register(I::l2f, none, l2f);
    table.register(I::l2d, none, l2d);
    table.register(I::f2i, none, f2i);
    table.register(I::f2l, none, f2l);
    table.register(I::f2d, none, f2d);
    table.register(I::d2i, none, d2i);
    table.register(I::d2l, none, d2l);
    table.register(I::d2f, none, d2f);
    table.register(I::i2b, none, i2b);
    table.register(I::i2c, none, i2c);
    table.register(I::i2s, none, i2s);
}

// `as` from float to int saturates and maps NaN to 0, which is exactly the JVM rule
macro_rules! convert {
    ($name: ident, $pop: ident, $push: ident, $ty: ty) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let stack = &mut thread.current_frame_mut()?.stack;
            let v = stack.$pop()?;
            stack.$push(v as $ty)
        }
    }
}

convert!(i2l, pop_int, push_long, i64);
convert!(i2f, pop_int, push_float, f32);
convert!(i2d, pop_int, push_double, f64);
convert!(l2i, pop_long, push_int, i32);
convert!(l2f, pop_long, push_float, f32);
convert!(l2d, pop_long, push_double, f64);
convert!(f2i, pop_float, push_int, i32);
convert!(f2l, pop_float, push_long, i64);
convert!(f2d, pop_float, push_double, f64);
convert!(d2i, pop_double, push_int, i32);
convert!(d2l, pop_double, push_long, i64);
convert!(d2f, pop_double, push_float, f32);

macro_rules! narrow {
    ($name: ident, $ty: ty) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let stack = &mut thread.current_frame_mut()?.stack;
            let v = stack.pop_int()?;
            stack.push_int(v as $ty as i32)
        }
    }
}

narrow!(i2b, i8);
narrow!(i2c, u16);
narrow!(i2s, i16);

#[cfg(test)]
mod tests {
    use crate::vm::testing::{ClassBuilder, test_vm};
    use crate::vm::thread::slot::Slot;
    use crate::vm::thread::thread::ThreadStatus;

    #[test]
    fn float_to_int_saturates() {
        let mut a = ClassBuilder::new("pkg/Conv", Some("java/lang/Object"));
        a.method(0x0009, "d2i", "(D)I", 2, 2, vec![0x26, 0x8e, 0xac]);
        a.method(0x0009, "i2b", "(I)I", 1, 1, vec![0x1a, 0x91, 0xac]);
        let mut vm = test_vm(vec![a.build()]);

        let cases = [(1e20, i32::MAX), (-1e20, i32::MIN), (f64::NAN, 0), (-2.9, -2)];
        for (input, expected) in cases {
            let bits = input.to_bits();
            let args = [Slot::Num(bits as u32 as i32), Slot::Num((bits >> 32) as u32 as i32)];
            assert_eq!(vm.run_static("pkg/Conv", "d2i", "(D)I", &args),
                       ThreadStatus::FINISHED([Slot::Num(expected)].into_iter().collect()), "{}", input);
        }

        assert_eq!(vm.run_static("pkg/Conv", "i2b", "(I)I", &[Slot::Num(200)]),
                   ThreadStatus::FINISHED([Slot::Num(-56)].into_iter().collect()));
    }
}
