use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::instructions::{Instruction, InstructionTable, Operands};
use crate::vm::instructions::reader::{iinc as iinc_operands, none};
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::iadd, none, iadd);
    table.register(I::ladd, none, ladd);
    table.register(I::fadd, none, fadd);
    table.register(I::dadd, none, dadd);
    table.register(I::isub, none, isub);
    table.register(I::lsub, none, lsub);
    table.register(I::fsub, none, fsub);
    table.register(I::dsub, none, dsub);
    table.register(I::imul, none, imul);
    table.register(I::lmul, none, lmul);
    table.register(I::fmul, none, fmul);
    table.register(I::dmul, none, dmul);
    table.register(I::idiv, none, idiv);
    table.register(I::ldiv, none, ldiv);
    table.register(I::fdiv, none, fdiv);
    table.register(I::ddiv, none, ddiv);
    table.register(I::irem, none, irem);
    table.register(I::lrem, none, lrem);
    table.register(I::frem, none, frem);
    table.register(I::drem, none, drem);
    table.register(I::ineg, none, ineg);
    table.register(I::lneg, none, lneg);
    table.register(I::fneg, none, fneg);
    table.register(I::dneg, none, dneg);
    table.register(I::ishl, none, ishl);
    table.register(I::lshl, none, lshl);
    table.register(I::ishr, none, ishr);
    table.register(I::lshr, none, lshr);
    table.register(I::iushr, none, iushr);
    table.register(I::lushr, none, lushr);
    table.register(I::iand, none, iand);
    table.register(I::land, none, land);
    table.register(I::ior, none, ior);
    table.register(I::lor, none, lor);
    table.register(I::ixor, none, ixor);
    table.register(I::lxor, none, lxor);
    table.register(I::iinc, iinc_operands, iinc);
}

fn divide_by_zero() -> VmError {
    VmError::java(JavaErrorKind::ArithmeticException, "/ by zero")
}

macro_rules! binary_op {
    ($name: ident, $pop: ident, $push: ident, |$a: ident, $b: ident| $body: expr) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let stack = &mut thread.current_frame_mut()?.stack;
            let $b = stack.$pop()?;
            let $a = stack.$pop()?;
            stack.$push($body)
        }
    }
}

macro_rules! checked_op {
    ($name: ident, $pop: ident, $push: ident, $op: ident) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let stack = &mut thread.current_frame_mut()?.stack;
            let b = stack.$pop()?;
            let a = stack.$pop()?;
            if b == 0 {
                return Err(divide_by_zero());
            }
            stack.$push(a.$op(b))
        }
    }
}

macro_rules! unary_op {
    ($name: ident, $pop: ident, $push: ident, |$a: ident| $body: expr) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let stack = &mut thread.current_frame_mut()?.stack;
            let $a = stack.$pop()?;
            stack.$push($body)
        }
    }
}

binary_op!(iadd, pop_int, push_int, |a, b| a.wrapping_add(b));
binary_op!(ladd, pop_long, push_long, |a, b| a.wrapping_add(b));
binary_op!(fadd, pop_float, push_float, |a, b| a + b);
binary_op!(dadd, pop_double, push_double, |a, b| a + b);
binary_op!(isub, pop_int, push_int, |a, b| a.wrapping_sub(b));
binary_op!(lsub, pop_long, push_long, |a, b| a.wrapping_sub(b));
binary_op!(fsub, pop_float, push_float, |a, b| a - b);
binary_op!(dsub, pop_double, push_double, |a, b| a - b);
binary_op!(imul, pop_int, push_int, |a, b| a.wrapping_mul(b));
binary_op!(lmul, pop_long, push_long, |a, b| a.wrapping_mul(b));
binary_op!(fmul, pop_float, push_float, |a, b| a * b);
binary_op!(dmul, pop_double, push_double, |a, b| a * b);
checked_op!(idiv, pop_int, push_int, wrapping_div);
checked_op!(ldiv, pop_long, push_long, wrapping_div);
binary_op!(fdiv, pop_float, push_float, |a, b| a / b);
binary_op!(ddiv, pop_double, push_double, |a, b| a / b);
checked_op!(irem, pop_int, push_int, wrapping_rem);
checked_op!(lrem, pop_long, push_long, wrapping_rem);
binary_op!(frem, pop_float, push_float, |a, b| a % b);
binary_op!(drem, pop_double, push_double, |a, b| a % b);
unary_op!(ineg, pop_int, push_int, |a| a.wrapping_neg());
unary_op!(lneg, pop_long, push_long, |a| a.wrapping_neg());
unary_op!(fneg, pop_float, push_float, |a| -a);
unary_op!(dneg, pop_double, push_double, |a| -a);

binary_op!(ishl, pop_int, push_int, |a, b| a.wrapping_shl(b as u32 & 0x1f));
binary_op!(ishr, pop_int, push_int, |a, b| a.wrapping_shr(b as u32 & 0x1f));
binary_op!(iushr, pop_int, push_int, |a, b| ((a as u32) >> (b as u32 & 0x1f)) as i32);
binary_op!(iand, pop_int, push_int, |a, b| a & b);
binary_op!(ior, pop_int, push_int, |a, b| a | b);
binary_op!(ixor, pop_int, push_int, |a, b| a ^ b);
binary_op!(land, pop_long, push_long, |a, b| a & b);
binary_op!(lor, pop_long, push_long, |a, b| a | b);
binary_op!(lxor, pop_long, push_long, |a, b| a ^ b);

// long shifts take an int shift distance
macro_rules! long_shift {
    ($name: ident, |$a: ident, $s: ident| $body: expr) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let stack = &mut thread.current_frame_mut()?.stack;
            let $s = stack.pop_int()? as u32 & 0x3f;
            let $a = stack.pop_long()?;
            stack.push_long($body)
        }
    }
}

long_shift!(lshl, |a, s| a.wrapping_shl(s));
long_shift!(lshr, |a, s| a.wrapping_shr(s));
long_shift!(lushr, |a, s| ((a as u64) >> s) as i64);

pub(super) fn iinc(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let (index, constant) = match operands {
        Operands::Iinc(index, constant) => (*index as usize, *constant),
        other => return Err(VmError::internal(format!("iinc with {:?}", other)))
    };

    let locals = &mut thread.current_frame_mut()?.local_vars;
    let value = locals.get_int(index)?;
    locals.set_int(index, value.wrapping_add(constant))
}

#[cfg(test)]
mod tests {
    use crate::vm::testing::{ClassBuilder, test_vm};
    use crate::vm::thread::slot::Slot;
    use crate::vm::thread::thread::ThreadStatus;

    fn int_result(value: i32) -> ThreadStatus {
        ThreadStatus::FINISHED([Slot::Num(value)].into_iter().collect())
    }

    #[test]
    fn int_arithmetic_wraps() {
        let mut a = ClassBuilder::new("pkg/Math", Some("java/lang/Object"));
        // MIN / -1 and MAX + 1 both wrap to MIN
        a.method(0x0009, "div", "(II)I", 2, 2, vec![0x1a, 0x1b, 0x6c, 0xac]);
        a.method(0x0009, "rem", "(II)I", 2, 2, vec![0x1a, 0x1b, 0x70, 0xac]);
        a.method(0x0009, "inc", "(I)I", 1, 1, vec![0x84, 0x00, 0x01, 0x1a, 0xac]);
        a.method(0x0009, "ushr", "(II)I", 2, 2, vec![0x1a, 0x1b, 0x7c, 0xac]);
        let mut vm = test_vm(vec![a.build()]);

        assert_eq!(vm.run_static("pkg/Math", "div", "(II)I", &[Slot::Num(i32::MIN), Slot::Num(-1)]),
                   int_result(i32::MIN));
        assert_eq!(vm.run_static("pkg/Math", "div", "(II)I", &[Slot::Num(-7), Slot::Num(2)]), int_result(-3));
        assert_eq!(vm.run_static("pkg/Math", "rem", "(II)I", &[Slot::Num(-7), Slot::Num(2)]), int_result(-1));
        assert_eq!(vm.run_static("pkg/Math", "inc", "(I)I", &[Slot::Num(i32::MAX)]), int_result(i32::MIN));
        assert_eq!(vm.run_static("pkg/Math", "ushr", "(II)I", &[Slot::Num(-1), Slot::Num(36)]),
                   int_result(0x0fff_ffff));

        match vm.run_static("pkg/Math", "div", "(II)I", &[Slot::Num(1), Slot::Num(0)]) {
            ThreadStatus::FAILED(message) => assert!(message.starts_with("java.lang.ArithmeticException: / by zero"),
                                                     "{}", message),
            other => panic!("{:?}", other)
        }
    }

    #[test]
    fn float_remainder() {
        let mut a = ClassBuilder::new("pkg/Rem", Some("java/lang/Object"));
        a.method(0x0009, "rem", "(FF)F", 2, 2, vec![0x22, 0x23, 0x72, 0xae]);
        let mut vm = test_vm(vec![a.build()]);

        let args = [Slot::Num((-5.5f32).to_bits() as i32), Slot::Num(2.0f32.to_bits() as i32)];
        assert_eq!(vm.run_static("pkg/Rem", "rem", "(FF)F", &args),
                   int_result((-1.5f32).to_bits() as i32));

        // remainder by zero is NaN, not an exception
        let args = [Slot::Num(1.0f32.to_bits() as i32), Slot::Num(0)];
        match vm.run_static("pkg/Rem", "rem", "(FF)F", &args) {
            ThreadStatus::FINISHED(values) => assert!(f32::from_bits(values[0].as_int() as u32).is_nan()),
            other => panic!("{:?}", other)
        }
    }
}
