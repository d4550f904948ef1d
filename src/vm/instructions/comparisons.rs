use std::cmp::Ordering;
use crate::vm::error::VmResult;
use crate::vm::instructions::{Instruction, InstructionTable, Operands};
use crate::vm::instructions::reader::{branch16, none};
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::lcmp, none, lcmp);
    table.register(I::fcmpl, none, fcmpl);
    table.register(I::fcmpg, none, fcmpg);
    table.register(I::dcmpl, none, dcmpl);
    table.register(I::dcmpg, none, dcmpg);
    table.register(I::ifeq, branch16, ifeq);
    table.register(I::ifne, branch16, ifne);
    table.register(I::iflt, branch16, iflt);
    table.register(I::ifge, branch16, ifge);
    table.register(I::ifgt, branch16, ifgt);
    table.register(I::ifle, branch16, ifle);
    table.register(I::if_icmpeq, branch16, if_icmpeq);
    table.register(I::if_icmpne, branch16, if_icmpne);
    table.register(I::if_icmplt, branch16, if_icmplt);
    table.register(I::if_icmpge, branch16, if_icmpge);
    table.register(I::if_icmpgt, branch16, if_icmpgt);
    table.register(I::if_icmple, branch16, if_icmple);
    table.register(I::if_acmpeq, branch16, if_acmpeq);
    table.register(I::if_acmpne, branch16, if_acmpne);
}

fn ordering_value(ordering: Option<Ordering>, nan: i32) -> i32 {
    match ordering {
        Some(Ordering::Less) => -1,
        Some(Ordering::Equal) => 0,
        Some(Ordering::Greater) => 1,
        None => nan
    }
}

fn lcmp(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    let stack = &mut thread.current_frame_mut()?.stack;
    let b = stack.pop_long()?;
    let a = stack.pop_long()?;
    stack.push_int(ordering_value(a.partial_cmp(&b), 0))
}

/// The `l` and `g` variants only differ in the result for NaN operands.
macro_rules! fp_compare {
    ($name: ident, $pop: ident, $nan: expr) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
            let stack = &mut thread.current_frame_mut()?.stack;
            let b = stack.$pop()?;
            let a = stack.$pop()?;
            stack.push_int(ordering_value(a.partial_cmp(&b), $nan))
        }
    }
}

fp_compare!(fcmpl, pop_float, -1);
fp_compare!(fcmpg, pop_float, 1);
fp_compare!(dcmpl, pop_double, -1);
fp_compare!(dcmpg, pop_double, 1);

macro_rules! if_zero {
    ($name: ident, $op: tt) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            if frame.stack.pop_int()? $op 0 {
                frame.branch(operands.int()?);
            }
            Ok(())
        }
    }
}

if_zero!(ifeq, ==);
if_zero!(ifne, !=);
if_zero!(iflt, <);
if_zero!(ifge, >=);
if_zero!(ifgt, >);
if_zero!(ifle, <=);

macro_rules! if_compare {
    ($name: ident, $pop: ident, $op: tt) => {
        fn $name(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
            let frame = thread.current_frame_mut()?;
            let b = frame.stack.$pop()?;
            let a = frame.stack.$pop()?;
            if a $op b {
                frame.branch(operands.int()?);
            }
            Ok(())
        }
    }
}

if_compare!(if_icmpeq, pop_int, ==);
if_compare!(if_icmpne, pop_int, !=);
if_compare!(if_icmplt, pop_int, <);
if_compare!(if_icmpge, pop_int, >=);
if_compare!(if_icmpgt, pop_int, >);
if_compare!(if_icmple, pop_int, <=);
if_compare!(if_acmpeq, pop_ref, ==);
if_compare!(if_acmpne, pop_ref, !=);
