use crate::vm::error::VmResult;
use crate::vm::instructions::{Instruction, InstructionTable, Operands};
use crate::vm::instructions::reader::none;
use crate::vm::thread::slot::{OperandStack, Slot};
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::pop, none, pop);
    table.register(I::pop2, none, pop2);
    table.register(I::dup, none, dup);
    table.register(I::dup_x1, none, dup_x1);
    table.register(I::dup_x2, none, dup_x2);
    table.register(I::dup2, none, dup2);
    table.register(I::dup2_x1, none, dup2_x1);
    table.register(I::dup2_x2, none, dup2_x2);
    table.register(I::swap, none, swap);
}

/// Pops `n` slots and pushes them back in the order given by `order`, an index list into
/// the popped values (0 = the former top of stack).
fn shuffle(stack: &mut OperandStack, n: usize, order: &[usize]) -> VmResult<()> {
    let mut popped = [Slot::default(); 4];
    for slot in popped.iter_mut().take(n) {
        *slot = stack.pop_slot()?;
    }
    for i in order {
        stack.push_slot(popped[*i])?;
    }
    Ok(())
}

fn pop(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    thread.current_frame_mut()?.stack.pop_slot()?;
    Ok(())
}

fn pop2(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    let stack = &mut thread.current_frame_mut()?.stack;
    stack.pop_slot()?;
    stack.pop_slot()?;
    Ok(())
}

fn dup(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    shuffle(&mut thread.current_frame_mut()?.stack, 1, &[0, 0])
}

fn dup_x1(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    shuffle(&mut thread.current_frame_mut()?.stack, 2, &[0, 1, 0])
}

fn dup_x2(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    shuffle(&mut thread.current_frame_mut()?.stack, 3, &[0, 2, 1, 0])
}

fn dup2(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    shuffle(&mut thread.current_frame_mut()?.stack, 2, &[1, 0, 1, 0])
}

fn dup2_x1(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    shuffle(&mut thread.current_frame_mut()?.stack, 3, &[1, 0, 2, 1, 0])
}

fn dup2_x2(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    shuffle(&mut thread.current_frame_mut()?.stack, 4, &[1, 0, 3, 2, 1, 0])
}

fn swap(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    shuffle(&mut thread.current_frame_mut()?.stack, 2, &[0, 1])
}
