use crate::vm::error::{VmError, VmResult};
use crate::vm::instructions::{Instruction, InstructionTable, INSTRUCTIONS, Operands};
use crate::vm::instructions::control::{goto, unsupported};
use crate::vm::instructions::reader::{branch16, branch32, wide as wide_operands};
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::wide, wide_operands, wide);
    table.register(I::ifnull, branch16, ifnull);
    table.register(I::ifnonnull, branch16, ifnonnull);
    table.register(I::goto_w, branch32, goto);
    table.register(I::jsr_w, branch32, unsupported);
}

/// Runs the widened instruction with the 16 bit index decoded by `wide`.
fn wide(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    match operands {
        Operands::Wide(opcode, inner) => (INSTRUCTIONS.get(*opcode)?.execute)(vm, thread, inner),
        other => Err(VmError::internal(format!("wide with {:?}", other)))
    }
}

fn ifnull(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let frame = thread.current_frame_mut()?;
    if frame.stack.pop_ref()?.is_none() {
        frame.branch(operands.int()?);
    }
    Ok(())
}

fn ifnonnull(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let frame = thread.current_frame_mut()?;
    if frame.stack.pop_ref()?.is_some() {
        frame.branch(operands.int()?);
    }
    Ok(())
}
