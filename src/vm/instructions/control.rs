use crate::vm::error::{VmError, VmResult};
use crate::vm::instructions::{Instruction, InstructionTable, Operands};
use crate::vm::instructions::reader::{branch16, index8, lookupswitch, none, tableswitch};
use crate::vm::thread::thread::{ThreadStatus, VMThread};
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::goto, branch16, goto);
    table.register(I::jsr, branch16, unsupported);
    table.register(I::ret, index8, unsupported);
    table.register(I::tableswitch, tableswitch, switch);
    table.register(I::lookupswitch, lookupswitch, switch);
    table.register(I::ireturn, none, return1);
    table.register(I::freturn, none, return1);
    table.register(I::areturn, none, return1);
    table.register(I::lreturn, none, return2);
    table.register(I::dreturn, none, return2);
    table.register(I::_return, none, return0);
}

pub(super) fn goto(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    thread.current_frame_mut()?.branch(operands.int()?);
    Ok(())
}

/// Subroutines were phased out with class file version 51.
pub(super) fn unsupported(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    Err(VmError::internal(format!("jsr/ret are not supported (pc {})", thread.pc)))
}

fn switch(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let frame = thread.current_frame_mut()?;
    let key = frame.stack.pop_int()?;

    let offset = match operands {
        Operands::TableSwitch { default, low, offsets } => {
            let i = key as i64 - *low as i64;
            if i >= 0 && (i as usize) < offsets.len() { offsets[i as usize] } else { *default }
        }
        Operands::LookupSwitch { default, pairs } => pairs.iter()
            .find(|(matched, _)| *matched == key)
            .map_or(*default, |(_, offset)| *offset),
        other => return Err(VmError::internal(format!("switch with {:?}", other)))
    };

    frame.branch(offset);
    Ok(())
}

/// Pops the returning frame and hands its top `slots` values to the invoker, or finishes the
/// thread when the outermost frame returns.
fn return_slots(thread: &mut VMThread, slots: usize) -> VmResult<()> {
    let mut frame = thread.pop_frame()?;
    let values = frame.stack.pop_args(slots)?;

    match thread.top_frame_mut() {
        Some(invoker) => {
            for v in values {
                invoker.stack.push_slot(v)?;
            }
        }
        None => thread.status = ThreadStatus::FINISHED(values)
    }
    Ok(())
}

fn return0(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    return_slots(thread, 0)
}

fn return1(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    return_slots(thread, 1)
}

fn return2(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    return_slots(thread, 2)
}
