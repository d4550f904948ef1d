use crate::vm::class::constant_pool::{Constant, wrong_kind};
use crate::vm::error::VmResult;
use crate::vm::instructions::{Instruction, InstructionTable, Operands};
use crate::vm::instructions::reader::{byte, implicit_value, index16, index8, none, short};
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::nop, none, nop);
    table.register(I::aconst_null, none, aconst_null);
    for i in [I::iconst_m1, I::iconst_0, I::iconst_1, I::iconst_2, I::iconst_3, I::iconst_4, I::iconst_5] {
        table.register(i, implicit_value, iconst);
    }
    table.register(I::lconst_0, implicit_value, lconst);
    table.register(I::lconst_1, implicit_value, lconst);
    for i in [I::fconst_0, I::fconst_1, I::fconst_2] {
        table.register(i, implicit_value, fconst);
    }
    table.register(I::dconst_0, implicit_value, dconst);
    table.register(I::dconst_1, implicit_value, dconst);
    table.register(I::bipush, byte, iconst);
    table.register(I::sipush, short, iconst);
    table.register(I::ldc, index8, ldc);
    table.register(I::ldc_w, index16, ldc);
    table.register(I::ldc2_w, index16, ldc2_w);
}

fn nop(_: &mut Vm, _: &mut VMThread, _: &Operands) -> VmResult<()> {
    Ok(())
}

fn aconst_null(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    thread.current_frame_mut()?.stack.push_ref(None)
}

fn iconst(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    thread.current_frame_mut()?.stack.push_int(operands.int()?)
}

fn lconst(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    thread.current_frame_mut()?.stack.push_long(operands.int()? as i64)
}

fn fconst(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    thread.current_frame_mut()?.stack.push_float(operands.int()? as f32)
}

fn dconst(_: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    thread.current_frame_mut()?.stack.push_double(operands.int()? as f64)
}

/// Pushes an int, float or String constant; class constants push the class's mirror.
fn ldc(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let index = operands.index()?;
    let current = thread.current_frame()?.method.class;

    match vm.classes[current].constant_pool.get(index)?.clone() {
        Constant::Integer(v) => thread.current_frame_mut()?.stack.push_int(v),
        Constant::Float(v) => thread.current_frame_mut()?.stack.push_float(v),
        Constant::String(s) => {
            let string = vm.intern_string(&s)?;
            thread.current_frame_mut()?.stack.push_ref(Some(string))
        }
        Constant::Class(_) => {
            let class = vm.resolve_class(current, index)?;
            let mirror = vm.class_mirror(class)?;
            thread.current_frame_mut()?.stack.push_ref(Some(mirror))
        }
        other => Err(wrong_kind(index, "ldc constant", &other))
    }
}

fn ldc2_w(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let index = operands.index()?;
    let frame = thread.current_frame_mut()?;

    match vm.classes[frame.method.class].constant_pool.get(index)? {
        Constant::Long(v) => frame.stack.push_long(*v),
        Constant::Double(v) => frame.stack.push_double(*v),
        other => Err(wrong_kind(index, "long or double", other))
    }
}
