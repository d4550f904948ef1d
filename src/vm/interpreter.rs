use log::{log_enabled, trace, Level};
use crate::vm::error::VmResult;
use crate::vm::instructions::INSTRUCTIONS;
use crate::vm::instructions::reader::BytecodeReader;
use crate::vm::thread::slot::Args;
use crate::vm::thread::thread::{ThreadStatus, VMThread};
use crate::vm::vm::Vm;

impl Vm {
    /// Fetches, decodes and executes the instruction at the current frame's `next_pc`.
    pub fn step(&mut self, thread: &mut VMThread) -> VmResult<()> {
        let frame = thread.current_frame_mut()?;
        let code = frame.code.clone();
        let pc = frame.next_pc;

        let mut reader = BytecodeReader::new(&code.code, pc);
        let opcode = reader.read_u8()?;
        let def = INSTRUCTIONS.get(opcode)?;
        let operands = (def.decode)(&mut reader, opcode)?;

        frame.pc = pc;
        frame.next_pc = reader.position();
        let method = frame.method;
        thread.pc = pc;

        if self.options.verbose_inst && log_enabled!(Level::Trace) {
            let m = self.classes.method(method);
            trace!("{}.{}{} {:>4}: {:?} {:?}", self.classes[method.class].name, m.name, m.descriptor,
                   pc, def.instruction, operands);
        }

        (def.execute)(self, thread, &operands)
    }

    /// Runs `thread` until its outermost frame returns or it fails.
    pub fn run(&mut self, thread: &mut VMThread) {
        thread.status = ThreadStatus::RUNNING;

        while thread.status == ThreadStatus::RUNNING {
            if thread.is_stack_empty() {
                thread.status = ThreadStatus::FINISHED(Args::new());
                break;
            }

            if let Err(e) = self.step(thread) {
                self.handle_error(thread, e);
            }
        }
    }
}
