use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use crate::vm::class::method::{Code, MethodRef};
use crate::vm::thread::slot::{OperandStack, Slots};

pub struct Frame {
    pub method: MethodRef,
    pub code: Rc<Code>,
    pub local_vars: Slots,
    pub stack: OperandStack,
    /// Start of the instruction currently executing.
    pub pc: usize,
    /// Where execution resumes once the current instruction completes.
    pub next_pc: usize,
}

impl Debug for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?} pc={} locals: (", self.method, self.pc)?;
        for slot in self.local_vars.iter() {
            write!(f, "{:?}, ", slot)?;
        }
        write!(f, ") stack depth: {}]", self.stack.len())
    }
}

impl Frame {
    pub fn new(method: MethodRef, code: Rc<Code>) -> Self {
        Frame {
            method,
            local_vars: Slots::new(code.max_locals),
            stack: OperandStack::new(code.max_stack),
            code,
            pc: 0,
            next_pc: 0,
        }
    }

    /// Makes the current instruction run again, used when it first has to schedule class
    /// initialization.
    pub fn revert_next_pc(&mut self) {
        self.next_pc = self.pc;
    }

    /// Branch offsets are relative to the start of the branching instruction.
    pub fn branch(&mut self, offset: i32) {
        self.next_pc = (self.pc as i64 + offset as i64) as usize;
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;
    use crate::vm::class::class::ClassRef;
    use crate::vm::class::method::{Code, MethodRef};
    use crate::vm::thread::frame::Frame;

    fn frame() -> Frame {
        let code = Code { max_stack: 3, max_locals: 2, code: vec![0; 16], ..Default::default() };
        Frame::new(MethodRef { class: ClassRef(0), index: 0 }, Rc::new(code))
    }

    #[test]
    fn test_peek() {
        let mut frame = frame();

        frame.stack.push_int(1).unwrap();
        frame.stack.push_int(2).unwrap();
        frame.stack.push_int(3).unwrap();

        assert_eq!(frame.stack.peek(0).unwrap().as_int(), 3);
        assert_eq!(frame.stack.peek(1).unwrap().as_int(), 2);

        frame.stack.pop_int().unwrap();

        assert_eq!(frame.stack.peek(1).unwrap().as_int(), 1);
    }

    #[test]
    fn branch_and_revert() {
        let mut frame = frame();
        frame.pc = 8;
        frame.next_pc = 11;

        frame.branch(-5);
        assert_eq!(frame.next_pc, 3);

        frame.revert_next_pc();
        assert_eq!(frame.next_pc, 8);
        assert_eq!(frame.local_vars.len(), 2);
    }
}
