use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::thread::frame::Frame;
use crate::vm::thread::slot::Args;

pub const DEFAULT_MAX_STACK_DEPTH: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum ThreadStatus {
    STOPPED,
    RUNNING,
    /// The outermost method returned, carrying its return value slots (empty for `void`).
    FINISHED(Args),
    /// Terminated by an uncaught exception or a fatal internal error, with the rendered message.
    FAILED(String),
}

pub struct VMThread {
    pub status: ThreadStatus,
    /// pc of the instruction most recently fetched by this thread.
    pub pc: usize,
    stack: Vec<Frame>,
    max_depth: usize,
}

impl Default for VMThread {
    fn default() -> Self {
        VMThread::new(DEFAULT_MAX_STACK_DEPTH)
    }
}

impl VMThread {
    pub fn new(max_depth: usize) -> VMThread {
        VMThread {
            status: ThreadStatus::STOPPED,
            pc: 0,
            stack: Vec::new(),
            max_depth,
        }
    }

    pub fn push_frame(&mut self, frame: Frame) -> VmResult<()> {
        if self.stack.len() >= self.max_depth {
            return Err(VmError::java(JavaErrorKind::StackOverflowError,
                                     format!("stack depth exceeded {}", self.max_depth)));
        }
        self.stack.push(frame);
        Ok(())
    }

    pub fn pop_frame(&mut self) -> VmResult<Frame> {
        self.stack.pop().ok_or_else(|| VmError::internal("pop from an empty thread stack"))
    }

    pub fn current_frame(&self) -> VmResult<&Frame> {
        self.stack.last().ok_or_else(|| VmError::internal("thread stack is empty"))
    }

    pub fn current_frame_mut(&mut self) -> VmResult<&mut Frame> {
        self.stack.last_mut().ok_or_else(|| VmError::internal("thread stack is empty"))
    }

    pub fn top_frame_mut(&mut self) -> Option<&mut Frame> {
        self.stack.last_mut()
    }

    /// Frames from the top of the stack down to the outermost invocation.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.stack.iter().rev()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_stack_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }
}
