use log::{debug, log_enabled, Level};
use crate::vm::class::class::ClassRef;
use crate::vm::class::field::FieldType;
use crate::vm::class::method::Code;
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::object::{Extra, ObjectRef, StackTraceElement};
use crate::vm::thread::thread::{ThreadStatus, VMThread};
use crate::vm::vm::Vm;

fn detail_message_field() -> FieldType {
    FieldType::L("java/lang/String".to_string())
}

impl Vm {
    /// Trace elements for the frames of `thread`, innermost first, leaving out the top `skip`.
    pub fn stack_trace(&self, thread: &VMThread, skip: usize) -> Vec<StackTraceElement> {
        thread.frames().skip(skip).map(|frame| {
            let class = &self.classes[frame.method.class];
            StackTraceElement {
                file_name: class.source_file.clone(),
                class_name: class.java_name(),
                method_name: self.classes.method(frame.method).name.clone(),
                line_number: frame.code.line_number(frame.pc),
            }
        }).collect()
    }

    /// Routes an error raised by an instruction. Throwables unwind to the nearest matching
    /// handler; without one, or for internal errors, the thread fails.
    pub fn handle_error(&mut self, thread: &mut VMThread, error: VmError) {
        let exception = match &error {
            VmError::Internal(_) => return self.fail(thread, error.to_string()),
            VmError::Thrown(exception) => *exception,
            VmError::Java { kind, message } => match self.new_throwable(thread, *kind, message) {
                Ok(exception) => exception,
                Err(e) => {
                    debug!("Could not create {}: {}", kind.class_name(), e);
                    return self.fail(thread, error.to_string());
                }
            }
        };

        match self.dispatch(thread, exception) {
            Ok(true) => {}
            Ok(false) => {
                let rendered = self.render_uncaught(exception);
                self.fail(thread, rendered);
            }
            Err(e) => self.fail(thread, e.to_string())
        }
    }

    /// Allocates the throwable for an error raised by the VM itself. Its constructor does not
    /// run: the message and the stack trace are filled in directly.
    fn new_throwable(&mut self, thread: &VMThread, kind: JavaErrorKind, message: &str) -> VmResult<ObjectRef> {
        let class = self.load_class(&kind.class_name())?;
        let exception = self.new_object(class);

        if !message.is_empty() {
            let field = self.classes.lookup_field(class, "detailMessage", &detail_message_field())
                .ok_or_else(|| VmError::internal(format!("{} has no detailMessage", kind.class_name())))?;
            let slot_id = self.classes.field(field).slot_id;
            let string = self.new_string(message)?;
            self.heap[exception].fields_mut()?.set_ref(slot_id, Some(string))?;
        }

        self.heap[exception].extra = Extra::StackTrace(self.stack_trace(thread, 0));
        Ok(exception)
    }

    /// Unwinds `thread` to the first handler covering the faulting pc whose catch type matches
    /// the exception. Returns `false` when the stack ran empty.
    fn dispatch(&mut self, thread: &mut VMThread, exception: ObjectRef) -> VmResult<bool> {
        let exception_class = self.heap[exception].class;

        loop {
            let (method, code, pc) = match thread.top_frame_mut() {
                Some(frame) => (frame.method, frame.code.clone(), frame.pc),
                None => return Ok(false)
            };

            if let Some(handler_pc) = self.find_handler(method.class, &code, pc, exception_class)? {
                debug!("Caught {} in {}.{} at {}", self.classes[exception_class].name,
                       self.classes[method.class].name, self.classes.method(method).name, handler_pc);
                let frame = thread.current_frame_mut()?;
                frame.stack.clear();
                frame.stack.push_ref(Some(exception))?;
                frame.next_pc = handler_pc;
                return Ok(true);
            }

            thread.pop_frame()?;
            debug!("Unwound {}.{} for {}", self.classes[method.class].name, self.classes.method(method).name,
                   self.classes[exception_class].name);
        }
    }

    /// Handlers are tried in table order. A catch type that cannot be resolved matches nothing.
    fn find_handler(&mut self, current: ClassRef, code: &Code, pc: usize, exception_class: ClassRef)
        -> VmResult<Option<usize>> {
        for handler in &code.exception_handlers {
            if pc < handler.start_pc || pc >= handler.end_pc {
                continue;
            }

            let catch_index = match handler.catch_type {
                None => return Ok(Some(handler.handler_pc)),
                Some(index) => index
            };
            let catch_class = match self.resolve_class(current, catch_index) {
                Ok(class) => class,
                Err(e) if e.is_internal() => return Err(e),
                Err(e) => {
                    debug!("Skipping handler at {}: {}", handler.handler_pc, e);
                    continue;
                }
            };

            if catch_class == exception_class || self.classes.is_subclass_of(exception_class, catch_class) {
                return Ok(Some(handler.handler_pc));
            }
        }
        Ok(None)
    }

    fn detail_message(&self, exception: ObjectRef) -> Option<String> {
        let class = self.heap[exception].class;
        let field = self.classes.lookup_field(class, "detailMessage", &detail_message_field())?;
        let slot_id = self.classes.field(field).slot_id;
        let string = self.heap[exception].fields().ok()?.get_ref(slot_id).ok()??;
        self.rust_string(string).ok()
    }

    /// `java.lang.Foo: message` followed by one `\tat` line per trace element.
    pub fn render_uncaught(&self, exception: ObjectRef) -> String {
        let mut text = self.classes[self.heap[exception].class].java_name();
        if let Some(message) = self.detail_message(exception) {
            text.push_str(": ");
            text.push_str(&message);
        }
        if let Extra::StackTrace(elements) = &self.heap[exception].extra {
            for element in elements {
                text.push_str("\n\tat ");
                text.push_str(&element.to_string());
            }
        }
        text
    }

    fn fail(&self, thread: &mut VMThread, message: String) {
        if log_enabled!(Level::Debug) {
            for frame in thread.frames() {
                debug!(">> pc:{:4} {}.{}{}", frame.pc, self.classes[frame.method.class].name,
                       self.classes.method(frame.method).name, self.classes.method(frame.method).descriptor);
            }
        }
        thread.clear_stack();
        thread.status = ThreadStatus::FAILED(message);
    }
}
