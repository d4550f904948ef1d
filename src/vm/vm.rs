use log::debug;
use crate::classpath::ClassSource;
use crate::vm::class::class::ClassRef;
use crate::vm::class::method::MethodRef;
use crate::vm::class_loader::ClassLoader;
use crate::vm::class_loader::native::NativeRegistry;
use crate::vm::error::VmResult;
use crate::vm::object::ObjectRef;
use crate::vm::pool::object::ObjectArena;
use crate::vm::pool::string::StringPool;
use crate::vm::thread::frame::Frame;
use crate::vm::thread::slot::Slot;
use crate::vm::thread::thread::{DEFAULT_MAX_STACK_DEPTH, ThreadStatus, VMThread};

#[derive(Debug, Clone, PartialEq)]
pub struct VmOptions {
    pub max_stack_depth: usize,
    /// Log every executed instruction at trace level.
    pub verbose_inst: bool,
}

impl Default for VmOptions {
    fn default() -> Self {
        VmOptions {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            verbose_inst: false,
        }
    }
}

/// All state shared by the threads of one VM. Single threaded: every mutation goes through
/// `&mut Vm`. Interpreting on several OS threads would need a lock around the class table and
/// a compare-and-set on `Class::init_started`.
pub struct Vm {
    pub classes: ClassLoader,
    pub heap: ObjectArena,
    pub strings: StringPool,
    pub natives: NativeRegistry,
    pub options: VmOptions,
}

impl Vm {
    pub fn new(classpath: Box<dyn ClassSource>, options: VmOptions) -> Vm {
        let mut natives = NativeRegistry::default();
        natives.register_defaults();

        Vm {
            classes: ClassLoader::new(classpath),
            heap: ObjectArena::default(),
            strings: StringPool::default(),
            natives,
            options,
        }
    }

    pub fn new_frame(&self, method: MethodRef) -> Frame {
        Frame::new(method, self.classes.method(method).code.clone())
    }

    pub fn main_method(&self, class: ClassRef) -> Option<MethodRef> {
        self.classes[class].main_method().map(|index| MethodRef { class, index })
    }

    /// Runs `method` on a fresh thread until it returns or fails. `args` become the first
    /// local variables.
    pub fn interpret(&mut self, method: MethodRef, args: &[Slot]) -> ThreadStatus {
        let mut thread = VMThread::new(self.options.max_stack_depth);

        let mut frame = self.new_frame(method);
        for (i, arg) in args.iter().enumerate() {
            if let Err(e) = frame.local_vars.set(i, *arg) {
                return ThreadStatus::FAILED(e.to_string());
            }
        }
        if let Err(e) = thread.push_frame(frame) {
            return ThreadStatus::FAILED(e.to_string());
        }
        if !self.classes[method.class].init_started {
            if let Err(e) = self.init_class(&mut thread, method.class) {
                return ThreadStatus::FAILED(e.to_string());
            }
        }

        self.run(&mut thread);
        debug!("Thread finished with {:?}", thread.status);
        thread.status
    }

    /// `String[]` holding the program arguments, passed to `main`.
    pub fn string_array(&mut self, values: &[String]) -> VmResult<ObjectRef> {
        let class = self.load_class("[Ljava/lang/String;")?;
        let mut strings = Vec::with_capacity(values.len());
        for v in values {
            strings.push(Some(self.new_string(v)?));
        }
        Ok(self.new_ref_array(class, strings))
    }
}
