use log::info;
use crate::vm::class::class::ClassRef;
use crate::vm::class::method::MethodRef;
use crate::vm::error::VmResult;
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

impl Vm {
    /// Schedules the initialization of `class` on `thread`: its `<clinit>` frame is pushed
    /// first and the super class's on top of it, so the super class initializer completes
    /// before the subclass's body runs. The caller reverts its pc so the triggering
    /// instruction executes again afterwards.
    pub fn init_class(&mut self, thread: &mut VMThread, class: ClassRef) -> VmResult<()> {
        self.classes[class].init_started = true;
        info!("Initializing {}", self.classes[class].name);

        if let Some(index) = self.classes[class].clinit() {
            let frame = self.new_frame(MethodRef { class, index });
            thread.push_frame(frame)?;
        }

        if !self.classes[class].is_interface() {
            if let Some(super_class) = self.classes[class].super_class {
                if !self.classes[super_class].init_started {
                    self.init_class(thread, super_class)?;
                }
            }
        }

        Ok(())
    }
}
