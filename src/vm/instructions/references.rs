use crate::vm::class::class::ClassRef;
use crate::vm::class::field::{FieldRef, FieldType};
use crate::vm::class::name_parsers::array_class_name;
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::instructions::{Instruction, InstructionTable, null_pointer, Operands};
use crate::vm::object::ObjectRef;
use crate::vm::instructions::reader::{byte, index16, multianewarray as multianewarray_operands, none};
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::getstatic, index16, getstatic);
    table.register(I::putstatic, index16, putstatic);
    table.register(I::getfield, index16, getfield);
    table.register(I::putfield, index16, putfield);
    table.register(I::new, index16, new);
    table.register(I::newarray, byte, newarray);
    table.register(I::anewarray, index16, anewarray);
    table.register(I::multianewarray, multianewarray_operands, multianewarray);
    table.register(I::arraylength, none, arraylength);
    table.register(I::athrow, none, athrow);
    table.register(I::checkcast, index16, checkcast);
    table.register(I::instanceof, index16, instanceof);
    table.register(I::monitorenter, none, monitor);
    table.register(I::monitorexit, none, monitor);
}

/// Schedules initialization of `class` if it has not started yet. Returns `true` when the
/// current instruction was rolled back and has to wait for the initializer frames.
pub(super) fn ensure_initialized(vm: &mut Vm, thread: &mut VMThread, class: ClassRef) -> VmResult<bool> {
    if vm.classes[class].init_started {
        return Ok(false);
    }
    thread.current_frame_mut()?.revert_next_pc();
    vm.init_class(thread, class)?;
    Ok(true)
}

/// Resolves the field operand, checking it is (or is not) static. Returns the field with its
/// first slot and slot count.
fn field_operand(vm: &mut Vm, thread: &VMThread, operands: &Operands, is_static: bool)
    -> VmResult<(FieldRef, usize, usize)> {
    let current = thread.current_frame()?.method.class;
    let field = vm.resolve_field(current, operands.index()?)?;

    let f = vm.classes.field(field);
    if f.is_static() != is_static {
        let expected = if is_static { "static" } else { "non-static" };
        return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                 format!("Expected {} field {}.{}", expected,
                                         vm.classes[field.class].java_name(), f.name)));
    }
    Ok((field, f.slot_id, f.slot_count()))
}

/// Final fields may only be assigned by their declaring class.
fn check_final_store(vm: &Vm, thread: &VMThread, field: FieldRef) -> VmResult<()> {
    let f = vm.classes.field(field);
    if f.is_final() && thread.current_frame()?.method.class != field.class {
        return Err(VmError::java(JavaErrorKind::IllegalAccessError,
                                 format!("Update to final field {}.{} attempted from {}",
                                         vm.classes[field.class].java_name(), f.name,
                                         vm.classes[thread.current_frame()?.method.class].java_name())));
    }
    Ok(())
}

fn getstatic(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let (field, slot_id, slots) = field_operand(vm, thread, operands, true)?;
    if ensure_initialized(vm, thread, field.class)? {
        return Ok(());
    }

    let statics = &vm.classes[field.class].static_vars;
    let stack = &mut thread.current_frame_mut()?.stack;
    for i in 0..slots {
        stack.push_slot(statics.get(slot_id + i)?)?;
    }
    Ok(())
}

fn putstatic(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let (field, slot_id, slots) = field_operand(vm, thread, operands, true)?;
    check_final_store(vm, thread, field)?;
    if ensure_initialized(vm, thread, field.class)? {
        return Ok(());
    }

    let values = thread.current_frame_mut()?.stack.pop_args(slots)?;
    let statics = &mut vm.classes[field.class].static_vars;
    for (i, v) in values.into_iter().enumerate() {
        statics.set(slot_id + i, v)?;
    }
    Ok(())
}

fn getfield(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let (_, slot_id, slots) = field_operand(vm, thread, operands, false)?;

    let stack = &mut thread.current_frame_mut()?.stack;
    let object = stack.pop_ref()?.ok_or_else(null_pointer)?;
    let fields = vm.heap[object].fields()?;
    for i in 0..slots {
        stack.push_slot(fields.get(slot_id + i)?)?;
    }
    Ok(())
}

fn putfield(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let (field, slot_id, slots) = field_operand(vm, thread, operands, false)?;
    check_final_store(vm, thread, field)?;

    let stack = &mut thread.current_frame_mut()?.stack;
    let values = stack.pop_args(slots)?;
    let object = stack.pop_ref()?.ok_or_else(null_pointer)?;
    let fields = vm.heap[object].fields_mut()?;
    for (i, v) in values.into_iter().enumerate() {
        fields.set(slot_id + i, v)?;
    }
    Ok(())
}

fn new(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let current = thread.current_frame()?.method.class;
    let class = vm.resolve_class(current, operands.index()?)?;

    let c = &vm.classes[class];
    if c.is_interface() || c.is_abstract() {
        return Err(VmError::java(JavaErrorKind::InstantiationError, c.java_name()));
    }
    if ensure_initialized(vm, thread, class)? {
        return Ok(());
    }

    let object = vm.new_object(class);
    thread.current_frame_mut()?.stack.push_ref(Some(object))
}

fn newarray(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let class = vm.load_class(FieldType::convert_newarray_type(operands.int()? as u8)?)?;

    let stack = &mut thread.current_frame_mut()?.stack;
    let length = stack.pop_int()?;
    let array = vm.new_array(class, length)?;
    stack.push_ref(Some(array))
}

fn anewarray(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let current = thread.current_frame()?.method.class;
    let component = vm.resolve_class(current, operands.index()?)?;
    let name = array_class_name(&vm.classes[component].name);
    let class = vm.load_class(&name)?;

    let stack = &mut thread.current_frame_mut()?.stack;
    let length = stack.pop_int()?;
    let array = vm.new_array(class, length)?;
    stack.push_ref(Some(array))
}

/// Allocates the nested arrays of `class` for the dimension lengths in `counts`, outermost first.
fn new_multi_array(vm: &mut Vm, class: ClassRef, counts: &[i32]) -> VmResult<ObjectRef> {
    match counts {
        [] => Err(VmError::internal("multianewarray without dimensions")),
        [length] => vm.new_array(class, *length),
        [length, rest @ ..] => {
            let component = vm.classes[class].component_class.filter(|c| vm.classes[*c].is_array())
                .ok_or_else(|| VmError::internal(format!("{} has fewer than {} dimensions",
                                                         vm.classes[class].name, counts.len())))?;
            let mut elements = Vec::with_capacity(*length as usize);
            for _ in 0..*length {
                elements.push(Some(new_multi_array(vm, component, rest)?));
            }
            Ok(vm.new_ref_array(class, elements))
        }
    }
}

fn multianewarray(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let (index, dimensions) = match operands {
        Operands::IndexCount(index, dimensions) => (*index, *dimensions as usize),
        other => return Err(VmError::internal(format!("multianewarray with {:?}", other)))
    };
    let current = thread.current_frame()?.method.class;
    let class = vm.resolve_class(current, index)?;

    let stack = &mut thread.current_frame_mut()?.stack;
    let counts = stack.pop_args(dimensions)?.iter().map(|s| s.as_int()).collect::<Vec<_>>();
    if let Some(negative) = counts.iter().find(|c| **c < 0) {
        return Err(VmError::java(JavaErrorKind::NegativeArraySizeException, negative.to_string()));
    }

    let array = new_multi_array(vm, class, &counts)?;
    thread.current_frame_mut()?.stack.push_ref(Some(array))
}

fn arraylength(vm: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    let stack = &mut thread.current_frame_mut()?.stack;
    let array = stack.pop_ref()?.ok_or_else(null_pointer)?;
    stack.push_int(vm.array_length(array)? as i32)
}

/// The thrown object travels as an error value to the exception dispatcher.
fn athrow(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    let exception = thread.current_frame_mut()?.stack.pop_ref()?.ok_or_else(null_pointer)?;
    Err(VmError::Thrown(exception))
}

fn checkcast(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let current = thread.current_frame()?.method.class;
    let class = vm.resolve_class(current, operands.index()?)?;

    if let Some(object) = thread.current_frame()?.stack.peek(0)?.as_ref() {
        let from = vm.heap[object].class;
        if !vm.classes.is_assignable(from, class) {
            return Err(VmError::java(JavaErrorKind::ClassCastException,
                                     format!("{} cannot be cast to {}", vm.classes[from].java_name(),
                                             vm.classes[class].java_name())));
        }
    }
    Ok(())
}

fn instanceof(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let current = thread.current_frame()?.method.class;
    let class = vm.resolve_class(current, operands.index()?)?;

    let stack = &mut thread.current_frame_mut()?.stack;
    let result = match stack.pop_ref()? {
        Some(object) => vm.classes.is_assignable(vm.heap[object].class, class),
        None => false
    };
    stack.push_bool(result)
}

/// There is only one thread, so monitors reduce to their null check.
fn monitor(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    thread.current_frame_mut()?.stack.pop_ref()?.ok_or_else(null_pointer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::vm::object::ObjectData;
    use crate::vm::testing::{ClassBuilder, test_vm};
    use crate::vm::thread::slot::Slot;
    use crate::vm::thread::thread::ThreadStatus;

    fn failure(status: ThreadStatus) -> String {
        match status {
            ThreadStatus::FAILED(message) => message,
            other => panic!("expected a failure, got {:?}", other)
        }
    }

    #[test]
    fn instance_fields() {
        let mut point = ClassBuilder::new("pkg/Point", Some("java/lang/Object"));
        point.field(0x0001, "x", "I");
        point.field(0x0001, "y", "J");
        let x = point.field_ref("pkg/Point", "x", "I");
        let y = point.field_ref("pkg/Point", "y", "J");
        let class = point.class_ref("pkg/Point");
        // Point p = new Point(); p.x = 3; p.y = 1L << 33; return p.x + (int) (p.y >> 32);
        point.method(0x0009, "run", "()I", 4, 1, vec![
            0xbb, (class >> 8) as u8, class as u8, 0x4b,        // 0: new; astore_0
            0x2a, 0x06, 0xb5, (x >> 8) as u8, x as u8,          // 4: aload_0 iconst_3 putfield x
            0x2a, 0x0a, 0x10, 33, 0x79,                         // 9: aload_0 lconst_1 bipush 33 lshl
            0xb5, (y >> 8) as u8, y as u8,                      // 14: putfield y
            0x2a, 0xb4, (x >> 8) as u8, x as u8,                // 17: aload_0 getfield x
            0x2a, 0xb4, (y >> 8) as u8, y as u8,                // 21: aload_0 getfield y
            0x10, 32, 0x7b, 0x88, 0x60, 0xac,                   // 25: bipush 32 lshr l2i iadd ireturn
        ]);
        point.method(0x0009, "npe", "()I", 2, 0, vec![0x01, 0xb4, (x >> 8) as u8, x as u8, 0xac]);
        let mut vm = test_vm(vec![point.build()]);

        assert_eq!(vm.run_static("pkg/Point", "run", "()I", &[]),
                   ThreadStatus::FINISHED([Slot::Num(5)].into_iter().collect()));
        assert!(failure(vm.run_static("pkg/Point", "npe", "()I", &[]))
            .starts_with("java.lang.NullPointerException"));
    }

    #[test]
    fn static_field_kind_mismatch() {
        let mut a = ClassBuilder::new("pkg/Kinds", Some("java/lang/Object"));
        a.field(0x0001, "plain", "I");
        let plain = a.field_ref("pkg/Kinds", "plain", "I");
        a.method(0x0009, "run", "()I", 1, 0, vec![0xb2, (plain >> 8) as u8, plain as u8, 0xac]);
        let mut vm = test_vm(vec![a.build()]);

        assert!(failure(vm.run_static("pkg/Kinds", "run", "()I", &[]))
            .starts_with("java.lang.IncompatibleClassChangeError: Expected static field pkg.Kinds.plain"));
    }

    #[test]
    fn final_fields_belong_to_their_class() {
        let mut owner = ClassBuilder::new("pkg/Owner", Some("java/lang/Object"));
        owner.field(0x0019, "LIMIT", "I");
        let mut other = ClassBuilder::new("pkg/Other", Some("java/lang/Object"));
        let limit = other.field_ref("pkg/Owner", "LIMIT", "I");
        other.method(0x0009, "run", "()V", 1, 0, vec![0x04, 0xb3, (limit >> 8) as u8, limit as u8, 0xb1]);
        let mut vm = test_vm(vec![owner.build(), other.build()]);

        assert!(failure(vm.run_static("pkg/Other", "run", "()V", &[]))
            .starts_with("java.lang.IllegalAccessError: Update to final field pkg.Owner.LIMIT"));
    }

    #[test]
    fn abstract_classes_cannot_be_instantiated() {
        let shape = ClassBuilder::with_flags(0x0421, "pkg/Shape", Some("java/lang/Object")).build();
        let mut a = ClassBuilder::new("pkg/Factory", Some("java/lang/Object"));
        let class = a.class_ref("pkg/Shape");
        a.method(0x0009, "make", "()Ljava/lang/Object;", 1, 0, vec![0xbb, (class >> 8) as u8, class as u8, 0xb0]);
        let mut vm = test_vm(vec![shape, a.build()]);

        assert!(failure(vm.run_static("pkg/Factory", "make", "()Ljava/lang/Object;", &[]))
            .starts_with("java.lang.InstantiationError: pkg.Shape"));
    }

    #[test]
    fn multi_dimensional_arrays() {
        let mut a = ClassBuilder::new("pkg/Grid", Some("java/lang/Object"));
        let class = a.class_ref("[[[I");
        a.method(0x0009, "make", "(II)Ljava/lang/Object;", 2, 2, vec![
            0x1a, 0x1b, 0xc5, (class >> 8) as u8, class as u8, 2, 0xb0,   // new int[a][b][]
        ]);
        let mut vm = test_vm(vec![a.build()]);

        let grid = match vm.run_static("pkg/Grid", "make", "(II)Ljava/lang/Object;", &[Slot::Num(2), Slot::Num(3)]) {
            ThreadStatus::FINISHED(values) => values[0].as_ref().unwrap(),
            other => panic!("{:?}", other)
        };
        assert_eq!(vm.classes[vm.heap[grid].class].name, "[[[I");
        let rows = match &vm.heap[grid].data {
            ObjectData::Refs(rows) => rows.clone(),
            other => panic!("{:?}", other)
        };
        assert_eq!(rows.len(), 2);
        let row = rows[1].unwrap();
        assert_eq!(vm.classes[vm.heap[row].class].name, "[[I");
        assert_eq!(vm.heap[row].data, ObjectData::Refs(vec![None, None, None]));

        assert!(failure(vm.run_static("pkg/Grid", "make", "(II)Ljava/lang/Object;", &[Slot::Num(2), Slot::Num(-3)]))
            .starts_with("java.lang.NegativeArraySizeException: -3"));
    }

    #[test]
    fn casts_and_instanceof() {
        let mut a = ClassBuilder::new("pkg/Cast", Some("java/lang/Object"));
        let string = a.class_ref("java/lang/String");
        let cloneable = a.class_ref("java/lang/Cloneable");
        a.method(0x0009, "isString", "(Ljava/lang/Object;)Z", 1, 1,
                 vec![0x2a, 0xc1, (string >> 8) as u8, string as u8, 0xac]);
        a.method(0x0009, "toString", "(Ljava/lang/Object;)Ljava/lang/String;", 1, 1,
                 vec![0x2a, 0xc0, (string >> 8) as u8, string as u8, 0xb0]);
        a.method(0x0009, "isCloneable", "(Ljava/lang/Object;)Z", 1, 1,
                 vec![0x2a, 0xc1, (cloneable >> 8) as u8, cloneable as u8, 0xac]);
        let mut vm = test_vm(vec![a.build()]);

        let s = vm.new_string("s").unwrap();
        let ints = vm.load_class("[I").unwrap();
        let array = vm.new_array(ints, 1).unwrap();

        let yes = ThreadStatus::FINISHED([Slot::Num(1)].into_iter().collect());
        let no = ThreadStatus::FINISHED([Slot::Num(0)].into_iter().collect());
        assert_eq!(vm.run_static("pkg/Cast", "isString", "(Ljava/lang/Object;)Z", &[Slot::Ref(Some(s))]), yes);
        assert_eq!(vm.run_static("pkg/Cast", "isString", "(Ljava/lang/Object;)Z", &[Slot::NULL]), no);
        assert_eq!(vm.run_static("pkg/Cast", "isCloneable", "(Ljava/lang/Object;)Z", &[Slot::Ref(Some(array))]), yes);

        assert_eq!(vm.run_static("pkg/Cast", "toString", "(Ljava/lang/Object;)Ljava/lang/String;", &[Slot::NULL]),
                   ThreadStatus::FINISHED([Slot::NULL].into_iter().collect()));
        assert!(failure(vm.run_static("pkg/Cast", "toString", "(Ljava/lang/Object;)Ljava/lang/String;",
                                      &[Slot::Ref(Some(array))]))
            .starts_with("java.lang.ClassCastException: [I cannot be cast to java.lang.String"));
    }

    #[test]
    fn throwing_null() {
        let mut a = ClassBuilder::new("pkg/Throw", Some("java/lang/Object"));
        a.method(0x0009, "run", "()V", 1, 0, vec![0x01, 0xbf]);
        a.method(0x0009, "lock", "()V", 1, 0, vec![0x01, 0xc2, 0xb1]);
        let mut vm = test_vm(vec![a.build()]);

        assert!(failure(vm.run_static("pkg/Throw", "run", "()V", &[])).starts_with("java.lang.NullPointerException"));
        assert!(failure(vm.run_static("pkg/Throw", "lock", "()V", &[])).starts_with("java.lang.NullPointerException"));
    }
}
