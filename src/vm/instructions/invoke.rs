use std::fmt::{Display, LowerExp};
use log::trace;
use crate::helper::{join_u64, utod};
use crate::vm::class::class::ClassRef;
use crate::vm::class::field::FieldType;
use crate::vm::class::method::MethodRef;
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::instructions::{Instruction, InstructionTable, null_pointer, Operands};
use crate::vm::instructions::reader::{index16, invokedynamic as invokedynamic_operands,
                                      invokeinterface as invokeinterface_operands, none};
use crate::vm::instructions::references::ensure_initialized;
use crate::vm::object::{ObjectData, ObjectRef};
use crate::vm::thread::slot::Slot;
use crate::vm::thread::thread::VMThread;
use crate::vm::vm::Vm;

pub fn register(table: &mut InstructionTable) {
    use Instruction as I;

    table.register(I::invokevirtual, index16, invokevirtual);
    table.register(I::invokespecial, index16, invokespecial);
    table.register(I::invokestatic, index16, invokestatic);
    table.register(I::invokeinterface, invokeinterface_operands, invokeinterface);
    table.register(I::invokedynamic, invokedynamic_operands, invokedynamic);
    table.register(I::invokenative, none, invokenative);
}

/// Moves the arguments of `method` from the invoker's operand stack into the local variables
/// of a new frame and makes that frame current.
pub(super) fn invoke_method(vm: &mut Vm, thread: &mut VMThread, method: MethodRef) -> VmResult<()> {
    let arg_slots = vm.classes.method(method).arg_slot_count;
    let args = thread.current_frame_mut()?.stack.pop_args(arg_slots)?;

    let mut frame = vm.new_frame(method);
    for (i, arg) in args.into_iter().enumerate() {
        frame.local_vars.set(i, arg)?;
    }
    trace!("Invoking {}.{}{}", vm.classes[method.class].name, vm.classes.method(method).name,
           vm.classes.method(method).descriptor);
    thread.push_frame(frame)
}

fn method_name(vm: &Vm, class: ClassRef, method: MethodRef) -> String {
    let m = vm.classes.method(method);
    format!("{}.{}{}", vm.classes[class].java_name(), m.name, m.descriptor)
}

/// The receiver sits below the arguments on the invoker's operand stack.
fn receiver(thread: &VMThread, arg_slots: usize) -> VmResult<Option<ObjectRef>> {
    Ok(thread.current_frame()?.stack.peek(arg_slots.saturating_sub(1))?.as_ref())
}

fn expect_instance_method(vm: &Vm, method: MethodRef) -> VmResult<()> {
    if vm.classes.method(method).is_static() {
        return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                 format!("Expected non-static method {}", method_name(vm, method.class, method))));
    }
    Ok(())
}

/// A protected member of a super class in another package may only be used on objects of
/// the current class or its subclasses. Arrays may always be cloned.
fn check_protected_access(vm: &Vm, current: ClassRef, method: MethodRef, object: ObjectRef) -> VmResult<()> {
    let classes = &vm.classes;
    let object_class = vm.heap[object].class;
    let m = classes.method(method);
    if classes[object_class].is_array() && m.name == "clone" {
        return Ok(());
    }
    if m.is_protected()
        && classes.is_subclass_of(current, method.class)
        && !classes.is_same_package(method.class, current)
        && object_class != current
        && !classes.is_subclass_of(object_class, current) {
        return Err(VmError::java(JavaErrorKind::IllegalAccessError, method_name(vm, method.class, method)));
    }
    Ok(())
}

fn invokestatic(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let current = thread.current_frame()?.method.class;
    let method = vm.resolve_method(current, operands.index()?)?;

    if !vm.classes.method(method).is_static() {
        return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                 format!("Expected static method {}", method_name(vm, method.class, method))));
    }
    if ensure_initialized(vm, thread, method.class)? {
        return Ok(());
    }

    invoke_method(vm, thread, method)
}

/// Constructors, private methods and `super.m()` calls.
fn invokespecial(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let index = operands.index()?;
    let current = thread.current_frame()?.method.class;
    let resolved_class = vm.resolve_method_class(current, index)?;
    let method = vm.resolve_method(current, index)?;

    let m = vm.classes.method(method);
    let is_init = m.name == "<init>";
    if is_init && method.class != resolved_class {
        return Err(VmError::java(JavaErrorKind::NoSuchMethodError, method_name(vm, resolved_class, method)));
    }
    expect_instance_method(vm, method)?;

    let this = receiver(thread, m.arg_slot_count)?.ok_or_else(null_pointer)?;
    check_protected_access(vm, current, method, this)?;

    let target = if vm.classes[current].is_super() && !is_init
        && vm.classes.is_subclass_of(current, resolved_class) {
        let (name, descriptor) = (&m.name, &m.descriptor);
        vm.classes[current].super_class
            .and_then(|s| vm.classes.lookup_method_in_class(s, name, descriptor))
    } else {
        Some(method)
    };

    match target {
        Some(target) if !vm.classes.method(target).is_abstract() => invoke_method(vm, thread, target),
        _ => Err(VmError::java(JavaErrorKind::AbstractMethodError, method_name(vm, resolved_class, method)))
    }
}

fn invokevirtual(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let current = thread.current_frame()?.method.class;
    let method = vm.resolve_method(current, operands.index()?)?;
    expect_instance_method(vm, method)?;

    let arg_slots = vm.classes.method(method).arg_slot_count;
    let this = match receiver(thread, arg_slots)? {
        Some(this) => this,
        None if is_print(vm, method) => return print_to_stdout(vm, thread, method),
        None => return Err(null_pointer())
    };
    check_protected_access(vm, current, method, this)?;

    let runtime_class = vm.heap[this].class;
    let m = vm.classes.method(method);
    match vm.classes.lookup_method(runtime_class, &m.name, &m.descriptor) {
        Some(target) if !vm.classes.method(target).is_abstract() => invoke_method(vm, thread, target),
        _ => Err(VmError::java(JavaErrorKind::AbstractMethodError, method_name(vm, runtime_class, method)))
    }
}

fn invokeinterface(vm: &mut Vm, thread: &mut VMThread, operands: &Operands) -> VmResult<()> {
    let index = match operands {
        Operands::IndexCount(index, _) => *index,
        other => return Err(VmError::internal(format!("invokeinterface with {:?}", other)))
    };
    let current = thread.current_frame()?.method.class;
    let method = vm.resolve_interface_method(current, index)?;

    let m = vm.classes.method(method);
    if m.is_static() || m.is_private() {
        return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                 format!("Expected public instance method {}", method_name(vm, method.class, method))));
    }

    let this = receiver(thread, m.arg_slot_count)?.ok_or_else(null_pointer)?;
    let runtime_class = vm.heap[this].class;
    if !vm.classes.implements(runtime_class, method.class) {
        return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                 format!("Class {} does not implement the requested interface {}",
                                         vm.classes[runtime_class].java_name(), vm.classes[method.class].java_name())));
    }

    let target = vm.classes.lookup_method(runtime_class, &m.name, &m.descriptor)
        .filter(|t| !vm.classes.method(*t).is_abstract())
        .ok_or_else(|| VmError::java(JavaErrorKind::AbstractMethodError, method_name(vm, runtime_class, method)))?;
    if !vm.classes.method(target).is_public() {
        return Err(VmError::java(JavaErrorKind::IllegalAccessError, method_name(vm, target.class, target)));
    }

    invoke_method(vm, thread, target)
}

fn invokedynamic(_: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    Err(VmError::internal(format!("invokedynamic is not supported (pc {})", thread.pc)))
}

/// Body of native methods: runs the host function registered for the current method.
fn invokenative(vm: &mut Vm, thread: &mut VMThread, _: &Operands) -> VmResult<()> {
    let method = thread.current_frame()?.method;
    let m = vm.classes.method(method);
    let native = vm.natives.find(&vm.classes[method.class].name, &m.name, &m.descriptor.to_string())?;
    native(vm, thread)
}

fn is_print(vm: &Vm, method: MethodRef) -> bool {
    let m = vm.classes.method(method);
    vm.classes[method.class].name == "java/io/PrintStream"
        && (m.name == "print" || m.name == "println")
        && m.descriptor.parameters.len() <= 1
}

/// `System.out` stays null while `System.initializeSystemClass` has not run, so a print
/// through a null `PrintStream` writes to the host's stdout instead.
fn print_to_stdout(vm: &Vm, thread: &mut VMThread, method: MethodRef) -> VmResult<()> {
    let m = vm.classes.method(method);
    let newline = m.name == "println";
    let parameter = m.descriptor.parameters.first().cloned();

    let args = thread.current_frame_mut()?.stack.pop_args(m.arg_slot_count)?;
    let text = match parameter {
        Some(t) => format_value(vm, &t, &args[1..])?,
        None => String::new()
    };

    if newline {
        println!("{}", text);
    } else {
        print!("{}", text);
    }
    Ok(())
}

/// Java's `toString` layout for floating point numbers: integral values keep a `.0`, large
/// and small magnitudes use scientific notation with `E`. `v` is printed at its own precision.
fn java_decimal<T: Display + LowerExp>(v: T, as_double: f64) -> String {
    if as_double.is_nan() {
        "NaN".to_string()
    } else if as_double.is_infinite() {
        if as_double > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if as_double == 0.0 || (1e-3..1e7).contains(&as_double.abs()) {
        let s = v.to_string();
        if s.contains('.') { s } else { format!("{}.0", s) }
    } else {
        let s = format!("{:e}", v);
        match s.split_once('e') {
            Some((mantissa, exponent)) if !mantissa.contains('.') => format!("{}.0E{}", mantissa, exponent),
            Some((mantissa, exponent)) => format!("{}E{}", mantissa, exponent),
            None => s
        }
    }
}

/// Renders the value in `slots` the way `PrintStream.print` of the given type would.
fn format_value(vm: &Vm, t: &FieldType, slots: &[Slot]) -> VmResult<String> {
    let first = slots.first().copied().unwrap_or_default();
    Ok(match t {
        FieldType::Z => (first.as_int() != 0).to_string(),
        FieldType::C => String::from_utf16_lossy(&[first.as_int() as u16]),
        FieldType::B | FieldType::S | FieldType::I => first.as_int().to_string(),
        FieldType::J => {
            let high = slots.get(1).copied().unwrap_or_default();
            (join_u64(first.as_int(), high.as_int()) as i64).to_string()
        }
        FieldType::F => {
            let f = f32::from_bits(first.as_int() as u32);
            java_decimal(f, f as f64)
        }
        FieldType::D => {
            let high = slots.get(1).copied().unwrap_or_default();
            let d = utod(join_u64(first.as_int(), high.as_int()));
            java_decimal(d, d)
        }
        FieldType::L(_) | FieldType::A(_) => match first.as_ref() {
            None => "null".to_string(),
            Some(object) => {
                let class = &vm.classes[vm.heap[object].class];
                match class.name.as_str() {
                    "java/lang/String" => vm.rust_string(object)?,
                    "[C" => match &vm.heap[object].data {
                        ObjectData::Chars(chars) => String::from_utf16_lossy(chars),
                        _ => String::new()
                    },
                    _ => format!("{}@{:x}", class.java_name(), object.identity_hash())
                }
            }
        },
        FieldType::V => String::new()
    })
}
