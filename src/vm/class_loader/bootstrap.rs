use log::{debug, info};
use crate::class_parser::parse_class;
use crate::class_parser::types::ParsedClass;
use crate::class_parser::constants::CPTag;
use crate::class_parser::ParseError;
use crate::vm::class::class::{Class, ClassRef};
use crate::vm::class::constant_pool::{Constant, ConstantPool};
use crate::vm::class::field::{Field, FieldType};
use crate::vm::class::method::{Code, ExceptionHandler, Method, MethodDescriptor};
use crate::vm::class::name_parsers::java_name;
use crate::vm::error::{JavaErrorKind, VmError, VmResult};
use crate::vm::object::Extra;
use crate::vm::thread::slot::Slots;
use crate::vm::vm::Vm;

const CLASS_CLASS: &str = "java/lang/Class";

pub const PRIMITIVE_NAMES: [&str; 9] = ["void", "boolean", "byte", "char", "short", "int", "long", "float", "double"];

fn load_fields(parsed: &ParsedClass) -> Result<Vec<Field>, ParseError> {
    let mut fields = Vec::with_capacity(parsed.fields.len());
    for f in &parsed.fields {
        let name = parsed.utf8(f.name_index)?.to_string();
        let descriptor = FieldType::parse(parsed.utf8(f.descriptor_index)?)
            .ok_or(ParseError::BadConstant(f.descriptor_index, CPTag::Utf8))?;

        fields.push(Field {
            flag: f.access_flags,
            name,
            descriptor,
            class: ClassRef::UNASSIGNED,
            slot_id: 0,
            const_value_index: f.constant_value_index(),
        });
    }
    Ok(fields)
}

fn load_methods(parsed: &ParsedClass) -> Result<Vec<Method>, ParseError> {
    let mut methods = Vec::with_capacity(parsed.methods.len());
    for m in &parsed.methods {
        let name = parsed.utf8(m.name_index)?.to_string();
        let descriptor = MethodDescriptor::parse(parsed.utf8(m.descriptor_index)?)
            .ok_or(ParseError::BadConstant(m.descriptor_index, CPTag::Utf8))?;

        let code = m.code().map(|code| Code {
            max_stack: code.max_stack as usize,
            max_locals: code.max_locals as usize,
            code: code.code.clone(),
            exception_handlers: code.exception_table.iter().map(|e| ExceptionHandler {
                start_pc: e.start_pc as usize,
                end_pc: e.end_pc as usize,
                handler_pc: e.handler_pc as usize,
                catch_type: if e.catch_type == 0 { None } else { Some(e.catch_type) },
            }).collect(),
            line_numbers: code.line_numbers().iter().map(|l| (l.start_pc, l.line_number)).collect(),
        });

        let exceptions = m.exception_indices().iter()
            .map(|i| parsed.class_name_at(*i).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        methods.push(Method::new(m.access_flags, name, descriptor, code, exceptions));
    }
    Ok(methods)
}

/// Builds the (not yet linked) runtime class from its parsed class file.
pub fn define_class(parsed: &ParsedClass) -> Result<Class, ParseError> {
    let mut class = Class::new(
        parsed.access_flags,
        parsed.class_name()?.to_string(),
        parsed.super_class_name()?.map(str::to_string),
        parsed.interface_names()?.into_iter().map(str::to_string).collect());

    class.constant_pool = ConstantPool::from_parsed(parsed)?;
    class.fields = load_fields(parsed)?;
    class.methods = load_methods(parsed)?;
    class.source_file = parsed.source_file().map(str::to_string);

    Ok(class)
}

impl Vm {
    /// Returns the class named `name` (internal form), loading and linking it on first use.
    pub fn load_class(&mut self, name: &str) -> VmResult<ClassRef> {
        if let Some(class) = self.classes.find(name) {
            return Ok(class);
        }

        if name.starts_with('[') {
            self.load_array_class(name)
        } else if FieldType::from_primitive_name(name).is_some() {
            self.load_primitive_class(name)
        } else {
            self.load_non_array_class(name)
        }
    }

    /// Loads `java/lang/Class`, which attaches mirrors to everything loaded so far, and the
    /// primitive classes.
    pub fn load_basic_classes(&mut self) -> VmResult<()> {
        self.load_class(CLASS_CLASS)?;
        for name in PRIMITIVE_NAMES {
            self.load_class(name)?;
        }
        Ok(())
    }

    fn load_non_array_class(&mut self, name: &str) -> VmResult<ClassRef> {
        let file_name = format!("{}.class", name);
        let (bytes, source) = self.classes.classpath().read_class(&file_name).map_err(|e| {
            debug!("Could not read {}: {}", file_name, e);
            VmError::java(JavaErrorKind::ClassNotFoundException, java_name(name))
        })?;

        let format_error = |e: ParseError| VmError::java(JavaErrorKind::ClassFormatError,
                                                         format!("{} ({})", java_name(name), e));
        let parsed = parse_class(&bytes).map_err(format_error)?;
        let mut class = define_class(&parsed).map_err(format_error)?;
        if class.name != name {
            return Err(VmError::java(JavaErrorKind::ClassFormatError,
                                     format!("{} (wrong name: {})", java_name(name), class.name)));
        }

        if !self.classes.begin_loading(name) {
            return Err(VmError::java(JavaErrorKind::ClassCircularityError, java_name(name)));
        }
        let resolved = self.resolve_super_types(&mut class);
        self.classes.end_loading(name);
        resolved?;

        self.link(&mut class)?;

        let class = self.classes.add(class);
        info!("[Loaded {} from {}]", name, source);
        self.attach_mirror(class);
        Ok(class)
    }

    fn resolve_super_types(&mut self, class: &mut Class) -> VmResult<()> {
        if let Some(super_name) = class.super_name.clone() {
            let super_class = self.load_class(&super_name)?;
            if self.classes[super_class].is_interface() {
                return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                         format!("class {} has interface {} as super class",
                                                 class.java_name(), java_name(&super_name))));
            }
            class.super_class = Some(super_class);
        }

        let mut interfaces = Vec::with_capacity(class.interface_names.len());
        for name in class.interface_names.clone() {
            let iface = self.load_class(&name)?;
            if !self.classes[iface].is_interface() {
                return Err(VmError::java(JavaErrorKind::IncompatibleClassChangeError,
                                         format!("{} is not an interface", java_name(&name))));
            }
            interfaces.push(iface);
        }
        class.interfaces = interfaces;
        Ok(())
    }

    fn link(&mut self, class: &mut Class) -> VmResult<()> {
        verify(class)?;
        self.prepare(class)
    }

    /// Assigns field slots and materializes `static final` constants.
    fn prepare(&mut self, class: &mut Class) -> VmResult<()> {
        let mut instance_slots = class.super_class.map_or(0, |s| self.classes[s].instance_slot_count);
        let mut static_slots = 0;
        for f in &mut class.fields {
            if f.is_static() {
                f.slot_id = static_slots;
                static_slots += f.slot_count();
            } else {
                f.slot_id = instance_slots;
                instance_slots += f.slot_count();
            }
        }
        class.instance_slot_count = instance_slots;
        class.static_slot_count = static_slots;
        class.static_vars = Slots::new(static_slots);

        for i in 0..class.fields.len() {
            let field = &class.fields[i];
            let index = match field.const_value_index {
                Some(index) if field.is_static() && field.is_final() => index,
                _ => continue
            };
            let slot = field.slot_id;

            match class.constant_pool.get(index)?.clone() {
                Constant::Integer(v) => class.static_vars.set_int(slot, v)?,
                Constant::Long(v) => class.static_vars.set_long(slot, v)?,
                Constant::Float(v) => class.static_vars.set_float(slot, v)?,
                Constant::Double(v) => class.static_vars.set_double(slot, v)?,
                Constant::String(s) => {
                    let string = self.intern_string(&s)?;
                    class.static_vars.set_ref(slot, Some(string))?;
                }
                other => return Err(VmError::java(JavaErrorKind::ClassFormatError,
                                                  format!("bad ConstantValue {:?} for {}.{}", other,
                                                          class.java_name(), class.fields[i].name)))
            }
        }

        Ok(())
    }

    /// Gives `class` its `java/lang/Class` instance once that class exists. Loading
    /// `java/lang/Class` itself covers every class loaded before it.
    pub(crate) fn attach_mirror(&mut self, class: ClassRef) {
        let class_class = match self.classes.find(CLASS_CLASS) {
            Some(c) => c,
            None => return
        };

        let pending: Vec<ClassRef> = if class == class_class {
            self.classes.refs().filter(|c| self.classes[*c].mirror.is_none()).collect()
        } else {
            vec![class]
        };

        for c in pending {
            let mirror = self.new_object(class_class);
            self.heap[mirror].extra = Extra::Mirror(c);
            self.classes[c].mirror = Some(mirror);
        }
    }
}

/// Bytecode verification is not implemented.
fn verify(_class: &Class) -> VmResult<()> {
    Ok(())
}
