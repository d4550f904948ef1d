use crate::vm::class::field::FieldType;
use crate::vm::class::method::MethodDescriptor;

impl MethodDescriptor {
    fn parse_field_type(str: &str, is_parameter: bool) -> (Option<FieldType>, &str) {
        match str.get(0..1).unwrap_or("") {
            "B" => (Some(FieldType::B), &str[1..]),
            "C" => (Some(FieldType::C), &str[1..]),
            "D" => (Some(FieldType::D), &str[1..]),
            "F" => (Some(FieldType::F), &str[1..]),
            "I" => (Some(FieldType::I), &str[1..]),
            "J" => (Some(FieldType::J), &str[1..]),
            "L" => {
                match str.find(';') {
                    Some(end) if end > 1 && !str[1..end].contains(')') =>
                        (Some(FieldType::L(str[1..end].to_string())), &str[end+1..]),
                    _ => (None, str)
                }
            },
            "S" => (Some(FieldType::S), &str[1..]),
            "Z" => (Some(FieldType::Z), &str[1..]),
            "[" => {
                match Self::parse_field_type(&str[1..], true) {
                    (Some(component), rest) => (Some(FieldType::A(Box::new(component))), rest),
                    _ => (None, str)
                }
            },
            "V" => if is_parameter {
                (None, str)
            } else {
                (Some(FieldType::V), &str[1..])
            }
            _ => (None, str)
        }
    }

    pub fn parse(mut str: &str) -> Option<Self> {
        str = str.strip_prefix('(')?;

        let mut parameters = vec![];
        while let (Some(arg), rest) = Self::parse_field_type(str, true) {
            parameters.push(arg);
            str = rest;
        }

        str = str.strip_prefix(')')?;

        match Self::parse_field_type(str, false) {
            (Some(ret), rest) if rest.is_empty() => Some(MethodDescriptor {
                parameters,
                ret,
            }),
            _ => None
        }
    }
}

impl FieldType {
    pub fn parse(str: &str) -> Option<Self> {
        match MethodDescriptor::parse_field_type(str, true) {
            (Some(t), rest) if rest.is_empty() => Some(t),
            _ => None
        }
    }

    /// Field type for a class name as found in `Class` constants: array names are
    /// descriptors already, everything else is an object type.
    pub fn from_class_name(name: &str) -> Option<Self> {
        if name.starts_with('[') {
            FieldType::parse(name)
        } else {
            Some(FieldType::L(name.to_string()))
        }
    }

    pub fn from_primitive_name(name: &str) -> Option<Self> {
        Some(match name {
            "byte" => FieldType::B,
            "char" => FieldType::C,
            "double" => FieldType::D,
            "float" => FieldType::F,
            "int" => FieldType::I,
            "long" => FieldType::J,
            "short" => FieldType::S,
            "boolean" => FieldType::Z,
            "void" => FieldType::V,
            _ => return None
        })
    }
}

/// Name of the array class whose components are of class `name`.
pub fn array_class_name(name: &str) -> String {
    if name.starts_with('[') {
        format!("[{}", name)
    } else if let Some(primitive) = FieldType::from_primitive_name(name) {
        format!("[{}", primitive)
    } else {
        format!("[L{};", name)
    }
}

/// Component class name of an array class: `[[I` -> `[I`, `[I` -> `int`,
/// `[Ljava/lang/String;` -> `java/lang/String`.
pub fn component_class_name(array_name: &str) -> Option<String> {
    match FieldType::parse(array_name)? {
        FieldType::A(component) => Some(component.class_name()),
        _ => None
    }
}

pub fn java_name(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use crate::vm::class::field::FieldType::*;
    use crate::vm::class::method::MethodDescriptor;
    use crate::vm::class::field::FieldType;
    use crate::vm::class::name_parsers::{array_class_name, component_class_name};

    #[test]
    fn parse_method_descriptor() {
        assert_eq!(MethodDescriptor::parse("()V"), Some(MethodDescriptor { parameters: vec![],
            ret: V }));

        assert_eq!(MethodDescriptor::parse("()[Ljava/lang/String;"), Some(MethodDescriptor { parameters: vec![],
            ret: A(Box::from(L(String::from("java/lang/String")))) }));

        assert_eq!(MethodDescriptor::parse("(IV)I"), None);
        assert_eq!(MethodDescriptor::parse("(I)I "), None);
        assert_eq!(MethodDescriptor::parse(""), None);
        assert_eq!(MethodDescriptor::parse("(IJ[[Ljava/lang/String;)I"),
                   Some(MethodDescriptor {
                       parameters: vec![I, J, A(Box::new(A(Box::new(L(
                           String::from("java/lang/String"))))))],
                       ret: I
                   }));
    }

    #[test]
    fn descriptors_encode_back() {
        for d in ["(IJ[[Ljava/lang/String;)I", "()V", "([BZ)Ljava/lang/Object;"] {
            assert_eq!(MethodDescriptor::parse(d).unwrap().to_string(), d);
        }
        assert_eq!(FieldType::parse("I;"), None);
    }

    #[test]
    fn array_names() {
        assert_eq!(array_class_name("int"), "[I");
        assert_eq!(array_class_name("java/lang/String"), "[Ljava/lang/String;");
        assert_eq!(array_class_name("[I"), "[[I");

        assert_eq!(component_class_name("[[I").as_deref(), Some("[I"));
        assert_eq!(component_class_name("[Z").as_deref(), Some("boolean"));
        assert_eq!(component_class_name("[Ljava/lang/Object;").as_deref(), Some("java/lang/Object"));
        assert_eq!(component_class_name("java/lang/Object"), None);
    }
}
