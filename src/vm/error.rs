use strum_macros::{Display, EnumString, IntoStaticStr};
use thiserror::Error;
use crate::vm::object::ObjectRef;

/// JVM-level throwables the VM raises itself. They travel through the same dispatch as an
/// explicit `athrow`, so interpreted handlers can catch them.
#[derive(Debug, Display, EnumString, IntoStaticStr, Copy, Clone, PartialEq, Eq, Hash)]
pub enum JavaErrorKind {
    NullPointerException,
    ClassCastException,
    NegativeArraySizeException,
    ArrayIndexOutOfBoundsException,
    ArrayStoreException,
    ArithmeticException,
    CloneNotSupportedException,
    ClassNotFoundException,
    NoSuchFieldError,
    NoSuchMethodError,
    IllegalAccessError,
    IncompatibleClassChangeError,
    AbstractMethodError,
    ClassFormatError,
    ClassCircularityError,
    StackOverflowError,
    UnsatisfiedLinkError,
    InstantiationError,
}

impl JavaErrorKind {
    /// Internal (slash separated) name of the class representing this throwable.
    pub fn class_name(&self) -> String {
        format!("java/lang/{}", self)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VmError {
    /// A throwable raised by the VM which still has to be materialized as an object.
    #[error("java.lang.{kind}: {message}")]
    Java { kind: JavaErrorKind, message: String },
    /// An already allocated throwable, e.g. the operand of `athrow`.
    #[error("exception object {0:?}")]
    Thrown(ObjectRef),
    /// A broken internal contract. Never visible to interpreted code.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VmError {
    pub fn java(kind: JavaErrorKind, message: impl Into<String>) -> VmError {
        VmError::Java { kind, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> VmError {
        VmError::Internal(message.into())
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, VmError::Internal(_))
    }

    pub fn kind(&self) -> Option<JavaErrorKind> {
        match self {
            VmError::Java { kind, .. } => Some(*kind),
            _ => None
        }
    }
}

pub type VmResult<T> = Result<T, VmError>;

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use crate::vm::error::{JavaErrorKind, VmError};

    #[test]
    fn names() {
        assert_eq!(JavaErrorKind::NullPointerException.class_name(), "java/lang/NullPointerException");
        assert_eq!(JavaErrorKind::from_str("StackOverflowError").unwrap(), JavaErrorKind::StackOverflowError);

        let e = VmError::java(JavaErrorKind::ArithmeticException, "/ by zero");
        assert_eq!(e.to_string(), "java.lang.ArithmeticException: / by zero");
        assert_eq!(e.kind(), Some(JavaErrorKind::ArithmeticException));
        assert!(!e.is_internal());
    }
}
