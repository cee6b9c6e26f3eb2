//! Apply-style construction with a runtime argument list

use crate::class::TypeRef;
use crate::convert::ForeignClass;
use crate::error::{ObjectError, ObjectResult};
use crate::value::{Record, Value};

/// Anything that can build an object from an ordered argument list
pub trait Constructible {
    /// Build a new object
    fn construct_with(&self, args: &[Value]) -> ObjectResult<Value>;
}

impl Constructible for TypeRef {
    fn construct_with(&self, args: &[Value]) -> ObjectResult<Value> {
        self.instantiate(args).map(Value::Object)
    }
}

impl Constructible for ForeignClass {
    fn construct_with(&self, args: &[Value]) -> ObjectResult<Value> {
        self.construct(args).map(Value::Foreign)
    }
}

/// Types and functions are constructor-like; every built-in value is not.
///
/// A function is called with a fresh record receiver prepended to the
/// arguments. If it returns a record or an object, that is the result;
/// otherwise the receiver is.
impl Constructible for Value {
    fn construct_with(&self, args: &[Value]) -> ObjectResult<Value> {
        match self {
            Value::Type(ty) => ty.construct_with(args),
            Value::Function(func) => {
                let receiver = Record::new();
                let mut call_args = Vec::with_capacity(args.len() + 1);
                call_args.push(Value::Record(receiver.clone()));
                call_args.extend_from_slice(args);
                match func.call(&call_args)? {
                    result @ (Value::Record(_) | Value::Object(_)) => Ok(result),
                    _ => Ok(Value::Record(receiver)),
                }
            }
            other => Err(ObjectError::NotConstructible(other.kind_name().to_string())),
        }
    }
}

/// Construct `target` with `args`
pub fn construct<C: Constructible + ?Sized>(target: &C, args: &[Value]) -> ObjectResult<Value> {
    target.construct_with(args)
}
