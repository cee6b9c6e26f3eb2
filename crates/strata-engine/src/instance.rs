//! Instances of built types

use crate::class::{PublicMember, TypeRef};
use crate::error::{ObjectError, ObjectResult};
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Global counter for instance IDs
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Live object created from a [`TypeRef`]
///
/// Clones share the same object. Private values are stored per instance but
/// are only reachable through the [`This`](crate::This) context of a running
/// method; through `Instance` they read as `Undefined` and cannot be written.
#[derive(Clone)]
pub struct Instance(Arc<InstanceInner>);

struct InstanceInner {
    id: u64,
    class: TypeRef,
    state: RwLock<InstanceState>,
}

#[derive(Default)]
struct InstanceState {
    /// Own public fields
    fields: FxHashMap<String, Value>,
    /// Private values written by methods
    private: FxHashMap<String, Value>,
    /// Depths of the active method frames per calling thread, outermost first
    frames: FxHashMap<ThreadId, Vec<usize>>,
}

impl Instance {
    pub(crate) fn new(class: TypeRef) -> Self {
        Self(Arc::new(InstanceInner {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            class,
            state: RwLock::new(InstanceState::default()),
        }))
    }

    /// Unique instance ID
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Type this instance was created from
    pub fn class(&self) -> &TypeRef {
        &self.0.class
    }

    /// True if created from `ty` or one of its descendants
    pub fn is_instance_of(&self, ty: &TypeRef) -> bool {
        self.class() == ty || self.class().extends(ty)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn is_hidden(&self, name: &str) -> bool {
        let class = self.class();
        let options = class.options();
        class.is_private_value(name)
            || (options.is_private_method(name) && class.private_method(name).is_some())
    }

    /// Read a member
    ///
    /// Own fields shadow type members. Getters run with this instance as
    /// receiver; methods come back bound as function values.
    pub fn get(&self, name: &str) -> ObjectResult<Value> {
        if self.is_hidden(name) {
            return Ok(Value::Undefined);
        }
        if let Some(value) = self.0.state.read().fields.get(name) {
            return Ok(value.clone());
        }
        match self.class().public_member(name) {
            Some(PublicMember::Data { value, .. }) => Ok(value.clone()),
            Some(PublicMember::Accessor(accessor)) => match &accessor.get {
                Some(getter) => getter.invoke(self, &[]),
                None => Ok(Value::Undefined),
            },
            Some(PublicMember::Method(slot)) => Ok(Value::Function(slot.bind(self))),
            None => Ok(Value::Undefined),
        }
    }

    /// Write a member
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ObjectResult<()> {
        let value = value.into();
        if self.is_hidden(name) {
            return Err(ObjectError::PrivateMember(name.to_string()));
        }
        if self.class().options().is_frame_key(name) {
            return Err(ObjectError::ReservedName(name.to_string()));
        }
        match self.class().public_member(name) {
            Some(PublicMember::Accessor(accessor)) => match &accessor.set {
                Some(setter) => setter.invoke(self, &[value]).map(|_| ()),
                None => Err(ObjectError::ReadOnly(name.to_string())),
            },
            Some(PublicMember::Data {
                writable: false, ..
            }) => Err(ObjectError::ReadOnly(name.to_string())),
            _ => {
                self.0.state.write().fields.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// Remove an own field, returning its value
    pub fn delete(&self, name: &str) -> Option<Value> {
        self.0.state.write().fields.remove(name)
    }

    /// Whether a member is visible from outside
    pub fn has(&self, name: &str) -> bool {
        if self.is_hidden(name) {
            return false;
        }
        self.0.state.read().fields.contains_key(name)
            || self.class().public_member(name).is_some()
    }

    /// Whether a public method with this name exists
    pub fn has_method(&self, name: &str) -> bool {
        self.class().has_method(name)
    }

    /// Invoke a public member
    ///
    /// An own field holding a function shadows the type's method, as does any
    /// member whose value is a function.
    pub fn call(&self, name: &str, args: &[Value]) -> ObjectResult<Value> {
        if self.is_hidden(name) {
            return Err(ObjectError::PrivateMember(name.to_string()));
        }
        let own = self.0.state.read().fields.get(name).cloned();
        let value = match own {
            Some(value) => value,
            None => match self.class().public_member(name) {
                Some(PublicMember::Method(slot)) => return slot.invoke(self, args),
                Some(_) => self.get(name)?,
                None => return Err(ObjectError::no_such_member(self.class().name(), name)),
            },
        };
        match value {
            Value::Function(func) => func.call(args),
            other => Err(ObjectError::TypeError(format!(
                "'{}' is a {}, not a function",
                name,
                other.kind_name()
            ))),
        }
    }

    /// Own field names, sorted
    pub fn own_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.state.read().fields.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Own field names plus the type's enumerable members, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.own_keys();
        keys.extend(self.class().enumerable_names());
        keys.sort();
        keys.dedup();
        keys
    }

    /// Number of method frames the current thread has active on this instance
    ///
    /// Calls running on other threads keep their own frame stacks.
    pub fn active_frames(&self) -> usize {
        self.0
            .state
            .read()
            .frames
            .get(&thread::current().id())
            .map_or(0, Vec::len)
    }

    /// Push a frame for the current thread, returning its stack position
    pub(crate) fn push_frame(&self, depth: usize) -> usize {
        let mut state = self.0.state.write();
        let stack = state.frames.entry(thread::current().id()).or_default();
        stack.push(depth);
        stack.len() - 1
    }

    /// Drop the current thread's frame at `position` and everything above it
    pub(crate) fn pop_frame(&self, position: usize) {
        let id = thread::current().id();
        let mut state = self.0.state.write();
        if let Some(stack) = state.frames.get_mut(&id) {
            stack.truncate(position);
            if stack.is_empty() {
                state.frames.remove(&id);
            }
        }
    }

    pub(crate) fn caller_depth(&self) -> Option<usize> {
        self.0
            .state
            .read()
            .frames
            .get(&thread::current().id())
            .and_then(|stack| stack.first().copied())
    }

    pub(crate) fn private_get(&self, name: &str) -> Option<Value> {
        self.0.state.read().private.get(name).cloned()
    }

    pub(crate) fn private_set(&self, name: &str, value: Value) {
        self.0.state.write().private.insert(name.to_string(), value);
    }

    pub(crate) fn private_remove(&self, name: &str) -> Option<Value> {
        self.0.state.write().private.remove(name)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.0.id)
            .field("class", &self.class().name())
            .field("fields", &self.own_keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{Descriptor, Members};

    fn point_type() -> TypeRef {
        TypeRef::new_base("Base")
            .extend(
                "Point",
                Members::new()
                    .value("x", 0)
                    .value("y", 0)
                    .method("init", |this, args| {
                        this.set("x", args.first().cloned().unwrap_or(Value::Int(0)))?;
                        this.set("y", args.get(1).cloned().unwrap_or(Value::Int(0)))?;
                        Ok(Value::Undefined)
                    })
                    .method("sum", |this, _args| {
                        let x = this.get("x")?.as_int().unwrap_or(0);
                        let y = this.get("y")?.as_int().unwrap_or(0);
                        Ok(Value::Int(x + y))
                    })
                    .descriptor("origin", Descriptor::data("zero")),
                Members::new(),
            )
            .unwrap()
    }

    #[test]
    fn test_fields_shadow_defaults() {
        let point = point_type();
        let p = point.instantiate(&[Value::Int(3), Value::Int(4)]).unwrap();
        let q = point.instantiate(&[]).unwrap();

        assert_eq!(p.get("x").unwrap(), Value::Int(3));
        assert_eq!(q.get("x").unwrap(), Value::Int(0));
        assert_eq!(p.call("sum", &[]).unwrap(), Value::Int(7));
        assert_ne!(p.id(), q.id());
    }

    #[test]
    fn test_unknown_member() {
        let p = point_type().instantiate(&[]).unwrap();

        assert_eq!(p.get("z").unwrap(), Value::Undefined);
        assert!(matches!(
            p.call("z", &[]),
            Err(ObjectError::NoSuchMember { .. })
        ));
        assert!(matches!(p.call("x", &[]), Err(ObjectError::TypeError(_))));
    }

    #[test]
    fn test_read_only_descriptor() {
        let p = point_type().instantiate(&[]).unwrap();

        assert_eq!(p.get("origin").unwrap(), Value::from("zero"));
        assert_eq!(
            p.set("origin", "one"),
            Err(ObjectError::ReadOnly("origin".into()))
        );
    }

    #[test]
    fn test_reserved_keys_not_writable() {
        let p = point_type().instantiate(&[]).unwrap();
        assert_eq!(p.set("_super", 1), Err(ObjectError::ReservedName("_super".into())));
    }

    #[test]
    fn test_method_as_bound_value() {
        let p = point_type().instantiate(&[Value::Int(1), Value::Int(2)]).unwrap();
        let sum = p.get("sum").unwrap();

        assert_eq!(sum.as_function().unwrap().call(&[]).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_own_function_shadows_method() {
        let p = point_type().instantiate(&[]).unwrap();
        p.set(
            "sum",
            crate::value::NativeFunction::new("sum", |_args: &[Value]| Ok(Value::Int(-1))),
        )
        .unwrap();

        assert_eq!(p.call("sum", &[]).unwrap(), Value::Int(-1));
        p.delete("sum");
        assert_eq!(p.call("sum", &[]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_keys() {
        let p = point_type().instantiate(&[Value::Int(1), Value::Int(1)]).unwrap();
        p.set("label", "a").unwrap();

        assert_eq!(p.own_keys(), vec!["label", "x", "y"]);
        assert_eq!(p.keys(), vec!["init", "label", "sum", "x", "y"]);
    }
}
