//! Method slots and the per-call receiver context
//!
//! Every declared method, getter and setter is stored as a [`MethodSlot`]
//! whose `parent` points at the nearest ancestor implementation of the same
//! name. The link is resolved when the type is built, so calling super never
//! searches the hierarchy at run time.
//!
//! Invoking a slot pushes a frame on the receiver and hands the body a
//! [`This`] context. Private values, private methods, the super-binding and
//! the private object are reachable only through that context; nothing is
//! attached to the instance itself. The frame is popped by [`FrameGuard`] on
//! every exit path, including errors and unwinding.

use crate::error::{ObjectError, ObjectResult};
use crate::instance::Instance;
use crate::member::Method;
use crate::options::ExtendOptions;
use crate::value::{NativeFunction, Record, Value};
use std::sync::Arc;
use tracing::trace;

/// Resolved method implementation at one level of a hierarchy
#[derive(Debug)]
pub(crate) struct MethodSlot {
    pub(crate) name: String,
    /// Depth of the declaring type
    pub(crate) depth: usize,
    pub(crate) body: Method,
    /// Nearest ancestor implementation
    pub(crate) parent: Option<Arc<MethodSlot>>,
    /// Private object of the declaring type
    pub(crate) private_object: Option<Record>,
}

impl MethodSlot {
    pub(crate) fn new(
        name: &str,
        depth: usize,
        body: Method,
        parent: Option<Arc<MethodSlot>>,
        private_object: Option<Record>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            depth,
            body,
            parent,
            private_object,
        })
    }

    /// Run the body with `instance` as receiver
    pub(crate) fn invoke(
        self: &Arc<Self>,
        instance: &Instance,
        args: &[Value],
    ) -> ObjectResult<Value> {
        let _frame = FrameGuard::enter(instance, self.depth);
        trace!(
            method = %self.name,
            depth = self.depth,
            receiver = instance.id(),
            "dispatch"
        );
        let this = This {
            instance,
            slot: self,
        };
        self.body.invoke(&this, args)
    }

    /// Bind the slot to a receiver as a free function value
    pub(crate) fn bind(self: &Arc<Self>, instance: &Instance) -> NativeFunction {
        let slot = Arc::clone(self);
        let receiver = instance.clone();
        NativeFunction::new(self.name.as_str(), move |args: &[Value]| {
            slot.invoke(&receiver, args)
        })
    }
}

/// Active method frame on an instance; popped on drop
///
/// Frames are tracked per calling thread and the guard remembers its own
/// stack position, so concurrent calls on one instance never see or pop
/// each other's frames.
pub(crate) struct FrameGuard<'a> {
    instance: &'a Instance,
    position: usize,
}

impl<'a> FrameGuard<'a> {
    pub(crate) fn enter(instance: &'a Instance, depth: usize) -> Self {
        let position = instance.push_frame(depth);
        Self { instance, position }
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.instance.pop_frame(self.position);
    }
}

/// Receiver context handed to method bodies
///
/// Reads and writes through `This` see the receiver's private state; the
/// same names are invisible through [`Instance`] directly.
pub struct This<'a> {
    instance: &'a Instance,
    slot: &'a Arc<MethodSlot>,
}

impl<'a> This<'a> {
    /// The receiver
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// Name of the executing method
    pub fn method_name(&self) -> &str {
        &self.slot.name
    }

    /// Depth of the type that declared the executing method
    pub fn depth(&self) -> usize {
        self.slot.depth
    }

    /// Depth of the outermost frame this thread has active on the receiver
    pub fn caller_depth(&self) -> usize {
        self.instance.caller_depth().unwrap_or(self.slot.depth)
    }

    /// Whether this frame is the current thread's outermost call on the receiver
    pub fn is_outermost(&self) -> bool {
        self.instance.active_frames() == 1
    }

    /// Private object of the declaring type, when exposure is enabled
    pub fn private_object(&self) -> Option<&Record> {
        self.slot.private_object.as_ref()
    }

    /// Whether the executing method has an ancestor implementation
    pub fn has_super(&self) -> bool {
        self.slot.parent.is_some()
    }

    /// Names of the private methods visible to the receiver, sorted
    pub fn private_methods(&self) -> Vec<String> {
        self.instance.class().private_method_names()
    }

    fn options(&self) -> &ExtendOptions {
        self.instance.class().options()
    }

    /// Invoke the nearest ancestor implementation of the executing method
    pub fn call_super(&self, args: &[Value]) -> ObjectResult<Value> {
        match &self.slot.parent {
            Some(parent) => parent.invoke(self.instance, args),
            None => Err(ObjectError::NoSuperMethod(self.slot.name.clone())),
        }
    }

    /// Invoke a member on the receiver
    ///
    /// Private names dispatch to the deepest override in the receiver's type;
    /// the super name dispatches to the ancestor implementation.
    pub fn call(&self, name: &str, args: &[Value]) -> ObjectResult<Value> {
        let options = self.options();
        if name == options.super_name {
            return self.call_super(args);
        }
        if options.is_private_method(name) {
            let class = self.instance.class();
            return match class.private_method(name) {
                Some(slot) => slot.invoke(self.instance, args),
                None => Err(ObjectError::no_such_member(class.name(), name)),
            };
        }
        self.instance.call(name, args)
    }

    /// Read a member, private values included
    pub fn get(&self, name: &str) -> ObjectResult<Value> {
        let options = self.options();
        if name == options.super_name {
            return Ok(match &self.slot.parent {
                Some(parent) => Value::Function(parent.bind(self.instance)),
                None => Value::Undefined,
            });
        }
        if name == options.depth_key {
            return Ok(Value::Int(self.depth() as i64));
        }
        if name == options.caller_depth_key {
            return Ok(Value::Int(self.caller_depth() as i64));
        }
        if name == options.methods_key {
            let names = self
                .private_methods()
                .into_iter()
                .map(Value::from)
                .collect::<Vec<_>>();
            return Ok(Value::list(names));
        }
        if options.private_object.as_deref() == Some(name) {
            return Ok(self
                .private_object()
                .cloned()
                .map(Value::Record)
                .unwrap_or_default());
        }
        if options.is_private_method(name) {
            if let Some(slot) = self.instance.class().private_method(name) {
                return Ok(Value::Function(slot.bind(self.instance)));
            }
        }
        if self.instance.class().is_private_value(name) {
            return Ok(self.private_value(name));
        }
        self.instance.get(name)
    }

    /// Write a member; private names land in the receiver's private storage
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ObjectResult<()> {
        let value = value.into();
        if self.instance.class().is_private_value(name) {
            self.instance.private_set(name, value);
            return Ok(());
        }
        self.instance.set(name, value)
    }

    /// Remove a member from the receiver, returning the removed value
    pub fn delete(&self, name: &str) -> Option<Value> {
        if self.instance.class().is_private_value(name) {
            return self.instance.private_remove(name);
        }
        self.instance.delete(name)
    }

    fn private_value(&self, name: &str) -> Value {
        self.instance
            .private_get(name)
            .or_else(|| self.instance.class().private_default(name).cloned())
            .unwrap_or_default()
    }
}
