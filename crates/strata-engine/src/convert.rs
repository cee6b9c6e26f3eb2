//! Wrapping native Rust types into the object model
//!
//! A [`ForeignClass`] describes a native type that was not built by the
//! extender: how to construct it from an argument list and which prototype
//! members (native methods on `&mut T`, plain values) it exposes.
//! [`convert`] turns it into a regular [`TypeRef`]. Instances of that type
//! hold the native object as their delegate and every prototype member is
//! declared as an ordinary instance member, so it dispatches, overrides and
//! calls super like any other method.

use crate::class::TypeRef;
use crate::construct::construct;
use crate::error::{ObjectError, ObjectResult};
use crate::instance::Instance;
use crate::member::{MemberDecl, Members, Method};
use crate::options::ExtendOptions;
use crate::value::Value;
use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type Erased = dyn Any + Send + Sync;

type ForeignCtor = dyn Fn(&[Value]) -> ObjectResult<Box<Erased>> + Send + Sync;

/// Type-erased native method
pub type ForeignMethod = dyn Fn(&mut Erased, &[Value]) -> ObjectResult<Value> + Send + Sync;

/// Native object owned by a converted instance
#[derive(Clone)]
pub struct ForeignObject {
    class_name: Arc<str>,
    cell: Arc<Mutex<Box<Erased>>>,
}

impl ForeignObject {
    /// Wrap a native value
    pub fn new<T: Any + Send + Sync>(class_name: impl Into<Arc<str>>, value: T) -> Self {
        Self::from_box(class_name.into(), Box::new(value))
    }

    fn from_box(class_name: Arc<str>, value: Box<Erased>) -> Self {
        Self {
            class_name,
            cell: Arc::new(Mutex::new(value)),
        }
    }

    /// Name of the foreign class that built this object
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Borrow the native value mutably
    ///
    /// Fails with `DelegateBusy` when the object is already borrowed further
    /// up the call stack, e.g. by a listener calling back into its emitter.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> ObjectResult<R> {
        let mut guard = self.lock()?;
        let erased: &mut Erased = &mut **guard;
        let target = erased.downcast_mut::<T>().ok_or_else(|| {
            ObjectError::TypeError(format!(
                "delegate of '{}' is not a {}",
                self.class_name,
                type_name::<T>()
            ))
        })?;
        Ok(f(target))
    }

    /// Whether the native value is a `T`
    ///
    /// Fails with `DelegateBusy` while the object is borrowed.
    pub fn is<T: Any>(&self) -> ObjectResult<bool> {
        let guard = self.lock()?;
        let erased: &Erased = &**guard;
        Ok(erased.is::<T>())
    }

    fn call(&self, method: &ForeignMethod, args: &[Value]) -> ObjectResult<Value> {
        let mut guard = self.lock()?;
        method(&mut **guard, args)
    }

    fn lock(&self) -> ObjectResult<parking_lot::MutexGuard<'_, Box<Erased>>> {
        self.cell.try_lock().ok_or_else(|| {
            warn!(class_name = %self.class_name, "delegate busy");
            ObjectError::DelegateBusy(self.class_name.to_string())
        })
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ForeignObject) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignObject({})", self.class_name)
    }
}

#[derive(Clone)]
enum ForeignMember {
    Value(Value),
    Method(Arc<ForeignMethod>),
}

/// Description of a native type that can be converted
#[derive(Clone)]
pub struct ForeignClass {
    name: Arc<str>,
    constructor: Arc<ForeignCtor>,
    prototype: Vec<(String, ForeignMember)>,
}

impl ForeignClass {
    /// Describe a native type built by `constructor`
    pub fn new<T, F>(name: impl Into<Arc<str>>, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&[Value]) -> ObjectResult<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Arc::new(move |args: &[Value]| {
                constructor(args).map(|obj| Box::new(obj) as Box<Erased>)
            }),
            prototype: Vec::new(),
        }
    }

    /// Add a native method operating on the delegate
    pub fn method<T, F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        T: Any,
        F: Fn(&mut T, &[Value]) -> ObjectResult<Value> + Send + Sync + 'static,
    {
        let class_name = Arc::clone(&self.name);
        let erased = move |obj: &mut Erased, args: &[Value]| {
            let target = obj.downcast_mut::<T>().ok_or_else(|| {
                ObjectError::TypeError(format!(
                    "delegate of '{}' is not a {}",
                    class_name,
                    type_name::<T>()
                ))
            })?;
            func(target, args)
        };
        self.push(name.into(), ForeignMember::Method(Arc::new(erased)));
        self
    }

    /// Add a prototype value
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name.into(), ForeignMember::Value(value.into()));
        self
    }

    fn push(&mut self, name: String, member: ForeignMember) {
        self.prototype.retain(|(existing, _)| *existing != name);
        self.prototype.push((name, member));
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prototype member names in declaration order
    pub fn prototype_names(&self) -> Vec<&str> {
        self.prototype.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Build a native object directly
    pub fn construct(&self, args: &[Value]) -> ObjectResult<ForeignObject> {
        let value = (self.constructor)(args)?;
        Ok(ForeignObject::from_box(Arc::clone(&self.name), value))
    }

    /// Prototype as member declarations dispatching to the delegate
    fn prototype_members(&self, delegate_name: &str) -> Members {
        let mut members = Members::new();
        for (name, member) in &self.prototype {
            let decl = match member {
                ForeignMember::Value(value) => MemberDecl::Value(value.clone()),
                ForeignMember::Method(method) => {
                    let method = Arc::clone(method);
                    let delegate_name = delegate_name.to_string();
                    let class_name = Arc::clone(&self.name);
                    MemberDecl::Method(Method::new(move |this, args| {
                        let delegate = this.get(&delegate_name)?;
                        match delegate.as_foreign() {
                            Some(foreign) => foreign.call(method.as_ref(), args),
                            None => Err(ObjectError::DelegateMissing(class_name.to_string())),
                        }
                    }))
                }
            };
            members.insert(name.clone(), decl);
        }
        members
    }
}

impl fmt::Debug for ForeignClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignClass")
            .field("name", &self.name)
            .field("prototype", &self.prototype_names())
            .finish()
    }
}

/// Convert a foreign class into a type extending the global base type
pub fn convert(class: &ForeignClass, options: ExtendOptions) -> ObjectResult<TypeRef> {
    crate::base().convert(class, options)
}

impl TypeRef {
    /// Convert a foreign class into a type extending this one
    pub fn convert(&self, class: &ForeignClass, options: ExtendOptions) -> ObjectResult<TypeRef> {
        let delegate_name = options.delegate_name.clone();
        let mut members = class.prototype_members(&delegate_name);

        let ctor = class.clone();
        members.insert(
            options.constructor_name.clone(),
            MemberDecl::Method(Method::new(move |this, args| {
                let origin = construct(&ctor, args)?;
                this.set(&delegate_name, origin)?;
                Ok(Value::Undefined)
            })),
        );

        debug!(class_name = %class.name(), "converting foreign class");
        self.extend_with_options(class.name(), members, Members::new(), options)
    }
}

impl Instance {
    /// Native delegate of a converted instance
    pub fn delegate(&self) -> Option<ForeignObject> {
        let key = &self.class().options().delegate_name;
        match self.get(key) {
            Ok(Value::Foreign(foreign)) => Some(foreign),
            _ => None,
        }
    }

    /// Borrow the native delegate of a converted instance
    pub fn with_delegate<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> ObjectResult<R> {
        match self.delegate() {
            Some(foreign) => foreign.with(f),
            None => Err(ObjectError::DelegateMissing(self.class().name().to_string())),
        }
    }
}
