//! Member declarations and the member classifier

use crate::error::ObjectResult;
use crate::method::This;
use crate::options::ExtendOptions;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a method body
pub type MethodFn = dyn for<'a> Fn(&This<'a>, &[Value]) -> ObjectResult<Value> + Send + Sync;

/// Callable member body
#[derive(Clone)]
pub struct Method(Arc<MethodFn>);

impl Method {
    /// Wrap a closure as a method body
    pub fn new<F>(func: F) -> Self
    where
        F: for<'a> Fn(&This<'a>, &[Value]) -> ObjectResult<Value> + Send + Sync + 'static,
    {
        Method(Arc::new(func))
    }

    pub(crate) fn invoke(&self, this: &This<'_>, args: &[Value]) -> ObjectResult<Value> {
        (self.0)(this, args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Method) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p})", Arc::as_ptr(&self.0))
    }
}

/// Property descriptor: an accessor pair or a data value with attribute flags
///
/// Descriptors are placed on the type as declared; they never become private.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// Getter
    pub get: Option<Method>,
    /// Setter, called with the assigned value as its only argument
    pub set: Option<Method>,
    /// Data value (ignored when a getter or setter is present)
    pub value: Option<Value>,
    /// Listed by `Instance::keys`
    pub enumerable: bool,
    /// May be redefined by a subclass
    pub configurable: bool,
    /// Data value may be reassigned on instances
    pub writable: bool,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            get: None,
            set: None,
            value: None,
            enumerable: false,
            configurable: true,
            writable: false,
        }
    }
}

impl Descriptor {
    /// Empty accessor descriptor; add a getter and/or setter
    pub fn accessor() -> Self {
        Self::default()
    }

    /// Data descriptor
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Set the getter
    pub fn getter<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&This<'a>, &[Value]) -> ObjectResult<Value> + Send + Sync + 'static,
    {
        self.get = Some(Method::new(func));
        self
    }

    /// Set the setter
    pub fn setter<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&This<'a>, &[Value]) -> ObjectResult<Value> + Send + Sync + 'static,
    {
        self.set = Some(Method::new(func));
        self
    }

    /// Set the enumerable flag
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// Set the configurable flag
    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    /// Set the writable flag
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Whether this describes a get/set pair rather than a value
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }
}

/// One member declaration
#[derive(Debug, Clone)]
pub enum MemberDecl {
    /// Plain data value
    Value(Value),
    /// Accessor or flagged data property
    Descriptor(Descriptor),
    /// Callable
    Method(Method),
}

/// Set of member declarations keyed by name
///
/// Order is irrelevant; declaring a name twice keeps the later declaration.
#[derive(Debug, Clone, Default)]
pub struct Members {
    entries: FxHashMap<String, MemberDecl>,
}

impl Members {
    /// Create an empty declaration set
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a data value
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, MemberDecl::Value(value.into()));
        self
    }

    /// Declare a method
    pub fn method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: for<'a> Fn(&This<'a>, &[Value]) -> ObjectResult<Value> + Send + Sync + 'static,
    {
        self.insert(name, MemberDecl::Method(Method::new(func)));
        self
    }

    /// Declare a descriptor
    pub fn descriptor(mut self, name: impl Into<String>, descriptor: Descriptor) -> Self {
        self.insert(name, MemberDecl::Descriptor(descriptor));
        self
    }

    /// Insert a declaration, replacing any earlier one with the same name
    pub fn insert(&mut self, name: impl Into<String>, decl: MemberDecl) {
        self.entries.insert(name.into(), decl);
    }

    /// Look up a declaration
    pub fn get(&self, name: &str) -> Option<&MemberDecl> {
        self.entries.get(name)
    }

    /// Whether a name is declared
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no members are declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over declarations
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MemberDecl)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Members {
    type Item = (String, MemberDecl);
    type IntoIter = std::collections::hash_map::IntoIter<String, MemberDecl>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Kind of a declared member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Plain or flagged data value
    Data,
    /// Get/set pair
    Accessor,
    /// Callable
    Method,
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Reachable from anywhere
    Public,
    /// Reachable only inside method calls
    Private,
}

/// Result of classifying one declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Member kind
    pub kind: MemberKind,
    /// Member visibility
    pub visibility: Visibility,
}

impl Classification {
    /// Check for private visibility
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

/// Classify a declaration under the given options
pub fn classify(name: &str, decl: &MemberDecl, options: &ExtendOptions) -> Classification {
    let (kind, private) = match decl {
        MemberDecl::Descriptor(d) if d.is_accessor() => (MemberKind::Accessor, false),
        MemberDecl::Descriptor(_) | MemberDecl::Value(_) => {
            (MemberKind::Data, options.is_private_value(name))
        }
        MemberDecl::Method(_) => (MemberKind::Method, options.is_private_method(name)),
    };

    Classification {
        kind,
        visibility: if private {
            Visibility::Private
        } else {
            Visibility::Public
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Method {
        Method::new(|_this, _args| Ok(Value::Undefined))
    }

    #[test]
    fn test_classify_method() {
        let opts = ExtendOptions::default();
        let decl = MemberDecl::Method(noop());

        let public = classify("meow", &decl, &opts);
        assert_eq!(public.kind, MemberKind::Method);
        assert_eq!(public.visibility, Visibility::Public);

        let private = classify("__purr", &decl, &opts);
        assert!(private.is_private());
    }

    #[test]
    fn test_classify_data_depends_on_tracking() {
        let decl = MemberDecl::Value(Value::Int(0));

        let tracked = classify("__count", &decl, &ExtendOptions::default());
        assert_eq!(tracked.kind, MemberKind::Data);
        assert!(tracked.is_private());

        let untracked = classify("__count", &decl, &ExtendOptions::default().with_tracking(false));
        assert!(!untracked.is_private());
    }

    #[test]
    fn test_classify_descriptor() {
        let opts = ExtendOptions::default();

        let accessor = MemberDecl::Descriptor(
            Descriptor::accessor().getter(|_this, _args| Ok(Value::Int(123))),
        );
        let c = classify("__foo", &accessor, &opts);
        assert_eq!(c.kind, MemberKind::Accessor);
        assert!(!c.is_private());

        let data = MemberDecl::Descriptor(Descriptor::data(1).writable(true));
        assert_eq!(classify("foo", &data, &opts).kind, MemberKind::Data);
    }

    #[test]
    fn test_later_declaration_wins() {
        let members = Members::new().value("family", "Felidae").value("family", "Canidae");

        assert_eq!(members.len(), 1);
        match members.get("family") {
            Some(MemberDecl::Value(v)) => assert_eq!(v, &Value::from("Canidae")),
            other => panic!("unexpected declaration: {:?}", other),
        }
    }
}
