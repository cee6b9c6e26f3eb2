//! Types and the type extender
//!
//! A [`TypeRef`] is one level of a single-inheritance hierarchy. Extending a
//! type copies the parent's resolved tables and layers the new declarations
//! over them:
//!
//! - public members (data, accessors, methods) in one table keyed by name,
//!   where a derived entry replaces the inherited one;
//! - private methods in a registry keyed by name and then by depth, so the
//!   deepest override is dispatched while each override keeps a link to the
//!   shallower one;
//! - private value defaults, copied into per-instance storage on first write.
//!
//! Each non-class-members type also gets a mirrored class-members type whose
//! parent is the parent's class-members type, and one singleton instance of
//! it as its `members` namespace.

use crate::error::{ObjectError, ObjectResult};
use crate::instance::Instance;
use crate::member::{classify, Descriptor, MemberDecl, MemberKind, Members, Method};
use crate::method::MethodSlot;
use crate::options::ExtendOptions;
use crate::value::{Record, Value};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Global counter for type IDs
static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Public member resolved on a type
#[derive(Debug, Clone)]
pub(crate) enum PublicMember {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor(AccessorSlot),
    Method(Arc<MethodSlot>),
}

impl PublicMember {
    fn is_configurable(&self) -> bool {
        match self {
            PublicMember::Data { configurable, .. } => *configurable,
            PublicMember::Accessor(accessor) => accessor.configurable,
            PublicMember::Method(_) => true,
        }
    }

    fn is_enumerable(&self) -> bool {
        match self {
            PublicMember::Data { enumerable, .. } => *enumerable,
            PublicMember::Accessor(accessor) => accessor.enumerable,
            PublicMember::Method(_) => true,
        }
    }
}

/// Getter/setter pair
#[derive(Debug, Clone)]
pub(crate) struct AccessorSlot {
    pub(crate) get: Option<Arc<MethodSlot>>,
    pub(crate) set: Option<Arc<MethodSlot>>,
    pub(crate) enumerable: bool,
    pub(crate) configurable: bool,
}

/// Resolved member tables of one type
#[derive(Default)]
struct Layout {
    public: FxHashMap<String, PublicMember>,
    private_methods: FxHashMap<String, BTreeMap<usize, Arc<MethodSlot>>>,
    private_values: FxHashMap<String, Value>,
}

impl Layout {
    /// Layer `members` over the parent's tables
    fn resolve(
        parent: &TypeRef,
        members: Members,
        options: &ExtendOptions,
        depth: usize,
        private_object: Option<&Record>,
    ) -> ObjectResult<Self> {
        let mut layout = Layout {
            public: parent.0.public.clone(),
            private_methods: parent.0.private_methods.clone(),
            private_values: parent.0.private_values.clone(),
        };

        for (name, decl) in members {
            if options.is_reserved(&name) {
                return Err(ObjectError::ReservedName(name));
            }
            let class = classify(&name, &decl, options);
            if !class.is_private() {
                if let Some(existing) = layout.public.get(&name) {
                    if !existing.is_configurable() {
                        return Err(ObjectError::NotConfigurable(name));
                    }
                }
            }

            match (decl, class.kind, class.is_private()) {
                (MemberDecl::Method(body), _, true) => {
                    layout.add_private_method(&name, body, depth, private_object);
                }
                (MemberDecl::Method(body), _, false) => {
                    let parent_slot = match layout.public.get(&name) {
                        Some(PublicMember::Method(slot)) => Some(Arc::clone(slot)),
                        _ => None,
                    };
                    let slot =
                        MethodSlot::new(&name, depth, body, parent_slot, private_object.cloned());
                    layout.public.insert(name, PublicMember::Method(slot));
                }
                (MemberDecl::Descriptor(descriptor), MemberKind::Accessor, _) => {
                    let accessor = layout.accessor(&name, descriptor, depth, private_object);
                    layout.public.insert(name, PublicMember::Accessor(accessor));
                }
                (MemberDecl::Descriptor(descriptor), _, private) => {
                    let value = descriptor.value.unwrap_or_default();
                    if private {
                        layout.private_values.insert(name, value);
                    } else {
                        layout.public.insert(
                            name,
                            PublicMember::Data {
                                value,
                                writable: descriptor.writable,
                                enumerable: descriptor.enumerable,
                                configurable: descriptor.configurable,
                            },
                        );
                    }
                }
                (MemberDecl::Value(value), _, true) => {
                    layout.private_values.insert(name, value);
                }
                (MemberDecl::Value(value), _, false) => {
                    layout.public.insert(
                        name,
                        PublicMember::Data {
                            value,
                            writable: true,
                            enumerable: true,
                            configurable: true,
                        },
                    );
                }
            }
        }

        Ok(layout)
    }

    fn add_private_method(
        &mut self,
        name: &str,
        body: Method,
        depth: usize,
        private_object: Option<&Record>,
    ) {
        let by_depth = self.private_methods.entry(name.to_string()).or_default();
        let shallower = by_depth.values().next_back().cloned();
        let slot = MethodSlot::new(name, depth, body, shallower, private_object.cloned());
        by_depth.insert(depth, slot);
    }

    /// Build an accessor whose getter and setter link to the inherited ones
    fn accessor(
        &self,
        name: &str,
        descriptor: Descriptor,
        depth: usize,
        private_object: Option<&Record>,
    ) -> AccessorSlot {
        let inherited = match self.public.get(name) {
            Some(PublicMember::Accessor(accessor)) => Some(accessor),
            _ => None,
        };
        let get = descriptor.get.map(|body| {
            let parent = inherited.and_then(|a| a.get.clone());
            MethodSlot::new(name, depth, body, parent, private_object.cloned())
        });
        let set = descriptor.set.map(|body| {
            let parent = inherited.and_then(|a| a.set.clone());
            MethodSlot::new(name, depth, body, parent, private_object.cloned())
        });

        AccessorSlot {
            get,
            set,
            enumerable: descriptor.enumerable,
            configurable: descriptor.configurable,
        }
    }
}

/// Shared handle to a type
///
/// Types are immutable once built apart from their subclass list. Equality
/// is identity.
#[derive(Clone)]
pub struct TypeRef(Arc<TypeInner>);

struct TypeInner {
    id: u64,
    name: String,
    parent: Option<TypeRef>,
    depth: usize,
    options: ExtendOptions,
    /// Set on the mirrored static-side types
    class_members: bool,
    public: FxHashMap<String, PublicMember>,
    private_methods: FxHashMap<String, BTreeMap<usize, Arc<MethodSlot>>>,
    private_values: FxHashMap<String, Value>,
    /// Shared by all instances; only present when exposure is enabled
    private_object: Option<Record>,
    /// Extending types in registration order
    subclasses: RwLock<Vec<Weak<TypeInner>>>,
    /// Class-members singleton
    members: OnceCell<Instance>,
}

impl TypeRef {
    /// Create a new ultimate base type (depth 0, no members)
    pub fn new_base(name: impl Into<String>) -> Self {
        Self::new_base_with_options(name, ExtendOptions::default())
    }

    /// Create a base type whose descendants inherit `options`
    pub fn new_base_with_options(name: impl Into<String>, options: ExtendOptions) -> Self {
        let name = name.into();
        debug!(type_name = %name, "created base type");
        TypeRef(Arc::new(TypeInner {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            parent: None,
            depth: 0,
            options,
            class_members: false,
            public: FxHashMap::default(),
            private_methods: FxHashMap::default(),
            private_values: FxHashMap::default(),
            private_object: None,
            subclasses: RwLock::new(Vec::new()),
            members: OnceCell::new(),
        }))
    }

    /// Extend this type, inheriting its options
    pub fn extend(
        &self,
        name: impl Into<String>,
        instance_members: Members,
        class_members: Members,
    ) -> ObjectResult<TypeRef> {
        let options = ExtendOptions {
            extendable: true,
            ..self.0.options.clone()
        };
        self.extend_with_options(name, instance_members, class_members, options)
    }

    /// Extend this type with explicit options
    ///
    /// Below the base type, every option except `extendable` must equal the
    /// parent's.
    pub fn extend_with_options(
        &self,
        name: impl Into<String>,
        instance_members: Members,
        class_members: Members,
        options: ExtendOptions,
    ) -> ObjectResult<TypeRef> {
        let name = name.into();
        self.check_extendable(&name, &options)?;

        let depth = self.0.depth + 1;
        let private_object = options.private_object.as_ref().map(|_| Record::new());
        let layout =
            Layout::resolve(self, instance_members, &options, depth, private_object.as_ref())?;

        // Resolve the static side before registering anything, so a bad class
        // member leaves the hierarchy untouched.
        let members_parent = self.members_parent();
        let members_name = format!("{}.members", name);
        let members_options = ExtendOptions {
            extendable: true,
            ..options.clone()
        };
        members_parent.check_extendable(&members_name, &members_options)?;
        let members_depth = members_parent.0.depth + 1;
        let members_object = members_options
            .private_object
            .as_ref()
            .map(|_| Record::new());
        let members_layout = Layout::resolve(
            &members_parent,
            class_members,
            &members_options,
            members_depth,
            members_object.as_ref(),
        )?;

        let ty = self.create_child(name, layout, options, false, private_object);
        let members_type = members_parent.create_child(
            members_name,
            members_layout,
            members_options,
            true,
            members_object,
        );
        let singleton = members_type.instantiate(&[])?;
        let _ = ty.0.members.set(singleton);

        Ok(ty)
    }

    fn check_extendable(&self, child: &str, options: &ExtendOptions) -> ObjectResult<()> {
        if !self.0.options.extendable {
            return Err(ObjectError::NotExtendable(self.0.name.clone()));
        }
        if self.0.parent.is_some() && !self.0.options.structurally_eq(options) {
            return Err(ObjectError::OptionsMismatch {
                child: child.to_string(),
                parent: self.0.name.clone(),
            });
        }
        Ok(())
    }

    /// Parent of this type's class-members type
    fn members_parent(&self) -> TypeRef {
        match self.0.members.get() {
            Some(members) => members.class().clone(),
            None => self.root(),
        }
    }

    fn create_child(
        &self,
        name: String,
        layout: Layout,
        options: ExtendOptions,
        class_members: bool,
        private_object: Option<Record>,
    ) -> TypeRef {
        let depth = self.0.depth + 1;
        debug!(
            type_name = %name,
            parent = %self.0.name,
            depth,
            class_members,
            "created type"
        );
        let ty = TypeRef(Arc::new(TypeInner {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            parent: Some(self.clone()),
            depth,
            options,
            class_members,
            public: layout.public,
            private_methods: layout.private_methods,
            private_values: layout.private_values,
            private_object,
            subclasses: RwLock::new(Vec::new()),
            members: OnceCell::new(),
        }));
        let mut subclasses = self.0.subclasses.write();
        subclasses.retain(|weak| weak.strong_count() > 0);
        subclasses.push(Arc::downgrade(&ty.0));
        drop(subclasses);
        ty
    }

    /// Create an instance, running the constructor method with `args`
    pub fn instantiate(&self, args: &[Value]) -> ObjectResult<Instance> {
        let instance = Instance::new(self.clone());
        if let Some(PublicMember::Method(ctor)) = self.0.public.get(&self.0.options.constructor_name)
        {
            ctor.invoke(&instance, args)?;
        }
        Ok(instance)
    }

    /// True if `target` is a proper ancestor of this type
    pub fn extends(&self, target: &TypeRef) -> bool {
        self.ancestors().any(|ancestor| ancestor == *target)
    }

    /// Proper ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = TypeRef> {
        let mut next = self.0.parent.clone();
        std::iter::from_fn(move || {
            let current = next.take()?;
            next = current.0.parent.clone();
            Some(current)
        })
    }

    /// Ultimate base type of this hierarchy
    pub fn root(&self) -> TypeRef {
        self.ancestors().last().unwrap_or_else(|| self.clone())
    }

    /// Unique type ID
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Distance from the base type
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    /// Parent type (`None` for a base type)
    pub fn parent(&self) -> Option<&TypeRef> {
        self.0.parent.as_ref()
    }

    /// Options this type was built with
    pub fn options(&self) -> &ExtendOptions {
        &self.0.options
    }

    /// Whether this type may be extended
    pub fn is_extendable(&self) -> bool {
        self.0.options.extendable
    }

    /// Whether this is a class-members (static side) type
    pub fn is_class_members(&self) -> bool {
        self.0.class_members
    }

    /// Class-members singleton (`None` for base and class-members types)
    pub fn members(&self) -> Option<&Instance> {
        self.0.members.get()
    }

    /// Private object shared by this type's own methods
    ///
    /// Each type owns a separate record; methods inherited from an ancestor
    /// keep seeing the ancestor's.
    pub fn private_object(&self) -> Option<&Record> {
        self.0.private_object.as_ref()
    }

    /// Types extending this one, in registration order
    pub fn subclasses(&self) -> Vec<TypeRef> {
        self.0
            .subclasses
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .map(TypeRef)
            .collect()
    }

    /// Whether a public method is declared here or inherited
    pub fn has_method(&self, name: &str) -> bool {
        matches!(self.0.public.get(name), Some(PublicMember::Method(_)))
    }

    /// Public member names, sorted
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.public.keys().cloned().collect();
        names.sort();
        names
    }

    /// Private method names, sorted
    pub fn private_method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.private_methods.keys().cloned().collect();
        names.sort();
        names
    }

    /// Depths at which a private method has an implementation, shallowest first
    pub fn private_method_depths(&self, name: &str) -> Vec<usize> {
        self.0
            .private_methods
            .get(name)
            .map(|by_depth| by_depth.keys().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn enumerable_names(&self) -> impl Iterator<Item = String> + '_ {
        self.0
            .public
            .iter()
            .filter(|(_, member)| member.is_enumerable())
            .map(|(name, _)| name.clone())
    }

    pub(crate) fn public_member(&self, name: &str) -> Option<&PublicMember> {
        self.0.public.get(name)
    }

    /// Deepest implementation of a private method
    pub(crate) fn private_method(&self, name: &str) -> Option<&Arc<MethodSlot>> {
        self.0
            .private_methods
            .get(name)
            .and_then(|by_depth| by_depth.values().next_back())
    }

    /// Whether `name` routes to private value storage
    ///
    /// A public accessor declared under a private-looking name keeps it public.
    pub(crate) fn is_private_value(&self, name: &str) -> bool {
        self.0.options.is_private_value(name) && !self.0.public.contains_key(name)
    }

    pub(crate) fn private_default(&self, name: &str) -> Option<&Value> {
        self.0.private_values.get(name)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({}#{}, depth {})", self.0.name, self.0.id, self.0.depth)
    }
}
