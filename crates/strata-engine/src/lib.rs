//! Strata Object Model
//!
//! A single-inheritance object model built at run time:
//! - **Types**: derived from a base type and a set of member declarations
//!   (`class` module)
//! - **Members**: data values, descriptors and methods, with name-pattern
//!   privacy (`member` module)
//! - **Dispatch**: super-bindings and private method overrides resolved when a
//!   type is built, exposed to method bodies through `This` (`method` module)
//! - **Class members**: a mirrored static-side type per type, inheriting in
//!   lock-step
//! - **Interop**: converting native Rust types and apply-style construction
//!   (`convert` and `construct` modules)
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_engine::{base, Members, Value};
//!
//! let cat = base().extend(
//!     "Cat",
//!     Members::new()
//!         .method("init", |this, args| {
//!             this.set("color", args[0].clone())?;
//!             Ok(Value::Undefined)
//!         })
//!         .method("describe", |this, _args| {
//!             Ok(Value::from(format!("a {} cat", this.get("color")?)))
//!         }),
//!     Members::new().value("family", "Felidae"),
//! )?;
//!
//! let tom = cat.instantiate(&[Value::from("grey")])?;
//! assert_eq!(tom.call("describe", &[])?, Value::from("a grey cat"));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Types and the type extender
pub mod class;

/// Apply-style construction
pub mod construct;

/// Conversion of native types
pub mod convert;

/// Error types
pub mod error;

/// Instances
pub mod instance;

/// Member declarations and classification
pub mod member;

/// Method slots and the call context
pub mod method;

/// Extension options
pub mod options;

/// Dynamic values
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use class::TypeRef;
pub use construct::{construct, Constructible};
pub use convert::{convert, ForeignClass, ForeignObject};
pub use error::{ObjectError, ObjectResult};
pub use instance::Instance;
pub use member::{classify, Classification, Descriptor, MemberDecl, MemberKind, Members, Method, Visibility};
pub use method::This;
pub use options::{ExtendOptions, PrivatePattern};
pub use value::{NativeFunction, Record, Value};

use once_cell::sync::Lazy;

static BASE: Lazy<TypeRef> = Lazy::new(|| TypeRef::new_base("Class"));

/// The process-wide base type
///
/// Every type created from it is recorded in its subclass list for the life
/// of the process; use [`TypeRef::new_base`] for an isolated hierarchy.
pub fn base() -> TypeRef {
    BASE.clone()
}
