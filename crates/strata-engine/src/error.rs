//! Errors raised while building types and invoking their members

/// Object model errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjectError {
    /// The parent type was created with `extendable = false`
    #[error("Type '{0}' is not extendable")]
    NotExtendable(String),

    /// A member declaration used one of the reserved internal key names
    #[error("Member name '{0}' is reserved")]
    ReservedName(String),

    /// Structural options differ between two levels of one hierarchy
    #[error("Options of '{child}' do not match those of its parent '{parent}'")]
    OptionsMismatch {
        /// Type being created
        child: String,
        /// Parent type
        parent: String,
    },

    /// No member with that name on the receiver's type
    #[error("'{type_name}' has no member '{name}'")]
    NoSuchMember {
        /// Receiver type name
        type_name: String,
        /// Requested member
        name: String,
    },

    /// `call_super` was used by a method with no ancestor implementation
    #[error("Method '{0}' has no super implementation")]
    NoSuperMethod(String),

    /// A private member was accessed from outside a method call
    #[error("Member '{0}' is private")]
    PrivateMember(String),

    /// Write to a getter-only accessor or a non-writable data descriptor
    #[error("Member '{0}' is read-only")]
    ReadOnly(String),

    /// Attempt to redefine a non-configurable accessor in a subclass
    #[error("Member '{0}' is not configurable")]
    NotConfigurable(String),

    /// The value cannot be used as a constructor
    #[error("{0} is not a constructor")]
    NotConstructible(String),

    /// Abstract method called
    #[error("Method '{0}' is not implemented")]
    NotImplemented(String),

    /// The foreign delegate is already borrowed further up the call stack
    #[error("Delegate of '{0}' is busy")]
    DelegateBusy(String),

    /// A converted instance was used before its delegate was constructed
    #[error("'{0}' has no delegate")]
    DelegateMissing(String),

    /// Private name pattern failed to compile
    #[error("Invalid private pattern: {0}")]
    InvalidPattern(String),

    /// Options could not be parsed
    #[error("Invalid options: {0}")]
    InvalidConfig(String),

    /// Wrong kind of value
    #[error("Type error: {0}")]
    TypeError(String),

    /// Error raised by user code
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ObjectError {
    /// Shorthand for raising from a method body
    pub fn runtime(msg: impl Into<String>) -> Self {
        ObjectError::Runtime(msg.into())
    }

    pub(crate) fn no_such_member(type_name: &str, name: &str) -> Self {
        ObjectError::NoSuchMember {
            type_name: type_name.to_string(),
            name: name.to_string(),
        }
    }
}

/// Object model result
pub type ObjectResult<T> = Result<T, ObjectError>;
