//! Extension options
//!
//! Options are resolved once per type. `TypeRef::extend` inherits the parent's
//! options; `TypeRef::extend_with_options` takes an explicit set, which must
//! agree with the parent on every structural field (everything except
//! `extendable`).

use crate::error::{ObjectError, ObjectResult};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default private-name pattern: a leading double underscore
pub const DEFAULT_PRIVATE_PATTERN: &str = "^__";

/// Compiled private-name matcher
#[derive(Debug, Clone)]
pub struct PrivatePattern(Regex);

impl PrivatePattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> ObjectResult<Self> {
        Regex::new(pattern)
            .map(PrivatePattern)
            .map_err(|e| ObjectError::InvalidPattern(e.to_string()))
    }

    /// Check a member name against the pattern
    pub fn matches(&self, name: &str) -> bool {
        self.0.is_match(name)
    }

    /// Source text of the pattern
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for PrivatePattern {
    fn default() -> Self {
        PrivatePattern(Regex::new(DEFAULT_PRIVATE_PATTERN).expect("default pattern is valid"))
    }
}

impl PartialEq for PrivatePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for PrivatePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PrivatePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        PrivatePattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Options controlling how a type is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendOptions {
    /// Whether the created type may itself be extended
    pub extendable: bool,
    /// Method invoked on instantiation
    pub constructor_name: String,
    /// Name under which a method reaches its super implementation
    pub super_name: String,
    /// Enables private methods and values
    pub privacy: bool,
    /// Names matching this pattern are private
    pub private_pattern: PrivatePattern,
    /// Routes private-named data values into per-instance private storage
    pub tracking: bool,
    /// Name exposing the declaring type's private object (disabled when `None`)
    pub private_object: Option<String>,
    /// Reserved key listing the visible private methods
    pub methods_key: String,
    /// Reserved key reporting the executing method's depth
    pub depth_key: String,
    /// Reserved key reporting the outermost frame's depth
    pub caller_depth_key: String,
    /// Reserved key holding a converted instance's delegate
    pub delegate_name: String,
}

impl Default for ExtendOptions {
    fn default() -> Self {
        Self {
            extendable: true,
            constructor_name: "init".to_string(),
            super_name: "_super".to_string(),
            privacy: true,
            private_pattern: PrivatePattern::default(),
            tracking: true,
            private_object: None,
            methods_key: "_methods".to_string(),
            depth_key: "_depth".to_string(),
            caller_depth_key: "_callerDepth".to_string(),
            delegate_name: "_origin".to_string(),
        }
    }
}

impl ExtendOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json(source: &str) -> ObjectResult<Self> {
        serde_json::from_str(source).map_err(|e| ObjectError::InvalidConfig(e.to_string()))
    }

    /// Serialize options to JSON
    pub fn to_json(&self) -> ObjectResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ObjectError::InvalidConfig(e.to_string()))
    }

    /// Set the extendable flag
    pub fn with_extendable(mut self, extendable: bool) -> Self {
        self.extendable = extendable;
        self
    }

    /// Set the constructor method name
    pub fn with_constructor_name(mut self, name: impl Into<String>) -> Self {
        self.constructor_name = name.into();
        self
    }

    /// Set the super-binding name
    pub fn with_super_name(mut self, name: impl Into<String>) -> Self {
        self.super_name = name.into();
        self
    }

    /// Enable or disable privacy emulation
    pub fn with_privacy(mut self, privacy: bool) -> Self {
        self.privacy = privacy;
        self
    }

    /// Set the private-name pattern
    pub fn with_private_pattern(mut self, pattern: &str) -> ObjectResult<Self> {
        self.private_pattern = PrivatePattern::new(pattern)?;
        Ok(self)
    }

    /// Enable or disable private value tracking
    pub fn with_tracking(mut self, tracking: bool) -> Self {
        self.tracking = tracking;
        self
    }

    /// Expose the per-type private object under `name`
    pub fn with_private_object(mut self, name: impl Into<String>) -> Self {
        self.private_object = Some(name.into());
        self
    }

    /// Set the delegate key used by converted types
    pub fn with_delegate_name(mut self, name: impl Into<String>) -> Self {
        self.delegate_name = name.into();
        self
    }

    /// Whether a method with this name is private
    pub fn is_private_method(&self, name: &str) -> bool {
        self.privacy && self.private_pattern.matches(name)
    }

    /// Whether a data value with this name is private
    pub fn is_private_value(&self, name: &str) -> bool {
        self.privacy && self.tracking && self.private_pattern.matches(name)
    }

    /// Internal key names a member declaration must not use
    pub fn reserved_names(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.super_name.as_str()),
            Some(self.methods_key.as_str()),
            Some(self.depth_key.as_str()),
            Some(self.caller_depth_key.as_str()),
            Some(self.delegate_name.as_str()),
            self.private_object.as_deref(),
        ]
        .into_iter()
        .flatten()
    }

    /// Check a name against the reserved keys
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_names().any(|reserved| reserved == name)
    }

    /// Keys answered by the call context rather than stored on instances
    pub fn is_frame_key(&self, name: &str) -> bool {
        name == self.super_name
            || name == self.methods_key
            || name == self.depth_key
            || name == self.caller_depth_key
            || self.private_object.as_deref() == Some(name)
    }

    /// Compare every field except `extendable`
    pub fn structurally_eq(&self, other: &ExtendOptions) -> bool {
        let mut a = self.clone();
        a.extendable = other.extendable;
        a == *other
    }
}
