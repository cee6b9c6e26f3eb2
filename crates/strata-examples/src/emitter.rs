//! Native event emitter converted into a type
//!
//! Event names are dot-separated. With `wildcard` enabled, a `*` segment in
//! a listener's pattern matches any single segment of the emitted name.
//!
//! Listeners run while the converted instance's delegate is borrowed. A
//! listener that calls back into the same emitter (`emit`, `on`, ...) fails
//! with `ObjectError::DelegateBusy` instead of nesting; emit follow-up events
//! after the outer `emit` returns.

use strata_engine::{
    ExtendOptions, ForeignClass, NativeFunction, ObjectError, ObjectResult, TypeRef, Value,
};

/// Listener registry
#[derive(Debug, Default)]
pub struct Emitter {
    wildcard: bool,
    listeners: Vec<(String, NativeFunction)>,
}

impl Emitter {
    /// Create an emitter; `wildcard` enables `*` segments in listener patterns
    pub fn new(wildcard: bool) -> Self {
        Self {
            wildcard,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for an event name or pattern
    pub fn on(&mut self, event: impl Into<String>, listener: NativeFunction) {
        self.listeners.push((event.into(), listener));
    }

    /// Call every matching listener in registration order
    ///
    /// Returns whether any listener ran.
    pub fn emit(&self, event: &str, args: &[Value]) -> ObjectResult<bool> {
        let mut fired = false;
        for (pattern, listener) in &self.listeners {
            if self.matches(pattern, event) {
                listener.call(args)?;
                fired = true;
            }
        }
        Ok(fired)
    }

    /// Number of listeners matching `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .iter()
            .filter(|(pattern, _)| self.matches(pattern, event))
            .count()
    }

    fn matches(&self, pattern: &str, event: &str) -> bool {
        if !self.wildcard {
            return pattern == event;
        }
        let mut pattern = pattern.split('.');
        let mut event = event.split('.');
        loop {
            match (pattern.next(), event.next()) {
                (None, None) => return true,
                (Some(p), Some(e)) if p == "*" || p == e => {}
                _ => return false,
            }
        }
    }
}

fn event_name(args: &[Value]) -> ObjectResult<String> {
    match args.first() {
        Some(Value::Str(name)) => Ok(name.to_string()),
        Some(other) => Err(ObjectError::TypeError(format!(
            "event name must be a string, got {}",
            other.kind_name()
        ))),
        None => Err(ObjectError::TypeError("missing event name".into())),
    }
}

/// Foreign description of [`Emitter`]
///
/// The constructor takes an optional option bag (`{ wildcard: bool }`).
/// `someMember` is a plain prototype value.
pub fn emitter_class() -> ForeignClass {
    ForeignClass::new("EventEmitter", |args: &[Value]| {
        let wildcard = args
            .first()
            .and_then(Value::as_record)
            .map(|opts| opts.get("wildcard").is_truthy())
            .unwrap_or(false);
        Ok(Emitter::new(wildcard))
    })
    .method("on", |emitter: &mut Emitter, args| {
        let event = event_name(args)?;
        let listener = match args.get(1) {
            Some(Value::Function(f)) => f.clone(),
            _ => return Err(ObjectError::TypeError("listener must be a function".into())),
        };
        emitter.on(event, listener);
        Ok(Value::Undefined)
    })
    .method("emit", |emitter: &mut Emitter, args| {
        let event = event_name(args)?;
        emitter.emit(&event, &args[1..]).map(Value::Bool)
    })
    .method("listenerCount", |emitter: &mut Emitter, args| {
        let event = event_name(args)?;
        Ok(Value::Int(emitter.listener_count(&event) as i64))
    })
    .value("someMember", 123)
}

/// Convert the emitter into a type extending `root`
pub fn build(root: &TypeRef) -> ObjectResult<TypeRef> {
    root.convert(&emitter_class(), root.options().clone())
}

/// Convert the emitter under the global base type
pub fn build_global() -> ObjectResult<TypeRef> {
    strata_engine::convert(&emitter_class(), ExtendOptions::default())
}
