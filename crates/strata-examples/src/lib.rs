//! Example hierarchies built with the Strata object model
//!
//! - [`cats`]: an abstract `Cat` and a `Lion` overriding it with super calls
//! - [`emitter`]: a native event emitter converted into a regular type
//! - [`accessors`]: getter descriptors used from methods

pub mod accessors;
pub mod cats;
pub mod emitter;
