//! Getter descriptors read from methods

use strata_engine::{Descriptor, Members, ObjectResult, TypeRef, Value};

/// Type with a read-only `foo` accessor (always 123) and `get2Foo`
pub fn build(root: &TypeRef) -> ObjectResult<TypeRef> {
    root.extend(
        "MyClass",
        Members::new()
            .descriptor(
                "foo",
                Descriptor::accessor().getter(|_this, _args| Ok(Value::Int(123))),
            )
            .method("get2Foo", |this, _args| {
                let foo = this.get("foo")?.as_int().unwrap_or(0);
                Ok(Value::Int(foo * 2))
            }),
        Members::new(),
    )
}
