//! Tests for accessor and data descriptors

use strata_engine::{Descriptor, Members, ObjectError, TypeRef, Value};

fn temperature(root: &TypeRef) -> TypeRef {
    root.extend(
        "Temperature",
        Members::new()
            .method("init", |this, args| {
                this.set("__celsius", args.first().cloned().unwrap_or(Value::Int(0)))?;
                Ok(Value::Undefined)
            })
            .descriptor(
                "celsius",
                Descriptor::accessor()
                    .getter(|this, _args| this.get("__celsius"))
                    .setter(|this, args| {
                        this.set("__celsius", args[0].clone())?;
                        Ok(Value::Undefined)
                    })
                    .enumerable(true),
            )
            .descriptor(
                "fahrenheit",
                Descriptor::accessor().getter(|this, _args| {
                    let c = this.get("celsius")?.as_int().unwrap_or(0);
                    Ok(Value::Int(c * 9 / 5 + 32))
                }),
            ),
        Members::new(),
    )
    .unwrap()
}

#[test]
fn test_accessor_round_trip_through_private_storage() {
    let root = TypeRef::new_base("Root");
    let ty = temperature(&root);
    let t = ty.instantiate(&[Value::Int(100)]).unwrap();

    assert_eq!(t.get("celsius").unwrap(), Value::Int(100));
    assert_eq!(t.get("fahrenheit").unwrap(), Value::Int(212));

    t.set("celsius", 0).unwrap();
    assert_eq!(t.get("fahrenheit").unwrap(), Value::Int(32));
    assert!(t.own_keys().is_empty());
}

#[test]
fn test_accessor_without_setter_is_read_only() {
    let root = TypeRef::new_base("Root");
    let ty = temperature(&root);
    let t = ty.instantiate(&[]).unwrap();

    assert_eq!(
        t.set("fahrenheit", 50),
        Err(ObjectError::ReadOnly("fahrenheit".into()))
    );
}

#[test]
fn test_getter_composes_with_super() {
    let root = TypeRef::new_base("Root");
    let a = root
        .extend(
            "A",
            Members::new().descriptor(
                "foo",
                Descriptor::accessor().getter(|_this, _args| Ok(Value::Int(123))),
            ),
            Members::new(),
        )
        .unwrap();
    let b = a
        .extend(
            "B",
            Members::new()
                .descriptor(
                    "foo",
                    Descriptor::accessor().getter(|this, _args| {
                        let inner = this.call_super(&[])?.as_int().unwrap_or(0);
                        Ok(Value::Int(inner + 1))
                    }),
                )
                .method("get2Foo", |this, _args| {
                    let foo = this.get("foo")?.as_int().unwrap_or(0);
                    Ok(Value::Int(foo * 2))
                }),
            Members::new(),
        )
        .unwrap();

    assert_eq!(a.instantiate(&[]).unwrap().get("foo").unwrap(), Value::Int(123));
    let obj = b.instantiate(&[]).unwrap();
    assert_eq!(obj.get("foo").unwrap(), Value::Int(124));
    assert_eq!(obj.call("get2Foo", &[]).unwrap(), Value::Int(248));
}

#[test]
fn test_setter_composes_with_super() {
    let root = TypeRef::new_base("Root");
    let a = root
        .extend(
            "A",
            Members::new().descriptor(
                "level",
                Descriptor::accessor()
                    .getter(|this, _args| this.get("__level"))
                    .setter(|this, args| {
                        let n = args[0].as_int().unwrap_or(0);
                        this.set("__level", n + 1)?;
                        Ok(Value::Undefined)
                    }),
            ),
            Members::new(),
        )
        .unwrap();
    let b = a
        .extend(
            "B",
            Members::new().descriptor(
                "level",
                Descriptor::accessor()
                    .getter(|this, _args| this.call_super(&[]))
                    .setter(|this, args| {
                        let n = args[0].as_int().unwrap_or(0);
                        this.call_super(&[Value::Int(n * 10)])
                    }),
            ),
            Members::new(),
        )
        .unwrap();

    let plain = a.instantiate(&[]).unwrap();
    plain.set("level", 2).unwrap();
    assert_eq!(plain.get("level").unwrap(), Value::Int(3));

    let obj = b.instantiate(&[]).unwrap();
    obj.set("level", 2).unwrap();
    assert_eq!(obj.get("level").unwrap(), Value::Int(21));
    assert!(obj.own_keys().is_empty());
}

#[test]
fn test_data_descriptor_flags() {
    let root = TypeRef::new_base("Root");
    let ty = root
        .extend(
            "Flags",
            Members::new()
                .descriptor("fixed", Descriptor::data(1))
                .descriptor("open", Descriptor::data(2).writable(true).enumerable(true))
                .value("plain", 3),
            Members::new(),
        )
        .unwrap();
    let obj = ty.instantiate(&[]).unwrap();

    assert_eq!(obj.get("fixed").unwrap(), Value::Int(1));
    assert_eq!(obj.set("fixed", 10), Err(ObjectError::ReadOnly("fixed".into())));

    obj.set("open", 20).unwrap();
    assert_eq!(obj.get("open").unwrap(), Value::Int(20));

    assert_eq!(obj.keys(), vec!["open", "plain"]);
}

#[test]
fn test_non_configurable_member_cannot_be_redefined() {
    let root = TypeRef::new_base("Root");
    let a = root
        .extend(
            "A",
            Members::new().descriptor("id", Descriptor::data("a").configurable(false)),
            Members::new(),
        )
        .unwrap();

    let err = a
        .extend("B", Members::new().value("id", "b"), Members::new())
        .unwrap_err();
    assert_eq!(err, ObjectError::NotConfigurable("id".into()));
    assert!(a.subclasses().is_empty());
}

#[test]
fn test_private_named_accessor_stays_public() {
    let root = TypeRef::new_base("Root");
    let ty = root
        .extend(
            "Odd",
            Members::new().descriptor(
                "__exposed",
                Descriptor::accessor().getter(|_this, _args| Ok(Value::from("visible"))),
            ),
            Members::new(),
        )
        .unwrap();

    let obj = ty.instantiate(&[]).unwrap();
    assert_eq!(obj.get("__exposed").unwrap(), Value::from("visible"));
    assert!(ty.member_names().contains(&"__exposed".to_string()));
}
