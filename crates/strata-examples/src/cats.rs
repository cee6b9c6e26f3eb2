//! Cat and Lion

use strata_engine::{Members, ObjectError, ObjectResult, This, TypeRef, Value};

/// The two types of the cat hierarchy
#[derive(Debug, Clone)]
pub struct Cats {
    /// Abstract cat: `meow` is not implemented
    pub cat: TypeRef,
    /// Sandy lion that roars and sleeps twice as hard
    pub lion: TypeRef,
}

fn bump_sleep_counter(this: &This<'_>) -> ObjectResult<()> {
    let n = this.get("sleepCounter")?.as_int().unwrap_or(0);
    this.set("sleepCounter", n + 1)
}

/// Build `Cat` under `root` and `Lion` under `Cat`
pub fn build(root: &TypeRef) -> ObjectResult<Cats> {
    let cat = root.extend(
        "Cat",
        Members::new()
            .method("init", |this, args| {
                this.set("color", args.first().cloned().unwrap_or_default())?;
                this.set("sleepCounter", 0)?;
                Ok(Value::Undefined)
            })
            .method("meow", |_this, _args| {
                Err(ObjectError::NotImplemented("meow".into()))
            })
            .method("sleep", |this, _args| {
                bump_sleep_counter(this)?;
                Ok(Value::Object(this.instance().clone()))
            }),
        Members::new().value("family", "Felidae"),
    )?;

    let lion = cat.extend(
        "Lion",
        Members::new()
            .method("init", |this, _args| this.call_super(&[Value::from("sandy")]))
            .method("meow", |_this, _args| Ok(Value::from("Roooaaar!")))
            .method("sleep", |this, args| {
                this.call_super(args)?;
                bump_sleep_counter(this)?;
                Ok(Value::Object(this.instance().clone()))
            }),
        Members::new().method("getFamily", |this, _args| this.get("family")),
    )?;

    tracing::debug!(cat = %cat.name(), lion = %lion.name(), "built cat hierarchy");
    Ok(Cats { cat, lion })
}
