//! Tests for method frame bookkeeping across threads

use std::sync::{Arc, Barrier};
use std::thread;
use strata_engine::{Members, TypeRef, Value};

/// `A.slow` parks between two barriers; `B.check` reports its frame view
fn parked_hierarchy(entered: Arc<Barrier>, release: Arc<Barrier>) -> TypeRef {
    let root = TypeRef::new_base("Root");
    let a = root
        .extend(
            "A",
            Members::new().method("slow", move |this, _args| {
                entered.wait();
                release.wait();
                Ok(Value::Int(this.depth() as i64))
            }),
            Members::new(),
        )
        .unwrap();
    a.extend(
        "B",
        Members::new().method("check", |this, _args| {
            Ok(Value::list(vec![
                Value::Bool(this.is_outermost()),
                this.get("_callerDepth")?,
            ]))
        }),
        Members::new(),
    )
    .unwrap()
}

// ============================================================================
// Threads
// ============================================================================

#[test]
fn test_concurrent_calls_keep_separate_frames() {
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let b = parked_hierarchy(Arc::clone(&entered), Arc::clone(&release));
    let obj = b.instantiate(&[]).unwrap();

    let parked = obj.clone();
    let worker = thread::spawn(move || {
        let depth = parked.call("slow", &[]).unwrap();
        (depth, parked.active_frames())
    });

    entered.wait();
    assert_eq!(obj.active_frames(), 0);
    let seen = obj.call("check", &[]).unwrap();
    assert_eq!(seen, Value::list(vec![Value::Bool(true), Value::Int(2)]));
    assert_eq!(obj.active_frames(), 0);
    release.wait();

    let (depth, frames_after) = worker.join().unwrap();
    assert_eq!(depth, Value::Int(1));
    assert_eq!(frames_after, 0);
}

#[test]
fn test_many_threads_share_one_instance() {
    let root = TypeRef::new_base("Root");
    let a = root
        .extend(
            "A",
            Members::new().method("depths", |this, _args| {
                Ok(Value::list(vec![
                    Value::Bool(this.is_outermost()),
                    this.get("_depth")?,
                    this.get("_callerDepth")?,
                ]))
            }),
            Members::new(),
        )
        .unwrap();
    let b = a
        .extend(
            "B",
            Members::new().method("depths", |this, args| this.call_super(args)),
            Members::new(),
        )
        .unwrap();
    let obj = b.instantiate(&[]).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let obj = obj.clone();
            thread::spawn(move || {
                (0..200)
                    .map(|_| obj.call("depths", &[]).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let expected = Value::list(vec![Value::Bool(false), Value::Int(1), Value::Int(2)]);
    for handle in handles {
        for seen in handle.join().unwrap() {
            assert_eq!(seen, expected);
        }
    }
    assert_eq!(obj.active_frames(), 0);
}
