//! Integration tests for chain construction, rollback and teardown order.
//!
//! Each link is a `Dummy` that records when it is acquired and released, and
//! can be told to fail either step. Failures are named `c<level>` for acquire
//! and `d<level>` for release.

use std::sync::{Arc, Mutex};

use closeable_chain::{assert_no_suppressed, assert_suppressed, Chain, Suppressed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Acquired(usize),
    Complete,
    Released(usize),
}

#[derive(Debug)]
struct Dummy {
    level: usize,
    fail_release: bool,
}

#[derive(Clone, Default)]
struct Tracer {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Tracer {
    fn acquire<T>(
        &self,
        level: usize,
        fail: bool,
        fail_release: bool,
    ) -> impl FnOnce(&T) -> Result<Dummy, String> {
        let events = self.events.clone();
        move |_| {
            if fail {
                return Err(format!("c{}", level));
            }
            events.lock().unwrap().push(Event::Acquired(level));
            Ok(Dummy {
                level,
                fail_release,
            })
        }
    }

    fn release(&self) -> impl FnOnce(Dummy) -> Result<(), String> + Send + 'static {
        let events = self.events.clone();
        move |dummy| {
            if dummy.fail_release {
                return Err(format!("d{}", dummy.level));
            }
            events.lock().unwrap().push(Event::Released(dummy.level));
            Ok(())
        }
    }

    fn complete(&self) {
        self.events.lock().unwrap().push(Event::Complete);
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

// ============================================================================
// Orderly construction and teardown
// ============================================================================

#[test]
fn close_releases_in_reverse_acquisition_order() {
    let tracer = Tracer::default();

    let chain = Chain::<(), String>::new()
        .append(tracer.acquire(1, false, false), tracer.release())
        .and_then(|c| c.append(tracer.acquire(2, false, false), tracer.release()))
        .and_then(|c| c.append(tracer.acquire(3, false, false), tracer.release()))
        .unwrap();

    assert_eq!(chain.output().level, 3);
    chain.close().unwrap();

    assert_eq!(
        tracer.events(),
        vec![
            Event::Acquired(1),
            Event::Acquired(2),
            Event::Acquired(3),
            Event::Released(3),
            Event::Released(2),
            Event::Released(1),
        ]
    );
}

#[test]
fn close_on_empty_chain_does_nothing() {
    let chain = Chain::<(), String>::new();
    assert!(chain.close().is_ok());
}

#[test]
fn output_is_last_acquired_value_and_each_step_sees_previous() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (s1, s2, s3) = (seen.clone(), seen.clone(), seen.clone());

    let chain = Chain::<(), String>::new()
        .append(
            move |_: &()| {
                s1.lock().unwrap().push(None);
                Ok::<_, String>(1u32)
            },
            |_| Ok(()),
        )
        .and_then(|c| {
            c.append(
                move |prev: &u32| {
                    s2.lock().unwrap().push(Some(*prev));
                    Ok(prev + 10)
                },
                |_| Ok(()),
            )
        })
        .and_then(|c| {
            c.append(
                move |prev: &u32| {
                    s3.lock().unwrap().push(Some(*prev));
                    Ok(prev * 3)
                },
                |_| Ok(()),
            )
        })
        .unwrap();

    assert_eq!(chain.output(), &33);
    assert_eq!(*seen.lock().unwrap(), vec![None, Some(1), Some(11)]);
    chain.close().unwrap();
}

// ============================================================================
// Rollback after a failed acquisition
// ============================================================================

#[test]
fn first_acquire_failure_releases_nothing() {
    let tracer = Tracer::default();

    let err = Chain::<(), String>::new()
        .append(tracer.acquire(1, true, false), tracer.release())
        .and_then(|c| c.append(tracer.acquire(2, false, false), tracer.release()))
        .unwrap_err();

    assert!(tracer.events().is_empty());
    assert_no_suppressed!(err, "c1");
}

#[test]
fn mid_chain_acquire_failure_releases_earlier_links_in_reverse() {
    let tracer = Tracer::default();

    let err = Chain::<(), String>::new()
        .append(tracer.acquire(1, false, false), tracer.release())
        .and_then(|c| c.append(tracer.acquire(2, false, false), tracer.release()))
        .and_then(|c| c.append(tracer.acquire(3, true, false), tracer.release()))
        .and_then(|c| c.append(tracer.acquire(4, false, false), tracer.release()))
        .unwrap_err();

    assert_eq!(
        tracer.events(),
        vec![
            Event::Acquired(1),
            Event::Acquired(2),
            Event::Released(2),
            Event::Released(1),
        ]
    );
    assert_no_suppressed!(err, "c3");
}

#[test]
fn release_failures_during_rollback_are_suppressed_into_acquire_failure() {
    let tracer = Tracer::default();

    let err = Chain::<(), String>::new()
        .append(tracer.acquire(1, false, true), tracer.release())
        .and_then(|c| c.append(tracer.acquire(2, false, true), tracer.release()))
        .and_then(|c| c.append(tracer.acquire(3, true, false), tracer.release()))
        .unwrap_err();

    assert_eq!(tracer.events(), vec![Event::Acquired(1), Event::Acquired(2)]);
    assert_suppressed!(err, "c3", ["d2", "d1"]);
}

// ============================================================================
// Failures during an orderly close
// ============================================================================

#[test]
fn first_release_failure_is_primary_during_close() {
    let tracer = Tracer::default();

    let chain = Chain::<(), String>::new()
        .append(tracer.acquire(1, false, true), tracer.release())
        .and_then(|c| c.append(tracer.acquire(2, false, true), tracer.release()))
        .and_then(|c| c.append(tracer.acquire(3, false, false), tracer.release()))
        .unwrap();

    tracer.complete();
    let err = chain.close().unwrap_err();

    assert_eq!(
        tracer.events(),
        vec![
            Event::Acquired(1),
            Event::Acquired(2),
            Event::Acquired(3),
            Event::Complete,
            Event::Released(3),
        ]
    );
    assert_suppressed!(err, "d2", ["d1"]);
}

#[test]
fn use_failure_suppresses_teardown_failures() {
    let tracer = Tracer::default();

    let chain = Chain::<(), String>::new()
        .append(tracer.acquire(1, false, true), tracer.release())
        .and_then(|c| c.append(tracer.acquire(2, false, false), tracer.release()))
        .unwrap();

    let used: Result<(), String> = Err(format!("use of {} failed", chain.output().level));
    let err = match used {
        Ok(()) => panic!("use should fail"),
        Err(e) => chain.close_suppressing(e),
    };

    assert_suppressed!(err, "use of 2 failed".to_string(), ["d1"]);
    assert_eq!(
        tracer.events(),
        vec![Event::Acquired(1), Event::Acquired(2), Event::Released(2)]
    );
}

#[test]
fn several_chains_can_share_one_failure_record() {
    let tracer = Tracer::default();

    let first = Chain::<(), String>::new()
        .append(tracer.acquire(1, false, true), tracer.release())
        .unwrap();
    let second = Chain::<(), String>::new()
        .append(tracer.acquire(2, false, true), tracer.release())
        .unwrap();

    let mut record: Suppressed<&str, String> = Suppressed::new("shutdown");
    second.close_into(&mut record);
    first.close_into(&mut record);

    assert_suppressed!(record, "shutdown", ["d2", "d1"]);
}

// ============================================================================
// Effect links
// ============================================================================

#[test]
fn effect_links_share_the_value_and_release_first() {
    let tracer = Tracer::default();
    let effects = Arc::new(Mutex::new(Vec::new()));
    let (on_attach, on_detach) = (effects.clone(), effects.clone());

    let chain = Chain::<(), String>::new()
        .append(tracer.acquire(1, false, false), tracer.release())
        .and_then(|c| {
            c.append_effect(
                move |d: &Dummy| {
                    on_attach.lock().unwrap().push(format!("attach {}", d.level));
                    Ok(())
                },
                move |d: &Dummy| {
                    on_detach.lock().unwrap().push(format!("detach {}", d.level));
                    Ok(())
                },
            )
        })
        .unwrap();

    assert_eq!(chain.output().level, 1);
    assert_eq!(chain.len(), 2);
    chain.close().unwrap();

    assert_eq!(*effects.lock().unwrap(), vec!["attach 1", "detach 1"]);
    assert_eq!(tracer.events(), vec![Event::Acquired(1), Event::Released(1)]);
}

#[test]
fn failed_effect_rolls_back_the_chain() {
    let tracer = Tracer::default();

    let err = Chain::<(), String>::new()
        .append(tracer.acquire(1, false, true), tracer.release())
        .and_then(|c| c.append(tracer.acquire(2, false, false), tracer.release()))
        .and_then(|c| c.append_effect(|_| Err("c3".to_string()), |_| Ok(())))
        .unwrap_err();

    assert_suppressed!(err, "c3", ["d1"]);
    assert_eq!(
        tracer.events(),
        vec![Event::Acquired(1), Event::Acquired(2), Event::Released(2)]
    );
}
