//! Scenario: session eligibility after an accepted write.
//!
//! - Timed mode: `Cooldown{remaining_secs}` until the deadline, then eligible
//!   again (expiry observed lazily by the next check).
//! - One-shot mode: `AlreadySubmitted` forever.
//! - Unregistered / removed sessions: `UnknownSession`.

use cg_engine::*;

fn engine(cooldown: CooldownPolicy) -> GridEngine {
    GridEngine::new(EngineConfig {
        grid_size: 10,
        cooldown,
        grouping_window_ms: 1_000,
    })
}

#[test]
fn timed_cooldown_blocks_then_releases() {
    let mut e = engine(CooldownPolicy::Timed { duration_ms: 60_000 });
    let a = SessionId::new("a");
    e.add_session(&a);

    e.attempt_write(0, 0, "x", &a, 1_000).unwrap();
    assert_eq!(
        e.check_eligibility(&a, 1_000),
        EligibilityReport {
            can_update: false,
            cooldown_until: Some(61_000)
        }
    );

    assert_eq!(
        e.attempt_write(0, 1, "y", &a, 31_000),
        Err(WriteError::Cooldown { remaining_secs: 30 })
    );
    assert_eq!(
        e.attempt_write(0, 1, "y", &a, 60_500),
        Err(WriteError::Cooldown { remaining_secs: 1 })
    );

    assert!(e.attempt_write(0, 1, "y", &a, 61_000).is_ok());
}

#[test]
fn eligibility_check_clears_expired_cooldown() {
    let mut e = engine(CooldownPolicy::Timed { duration_ms: 10 });
    let a = SessionId::new("a");
    e.add_session(&a);
    e.attempt_write(3, 3, "x", &a, 100).unwrap();

    assert_eq!(
        e.check_eligibility(&a, 200),
        EligibilityReport {
            can_update: true,
            cooldown_until: None
        }
    );
}

#[test]
fn one_shot_is_terminal() {
    let mut e = engine(CooldownPolicy::OneShot);
    let a = SessionId::new("a");
    e.add_session(&a);

    e.attempt_write(0, 0, "x", &a, 1_000).unwrap();
    assert_eq!(
        e.attempt_write(5, 5, "y", &a, i64::MAX / 2),
        Err(WriteError::AlreadySubmitted)
    );
    assert_eq!(
        e.check_eligibility(&a, i64::MAX / 2),
        EligibilityReport {
            can_update: false,
            cooldown_until: None
        }
    );
}

#[test]
fn reconnect_gets_fresh_eligibility() {
    let mut e = engine(CooldownPolicy::OneShot);
    let first = SessionId::new("conn-1");
    e.add_session(&first);
    e.attempt_write(0, 0, "x", &first, 1_000).unwrap();

    e.remove_session(&first);
    assert_eq!(
        e.attempt_write(1, 1, "x", &first, 2_000),
        Err(WriteError::UnknownSession)
    );

    let second = SessionId::new("conn-2");
    e.add_session(&second);
    assert!(e.attempt_write(1, 1, "x", &second, 2_000).is_ok());

    // Removing sessions never touches grid or history.
    assert_eq!(e.grid().get(0, 0).unwrap().value, Some('x'));
    assert_eq!(e.history().len(), 2);
}

#[test]
fn add_session_is_idempotent() {
    let mut e = engine(CooldownPolicy::default());
    let a = SessionId::new("a");
    assert!(e.add_session(&a));
    e.attempt_write(0, 0, "x", &a, 1_000).unwrap();

    // Re-adding must not reset the cooldown.
    assert!(!e.add_session(&a));
    assert_eq!(e.session_count(), 1);
    assert!(matches!(
        e.attempt_write(0, 1, "y", &a, 1_001),
        Err(WriteError::Cooldown { .. })
    ));
}
