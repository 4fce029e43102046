use chrono::{TimeZone, Utc};
use scene_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    for msg in [Msg::NoOp, Msg::Tick] {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(state, next);
        assert!(effects.is_empty());
    }
}

#[test]
fn fresh_state_renders_nothing_loaded() {
    let view = AppState::new().view(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert!(!view.history.loaded);
    assert!(view.history.cards.is_empty());
    assert_eq!(view.history.placeholder, None);
    assert!(!view.can_process);
}
