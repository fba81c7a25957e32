use grove_agent::InteractionGate;

#[test]
fn second_trigger_inside_the_window_is_debounced() {
    let mut gate = InteractionGate::new();

    assert!(!gate.is_debounced(1, 1_000, 350));
    gate.debounce(1, 1_000);

    assert!(gate.is_debounced(1, 1_200, 350));

    // 400 ms after the accepted trigger the window has passed.
    assert!(!gate.is_debounced(1, 1_400, 350));
}

#[test]
fn actors_are_debounced_independently() {
    let mut gate = InteractionGate::new();
    gate.debounce(1, 1_000);

    assert!(gate.is_debounced(1, 1_100, 350));
    assert!(!gate.is_debounced(2, 1_100, 350));
}

#[test]
fn try_accept_records_only_accepted_triggers() {
    let mut gate = InteractionGate::new();

    assert!(gate.try_accept(1, 1_000, 350));
    assert!(!gate.try_accept(1, 1_200, 350));

    // The rejected trigger did not extend the window.
    assert!(gate.try_accept(1, 1_360, 350));
}
