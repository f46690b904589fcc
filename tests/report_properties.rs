// tests/report_properties.rs

use proptest::prelude::*;

use camfleet::supervisor::{FleetReport, ProcessState};
use camfleet::types::ExitOutcome;

fn terminal_state() -> impl Strategy<Value = ProcessState> {
    prop_oneof![
        4 => Just(ProcessState::Exited(ExitOutcome::Code(0))),
        2 => (1..=255i32).prop_map(|c| ProcessState::Exited(ExitOutcome::Code(c))),
        1 => (1..=31i32).prop_map(|s| ProcessState::Exited(ExitOutcome::Signal(s))),
        1 => Just(ProcessState::Killed),
    ]
}

// A fleet of terminal states plus a permutation of its tags, used as the
// order in which exits were observed.
fn fleet_strategy() -> impl Strategy<Value = (Vec<ProcessState>, Vec<usize>)> {
    proptest::collection::vec(terminal_state(), 1..12).prop_flat_map(|states| {
        let order: Vec<usize> = (0..states.len()).collect();
        (Just(states), Just(order).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn exit_code_is_zero_iff_every_member_exited_zero((states, order) in fleet_strategy()) {
        let tags: Vec<String> = (0..states.len()).map(|i| format!("cam{i}")).collect();
        let entries: Vec<_> = tags.iter().cloned().zip(states.iter().copied()).collect();
        let exit_order: Vec<String> = order.iter().map(|&i| tags[i].clone()).collect();

        let report = FleetReport::new(entries.clone(), exit_order);
        let in_config_order = FleetReport::new(entries, tags.clone());

        let all_zero = states
            .iter()
            .all(|s| *s == ProcessState::Exited(ExitOutcome::Code(0)));

        prop_assert_eq!(report.exit_code() == 0, all_zero);
        prop_assert_eq!(report.exit_code(), in_config_order.exit_code());
        prop_assert_eq!(report.failed_tags().len(), states.iter().filter(|s| !s.succeeded()).count());
    }
}
