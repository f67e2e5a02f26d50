use gto_trainer::rival::RivalStyle;
use gto_trainer::session::{NodeOutcome, SessionConfig, SessionManager};

#[test]
fn folding_ends_session_and_records_summary() {
    let manager = SessionManager::new();
    let id = manager.create_session(SessionConfig { hands: 1, mc_trials: 100, rival_style: RivalStyle::Balanced, seed: Some(42) });

    let NodeOutcome::Node(initial) = manager.get_node(id).unwrap() else { panic!("expected a node") };
    assert_eq!(initial.hand_no, 1);
    assert!(!initial.options.is_empty());

    let fold_index = initial.options.iter().position(|opt| opt.key == "fold").expect("fold option available");
    let result = manager.choose(id, fold_index).unwrap();

    assert!(result.hand_ended);
    let NodeOutcome::Done(summary) = result.next else { panic!("expected the session to be done") };
    assert_eq!(summary.hands, 1);
    assert!(summary.ev_lost >= 0.0);
}
