use gto_trainer::episode::Street;
use gto_trainer::rival::RivalStyle;
use gto_trainer::session::{NodeOutcome, SessionConfig, SessionManager};

#[test]
fn calling_preflop_advances_to_flop() {
    let manager = SessionManager::new();
    let id = manager.create_session(SessionConfig { hands: 1, mc_trials: 200, rival_style: RivalStyle::Balanced, seed: Some(2025) });

    let NodeOutcome::Node(pre) = manager.get_node(id).unwrap() else { panic!("expected a node") };
    assert_eq!(pre.street, Street::Preflop);

    let call_index = pre.options.iter().position(|opt| opt.key == "call").expect("call option");
    let result = manager.choose(id, call_index).unwrap();

    let NodeOutcome::Node(flop) = result.next else { panic!("expected another node") };
    assert_eq!(flop.street, Street::Flop);
    assert_eq!(flop.board_cards.len(), 3);
}

#[test]
fn session_rolls_into_next_hand_after_a_fold() {
    let manager = SessionManager::new();
    let id = manager.create_session(SessionConfig { hands: 2, mc_trials: 150, rival_style: RivalStyle::Passive, seed: Some(11) });

    let NodeOutcome::Node(first) = manager.get_node(id).unwrap() else { panic!("expected a node") };
    let fold_index = first.options.iter().position(|opt| opt.key == "fold").expect("fold option");

    let result = manager.choose(id, fold_index).unwrap();
    assert!(result.hand_ended);

    let NodeOutcome::Node(second) = result.next else { panic!("expected the second hand's node") };
    assert_eq!(second.hand_no, 2);
}
