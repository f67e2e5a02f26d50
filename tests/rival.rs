use rand::rngs::StdRng;
use rand::SeedableRng;

use gto_trainer::cards::{make_card, Combo};
use gto_trainer::rival::RivalStyle;
use gto_trainer::rival_strategy::{build_profile, decide_action};

#[test]
fn rival_style_names_round_trip() {
    assert_eq!(RivalStyle::parse("aggressive"), RivalStyle::Aggressive);
    assert_eq!(RivalStyle::parse("passive"), RivalStyle::Passive);
    assert_eq!(RivalStyle::parse("nonsense"), RivalStyle::Balanced);
}

#[test]
fn strong_holding_continues_more_often_than_it_folds() {
    let range: Vec<Combo> = (0..8)
        .map(|r| Combo::new(make_card(r, 0), make_card(r, 1)).unwrap())
        .collect();
    let profile = build_profile(&range, 0.4, 0.6, None);
    let strongest = profile.ranked[0];

    let mut rng = StdRng::seed_from_u64(11);
    let folds = (0..200)
        .filter(|_| decide_action(Some(&profile), Some(strongest), None, &mut rng).folds)
        .count();
    assert!(folds < 100, "strongest combo folded {folds}/200 times");
}

#[test]
fn missing_profile_never_folds() {
    let mut rng = StdRng::seed_from_u64(3);
    let decision = decide_action(None, None, None, &mut rng);
    assert!(!decision.folds);
}
