use gto_trainer::cards::make_card;
use gto_trainer::equity::{best_five_card_hand, equity_vs_combo, HandCategory};

#[test]
fn quads_outrank_full_house() {
    let nine_c = make_card(7, 3);
    let nine_d = make_card(7, 2);
    let nine_h = make_card(7, 1);
    let nine_s = make_card(7, 0);
    let ace_c = make_card(12, 3);
    let ace_h = make_card(12, 1);
    let five_c = make_card(3, 3);
    let cards = vec![nine_c, nine_d, nine_h, nine_s, ace_c, ace_h, five_c];

    let strength = best_five_card_hand(&cards);
    assert_eq!(strength.category, HandCategory::FourOfAKind);
    assert_eq!(strength.ranks[0], 7);
}

#[test]
fn monte_carlo_equity_matches_expected_range() {
    let hero = [make_card(12, 0), make_card(12, 1)];
    let villain = [make_card(11, 0), make_card(11, 1)];

    let equity = equity_vs_combo(hero, &[], villain, 10_000, None).expect("equity computes");

    // AA vs KK preflop equity is ~82%. Allow a small tolerance due to Monte Carlo variance.
    assert!(equity > 0.75 && equity < 0.9, "equity={equity}");
}

#[test]
fn equity_respects_a_known_board() {
    let hero = [make_card(12, 0), make_card(11, 0)];
    let villain = [make_card(10, 3), make_card(9, 3)];
    // Board is T-Q-J of hero's suit: hero holds a made royal flush.
    let board = vec![make_card(8, 0), make_card(10, 0), make_card(9, 0)];

    let equity = equity_vs_combo(hero, &board, villain, 5_000, None).expect("equity computes");
    assert!(equity > 0.99, "equity={equity}");
}
