//! Applies a chosen `Option` to `HandState`: moves chips, samples the
//! rival's fold/continue decision where one is needed, and reports whether
//! the hand ended. Building the next street's `Node` from the updated state
//! is the session driver's job, not this module's — `resolve_for` only
//! mutates shared hand state and narrates what happened.

use rand::Rng;

use crate::cards::{format_cards_spaced, Combo};
use crate::episode::{HandState, Option as EngineOption, OptionResolution};
use crate::equity::showdown_result;
use crate::hand_state::{apply_contribution, Role};
use crate::rival_strategy::{decide_action, RivalProfile, VillainAdapt};

fn equity_override_forces_fold(
    state: &HandState,
    profile: Option<&RivalProfile>,
    call_cost: f64,
    final_pot: f64,
) -> Option<bool> {
    let rival_cards = state.rival_cards?;
    let hero_vs_known = showdown_result(&state.hero_cards, &state.board, &rival_cards);
    let be = call_cost / final_pot.max(1e-9);
    if 1.0 - hero_vs_known < be {
        return Some(true);
    }
    let _ = profile;
    None
}

fn sample_rival_response<R: Rng + ?Sized>(
    state: &HandState,
    profile: Option<&RivalProfile>,
    adapt: Option<VillainAdapt>,
    call_cost: f64,
    final_pot: f64,
    rng: &mut R,
) -> bool {
    if let Some(forced) = equity_override_forces_fold(state, profile, call_cost, final_pot) {
        return forced;
    }
    let rival_combo = state.rival_cards.map(|c| Combo::new(c[0], c[1]).expect("distinct rival cards"));
    decide_action(profile, rival_combo, adapt, rng).folds
}

/// Hero folds: the rival collects whatever is already in the pot.
pub fn resolve_fold(state: &mut HandState) -> OptionResolution {
    state.hand_over = true;
    state.rival_continue_range = None;
    OptionResolution { hand_ended: true, note: Some("Hero folds; rival collects the pot.".to_string()), reveal_rival: false }
}

/// Hero calls a bet/raise: applies the call amount and, since calling never
/// ends the hand by itself here, leaves `hand_ended` for the caller to set
/// once the final street's showdown has been resolved.
pub fn resolve_call(state: &mut HandState, call_cost: f64) -> OptionResolution {
    apply_contribution(state, Role::Hero, call_cost);
    OptionResolution { hand_ended: false, note: Some(format!("Hero calls {call_cost:.2}bb.")), reveal_rival: false }
}

pub fn resolve_check(state: &mut HandState) -> OptionResolution {
    OptionResolution { hand_ended: false, note: Some("Hero checks.".to_string()), reveal_rival: false }
}

/// Hero bets/raises/jams: applies the hero's risk, samples whether the
/// rival folds or continues, and updates the pot accordingly. Returns
/// whether the hand ended (rival folded) alongside a narrated note.
pub fn resolve_aggressive_action<R: Rng + ?Sized>(
    state: &mut HandState,
    option: &EngineOption,
    risk: f64,
    profile: Option<&RivalProfile>,
    adapt: Option<VillainAdapt>,
    rival_call_cap: f64,
    is_final_street: bool,
    rng: &mut R,
) -> OptionResolution {
    apply_contribution(state, Role::Hero, risk);
    let call_cost = risk;
    let final_pot = state.pot + call_cost;
    let rival_folds = sample_rival_response(state, profile, adapt, call_cost, final_pot, rng);

    if rival_folds {
        state.hand_over = true;
        state.rival_continue_range = None;
        return OptionResolution {
            hand_ended: true,
            note: Some("Rival folds to the aggression.".to_string()),
            reveal_rival: true,
        };
    }

    let rival_call = call_cost.min(rival_call_cap);
    apply_contribution(state, Role::Rival, rival_call);
    narrow_rival_continue_range(state, option);

    if is_final_street {
        let note = showdown_note(state);
        state.hand_over = true;
        OptionResolution { hand_ended: true, note: Some(note), reveal_rival: true }
    } else {
        OptionResolution { hand_ended: false, note: Some("Rival calls.".to_string()), reveal_rival: true }
    }
}

/// `_update_rival_range`: once a rival call is resolved, narrows
/// `rival_continue_range` to the combos the chosen option's profile marked
/// as plausibly continuing, rather than leaving the prior street's (wider)
/// range in place until an explicit later recomputation.
fn narrow_rival_continue_range(state: &mut HandState, option: &EngineOption) {
    let Some(profile) = option.meta.rival_profile.as_ref() else { return };
    let continuing: Vec<(crate::cards::Card, crate::cards::Card)> =
        profile.ranked.iter().take(profile.continue_count).map(|combo| {
            let cards = combo.cards();
            (cards[0], cards[1])
        }).collect();
    if !continuing.is_empty() {
        state.rival_continue_range = Some(continuing);
    }
}

fn showdown_note(state: &HandState) -> String {
    let Some(rival_cards) = state.rival_cards else {
        return "Showdown: rival's hand is unknown.".to_string();
    };
    let result = showdown_result(&state.hero_cards, &state.board, &rival_cards);
    let rival_str = format_cards_spaced(&rival_cards);
    if result > 0.5 {
        format!("Showdown: hero wins against rival's {rival_str}.")
    } else if result < 0.5 {
        format!("Showdown: rival's {rival_str} wins the pot.")
    } else {
        format!("Showdown: chop against rival's {rival_str}.")
    }
}

/// A river check that isn't followed by a bet goes straight to showdown.
pub fn resolve_river_check_showdown(state: &mut HandState) -> OptionResolution {
    state.hand_over = true;
    let note = showdown_note(state);
    state.rival_continue_range = None;
    OptionResolution { hand_ended: true, note: Some(note), reveal_rival: true }
}

/// Dispatches a chosen option's key to the matching resolution routine.
/// `is_final_street` tells an aggressive action whether a rival call should
/// go to showdown immediately (river) or advance to the next street.
pub fn resolve_for<R: Rng + ?Sized>(
    option: &EngineOption,
    state: &mut HandState,
    profile: Option<&RivalProfile>,
    adapt: Option<VillainAdapt>,
    is_final_street: bool,
    rng: &mut R,
) -> OptionResolution {
    match option.key.as_str() {
        "fold" => resolve_fold(state),
        "call" => {
            let call_cost = option.meta.risk.unwrap_or(0.0);
            if is_final_street {
                let resolution = resolve_call(state, call_cost);
                let mut resolution = resolution;
                resolution.note = Some(showdown_note(state));
                resolution.hand_ended = true;
                resolution.reveal_rival = true;
                state.hand_over = true;
                resolution
            } else {
                resolve_call(state, call_cost)
            }
        }
        "check" => {
            if is_final_street {
                resolve_river_check_showdown(state)
            } else {
                resolve_check(state)
            }
        }
        "3bet" | "bet" | "raise" | "jam" | "allin" | "all-in" => {
            let risk = option.meta.risk.unwrap_or(0.0);
            let rival_call_cap = state.rival_stack;
            resolve_aggressive_action(state, option, risk, profile, adapt, rival_call_cap, is_final_street, rng)
        }
        _ => OptionResolution { hand_ended: option.ends_hand, note: None, reveal_rival: false },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;
    use crate::episode::OptionMeta;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn dummy_aggressive_option() -> EngineOption {
        EngineOption {
            key: "jam".to_string(),
            ev: 0.0,
            why: String::new(),
            gto_freq: None,
            ends_hand: false,
            meta: OptionMeta::default(),
            resolution_note: None,
        }
    }

    fn state() -> HandState {
        HandState {
            hero_cards: [make_card(12, 0), make_card(12, 1)],
            rival_cards: Some([make_card(0, 2), make_card(1, 3)]),
            board: vec![],
            hero_contrib: 2.5,
            rival_contrib: 1.0,
            pot: 3.5,
            hero_stack: 97.5,
            rival_stack: 99.0,
            effective_stack: 97.5,
            rival_continue_range: None,
            hand_over: false,
            nodes: HashMap::new(),
        }
    }

    #[test]
    fn fold_ends_the_hand() {
        let mut s = state();
        let resolution = resolve_fold(&mut s);
        assert!(resolution.hand_ended);
        assert!(s.hand_over);
    }

    #[test]
    fn aggressive_action_against_a_weaker_known_hand_forces_a_fold() {
        let mut s = state();
        // Hero has pocket aces vs. a weak known rival holding: the equity
        // override should force a fold regardless of RNG draw.
        let mut rng = StdRng::seed_from_u64(1);
        let option = dummy_aggressive_option();
        let resolution = resolve_aggressive_action(&mut s, &option, 10.0, None, None, 99.0, false, &mut rng);
        assert!(resolution.hand_ended);
        assert!(s.hand_over);
    }

    #[test]
    fn river_check_goes_straight_to_showdown() {
        let mut s = state();
        s.board = vec![make_card(2, 0), make_card(5, 1), make_card(9, 2), make_card(3, 3), make_card(7, 0)];
        let resolution = resolve_river_check_showdown(&mut s);
        assert!(resolution.hand_ended);
        assert!(resolution.note.unwrap().starts_with("Showdown"));
    }

    #[test]
    fn rival_call_narrows_continue_range_from_option_profile() {
        let mut s = state();
        s.rival_cards = None;
        let mut rng = StdRng::seed_from_u64(7);
        let weak_combo = crate::cards::Combo::new(make_card(0, 0), make_card(0, 1)).unwrap();
        let strong_combo = crate::cards::Combo::new(make_card(12, 2), make_card(12, 3)).unwrap();
        let profile = crate::rival_strategy::build_profile(&[weak_combo, strong_combo], 0.0, 1.0, None);
        let mut option = dummy_aggressive_option();
        option.meta.rival_profile = Some(profile);
        let resolution = resolve_aggressive_action(&mut s, &option, 10.0, None, None, 99.0, false, &mut rng);
        assert!(!resolution.hand_ended);
        assert!(s.rival_continue_range.is_some());
    }
}
