//! Builds the menu of options offered at each node: Fold/Call/3bet/Jam
//! preflop, Check/Bet/Jam postflop, each carrying an EV estimate, a
//! rationale string, and the metadata the CFR refiner and bet-sizing
//! manager need. `options_for` is the single entry point the session driver
//! calls; it dispatches by street, then runs CFR refinement and feeds
//! observed sizes back into the bet-sizing manager.

use std::collections::HashMap;

use rand::Rng;

use crate::bet_sizing::BetSizingManager;
use crate::cards::Combo;
use crate::cfr::LocalCfrBackend;
use crate::episode::{CfrPayoffs, HandState, Node, Option as EngineOption, OptionMeta, Street};
use crate::hand_strength::board_texture_score;
use crate::preflop_mix::action_mix_for_combo;
use crate::range_model::{rival_bb_defend_range, rival_sb_open_range};
use crate::range_sampling::{normalize_combo, sample_range, ComboKey};
use crate::rival_strategy::build_profile;

const RIVER_CHECK_RAISE_SHARE: f64 = 0.35;

/// `_sample_cap_preflop`: how many rival combos a preflop decision samples
/// down to, scaled off the session's Monte Carlo budget.
fn sample_cap_preflop(mc_trials: u32) -> usize {
    ((mc_trials as f64 * 1.2) as usize).clamp(50, 200)
}

/// `_sample_cap_postflop`: same idea for flop/turn/river, where the board is
/// already fixed so fewer combos are needed per decision.
fn sample_cap_postflop(mc_trials: u32) -> usize {
    ((mc_trials as f64 * 0.6) as usize).clamp(30, 120)
}

fn hero_combo(state: &HandState) -> Combo {
    Combo::new(state.hero_cards[0], state.hero_cards[1]).expect("hero cards are distinct")
}

fn blocked(state: &HandState) -> Vec<crate::cards::Card> {
    let mut blocked: Vec<crate::cards::Card> = state.hero_cards.to_vec();
    blocked.extend(&state.board);
    blocked
}

/// Hero's equity against every individual combo in `range`, keyed by
/// normalised combo so the fold/continue partition below can weigh each
/// rival holding on its own terms instead of one averaged number.
fn per_combo_equities(state: &HandState, range: &[Combo], trials: u32) -> HashMap<ComboKey, f64> {
    let hero: [crate::cards::Card; 2] = state.hero_cards;
    range
        .iter()
        .map(|&combo| {
            let eq = crate::equity::equity_vs_combo(hero, &state.board, combo.cards(), trials, None).unwrap_or(0.5);
            (normalize_combo(combo), eq)
        })
        .collect()
}

fn average_equity(equities: &HashMap<ComboKey, f64>) -> f64 {
    if equities.is_empty() {
        0.5
    } else {
        equities.values().sum::<f64>() / equities.len() as f64
    }
}

fn strengths_for(range: &[Combo], equities: &HashMap<ComboKey, f64>) -> Vec<(Combo, f64)> {
    range.iter().map(|&combo| (combo, equities.get(&normalize_combo(combo)).copied().unwrap_or(0.5))).collect()
}

/// `_fold_continue_stats`: partitions each sampled combo's own equity at the
/// break-even threshold rather than applying one fold-equity heuristic to the
/// range's averaged equity. Returns `(fold_equity, avg_equity_when_called,
/// continue_ratio)`.
fn fold_continue_stats(equities: &HashMap<ComboKey, f64>, rival_threshold: f64) -> (f64, f64, f64) {
    if equities.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let mut fold = 0usize;
    let mut cont = 0usize;
    let mut continue_eq_sum = 0.0;
    for &eq in equities.values() {
        if 1.0 - eq < rival_threshold {
            fold += 1;
        } else {
            cont += 1;
            continue_eq_sum += eq;
        }
    }
    let total = equities.len() as f64;
    let fe = fold as f64 / total;
    let continue_ratio = cont as f64 / total;
    let avg_eq = if cont > 0 { continue_eq_sum / cont as f64 } else { 0.0 };
    (fe, avg_eq, continue_ratio)
}

/// "Rival folds X% needing eq Y%. When called (~Z%) you have W% equity → EV
/// V bb." — the fold/continue rationale every aggressive option attaches.
fn fold_continue_rationale(fe: f64, be_threshold: f64, continue_ratio: f64, avg_eq_when_called: f64, ev_called: f64) -> String {
    format!(
        "Rival folds {:.0}% needing eq {:.0}%. When called (~{:.0}%) you have {:.0}% equity → EV {:.2} bb.",
        fe * 100.0,
        be_threshold * 100.0,
        continue_ratio * 100.0,
        avg_eq_when_called * 100.0,
        ev_called
    )
}

/// Preflop menu for a player facing an open: Fold, Call, a ladder of 3bet
/// sizes, and a Jam, each weighted by the table-driven action mix for this
/// exact combo at this open size.
pub fn preflop_options(
    node: &Node,
    state: &HandState,
    open_size: f64,
    bet_sizing: &mut BetSizingManager,
    trials: u32,
    rng: &mut impl Rng,
) -> Vec<EngineOption> {
    let blocked_cards = blocked(state);
    let combo = hero_combo(state);
    let mix = action_mix_for_combo(combo, open_size, &blocked_cards);

    let rival_range = rival_sb_open_range(open_size, &blocked_cards, Some(state.effective_stack));
    let sampled = sample_range(&rival_range, sample_cap_preflop(trials), None, rng);
    let equities = per_combo_equities(state, &sampled, trials);
    let eq_call = average_equity(&equities);
    let strengths = strengths_for(&sampled, &equities);

    let call_cost = (open_size - state.hero_contrib).max(0.0);
    let pot_if_call = state.pot + call_cost;
    let ev_call = eq_call * pot_if_call - (1.0 - eq_call) * call_cost;

    let mut options = vec![EngineOption {
        key: "fold".to_string(),
        ev: 0.0,
        why: "Gives up the pot uncontested.".to_string(),
        gto_freq: mix.get("fold").copied(),
        ends_hand: true,
        meta: OptionMeta { street: Some(Street::Preflop), ..Default::default() },
        resolution_note: None,
    }];

    options.push(EngineOption {
        key: "call".to_string(),
        ev: ev_call,
        why: format!("Calls {call_cost:.2}bb with {:.0}% equity against the opener's range.", eq_call * 100.0),
        gto_freq: mix.get("call").copied(),
        ends_hand: false,
        meta: OptionMeta {
            street: Some(Street::Preflop),
            supports_cfr: true,
            hero_ev_fold: Some(0.0),
            hero_ev_continue: Some(ev_call),
            ..Default::default()
        },
        resolution_note: None,
    });

    let raise_sizes = bet_sizing.preflop_raise_sizes(open_size, state.hero_contrib, state.hero_stack, state.rival_stack);
    for size in &raise_sizes {
        let risk = size - state.hero_contrib;
        let final_pot = state.pot + 2.0 * risk;
        let be_threshold = risk / final_pot.max(1e-9);
        let (fe, avg_eq_when_called, continue_ratio) = fold_continue_stats(&equities, be_threshold);
        let ev_called = avg_eq_when_called * (state.pot + risk) - (1.0 - avg_eq_when_called) * risk;
        let ev = fe * state.pot + (1.0 - fe) * ev_called;
        options.push(EngineOption {
            key: "3bet".to_string(),
            ev,
            why: fold_continue_rationale(fe, be_threshold, continue_ratio, avg_eq_when_called, ev_called),
            gto_freq: mix.get("threebet").copied(),
            ends_hand: false,
            meta: OptionMeta {
                street: Some(Street::Preflop),
                risk: Some(risk),
                supports_cfr: true,
                hero_ev_fold: Some(state.pot),
                hero_ev_continue: Some(ev_called),
                bet_context: Some(format!("{size:.2}")),
                rival_profile: Some(build_profile(&sampled, fe, continue_ratio, Some(&strengths))),
                ..Default::default()
            },
            resolution_note: None,
        });
    }

    let jam_risk = state.hero_stack;
    let jam_final_pot = state.pot + 2.0 * jam_risk;
    let jam_be = jam_risk / jam_final_pot.max(1e-9);
    let (jam_fe, jam_avg_eq, jam_continue_ratio) = fold_continue_stats(&equities, jam_be);
    let jam_called = jam_avg_eq * (state.pot + jam_risk) - (1.0 - jam_avg_eq) * jam_risk;
    options.push(EngineOption {
        key: "jam".to_string(),
        ev: jam_fe * state.pot + (1.0 - jam_fe) * jam_called,
        why: fold_continue_rationale(jam_fe, jam_be, jam_continue_ratio, jam_avg_eq, jam_called),
        gto_freq: mix.get("jam").copied(),
        ends_hand: false,
        meta: OptionMeta {
            street: Some(Street::Preflop),
            risk: Some(jam_risk),
            supports_cfr: false,
            rival_profile: Some(build_profile(&sampled, jam_fe, jam_continue_ratio, Some(&strengths))),
            ..Default::default()
        },
        resolution_note: None,
    });

    options
}

fn postflop_bet_option(
    street: Street,
    state: &HandState,
    equities: &HashMap<ComboKey, f64>,
    sampled: &[Combo],
    bet: f64,
    context: &str,
) -> EngineOption {
    let final_pot = state.pot + 2.0 * bet;
    let be_threshold = bet / final_pot.max(1e-9);
    let (fe, avg_eq_when_called, continue_ratio) = fold_continue_stats(equities, be_threshold);
    let ev_called = avg_eq_when_called * (state.pot + bet) - (1.0 - avg_eq_when_called) * bet;
    let ev = fe * state.pot + (1.0 - fe) * ev_called;
    EngineOption {
        key: "bet".to_string(),
        ev,
        why: fold_continue_rationale(fe, be_threshold, continue_ratio, avg_eq_when_called, ev_called),
        gto_freq: None,
        ends_hand: false,
        meta: OptionMeta {
            street: Some(street),
            risk: Some(bet),
            supports_cfr: true,
            hero_ev_fold: Some(state.pot),
            hero_ev_continue: Some(ev_called),
            bet_context: Some(context.to_string()),
            rival_profile: Some(build_profile(sampled, fe, continue_ratio, Some(&strengths_for(sampled, equities)))),
            ..Default::default()
        },
        resolution_note: None,
    }
}

fn check_option(street: Street, avg_eq: f64, pot: f64) -> EngineOption {
    EngineOption {
        key: "check".to_string(),
        ev: avg_eq * pot,
        why: "Checks to see a free card / go to showdown.".to_string(),
        gto_freq: None,
        ends_hand: false,
        meta: OptionMeta { street: Some(street), supports_cfr: true, hero_ev_fold: Some(avg_eq * pot), hero_ev_continue: Some(avg_eq * pot), ..Default::default() },
        resolution_note: None,
    }
}

fn postflop_options_for_street(
    street: Street,
    node: &Node,
    state: &HandState,
    bet_sizing: &mut BetSizingManager,
    trials: u32,
    rng: &mut impl Rng,
) -> Vec<EngineOption> {
    let blocked_cards = blocked(state);
    let open_size = node.context.open_size.unwrap_or(2.5);
    let full_range = rival_bb_defend_range(open_size, &blocked_cards, Some(state.effective_stack));
    let sampled = sample_range(&full_range, sample_cap_postflop(trials), None, rng);
    let equities = per_combo_equities(state, &sampled, trials);
    let avg_eq = average_equity(&equities);

    let texture = board_texture_score(&state.board);
    let context = if texture > 0.5 { "wet" } else { "dry" };
    let base_fractions = if texture > 0.5 { [0.33, 0.66, 1.0] } else { [0.33, 0.5, 0.75] };
    let fractions = bet_sizing.postflop_bet_fractions(street.as_str(), context, &base_fractions);

    let mut options = vec![check_option(street, avg_eq, state.pot)];
    for fraction in fractions {
        let bet = state.pot * fraction;
        if bet <= 0.0 {
            continue;
        }
        options.push(postflop_bet_option(street, state, &equities, &sampled, bet, context));
    }

    if street == Street::River {
        if let Some(last) = options.last_mut() {
            let jam_mass = RIVER_CHECK_RAISE_SHARE * (1.0 - avg_eq).max(0.0);
            last.meta.rival_raise_ratio = Some(jam_mass.min(1.0));
        }
    }

    let jam_risk = state.effective_stack;
    if jam_risk > 0.0 {
        let jam_final_pot = state.pot + 2.0 * jam_risk;
        let jam_be = jam_risk / jam_final_pot.max(1e-9);
        let (jam_fe, jam_avg_eq, jam_continue_ratio) = fold_continue_stats(&equities, jam_be);
        let ev_called = jam_avg_eq * (state.pot + jam_risk) - (1.0 - jam_avg_eq) * jam_risk;
        options.push(EngineOption {
            key: "jam".to_string(),
            ev: jam_fe * state.pot + (1.0 - jam_fe) * ev_called,
            why: fold_continue_rationale(jam_fe, jam_be, jam_continue_ratio, jam_avg_eq, ev_called),
            gto_freq: None,
            ends_hand: false,
            meta: OptionMeta {
                street: Some(street),
                risk: Some(jam_risk),
                supports_cfr: false,
                rival_profile: Some(build_profile(&sampled, jam_fe, jam_continue_ratio, Some(&strengths_for(&sampled, &equities)))),
                ..Default::default()
            },
            resolution_note: None,
        });
    }

    options
}

pub fn flop_options(node: &Node, state: &HandState, bet_sizing: &mut BetSizingManager, trials: u32, rng: &mut impl Rng) -> Vec<EngineOption> {
    postflop_options_for_street(Street::Flop, node, state, bet_sizing, trials, rng)
}

pub fn turn_options(node: &Node, state: &HandState, bet_sizing: &mut BetSizingManager, trials: u32, rng: &mut impl Rng) -> Vec<EngineOption> {
    postflop_options_for_street(Street::Turn, node, state, bet_sizing, trials, rng)
}

pub fn river_options(node: &Node, state: &HandState, bet_sizing: &mut BetSizingManager, trials: u32, rng: &mut impl Rng) -> Vec<EngineOption> {
    postflop_options_for_street(Street::River, node, state, bet_sizing, trials, rng)
}

/// Dispatches by street, then runs the CFR refiner over the eligible
/// options so `ev`/`gto_freq` reflect the equilibrium mix rather than the
/// raw per-option estimate.
pub fn options_for(
    node: &Node,
    state: &HandState,
    bet_sizing: &mut BetSizingManager,
    trials: u32,
    rng: &mut impl Rng,
) -> Vec<EngineOption> {
    let mut options = match node.street {
        Street::Preflop => {
            let open_size = node.context.open_size.unwrap_or(2.5);
            preflop_options(node, state, open_size, bet_sizing, trials, rng)
        }
        Street::Flop => flop_options(node, state, bet_sizing, trials, rng),
        Street::Turn => turn_options(node, state, bet_sizing, trials, rng),
        Street::River => river_options(node, state, bet_sizing, trials, rng),
    };

    let backend = LocalCfrBackend::default();
    backend.refine(&mut options);
    record_bet_sizing_feedback(node, &options, bet_sizing);
    options
}

fn record_bet_sizing_feedback(node: &Node, options: &[EngineOption], bet_sizing: &mut BetSizingManager) {
    match node.street {
        Street::Preflop => {
            let observations: Vec<(f64, f64, f64)> = options
                .iter()
                .filter(|o| o.key == "3bet")
                .filter_map(|o| {
                    let size: f64 = o.meta.bet_context.as_ref()?.parse().ok()?;
                    let freq = o.gto_freq.unwrap_or(0.0);
                    let regret = o.meta.cfr_probability.unwrap_or(0.0) - freq;
                    Some((size, freq, regret))
                })
                .collect();
            if !observations.is_empty() {
                let open_size = node.context.open_size.unwrap_or(2.5);
                bet_sizing.observe_preflop(open_size, 0.0, 0.0, 0.0, &observations);
            }
        }
        street => {
            let context = options.iter().find_map(|o| o.meta.bet_context.clone()).unwrap_or_else(|| "dry".to_string());
            let observations: Vec<(f64, f64, f64)> = options
                .iter()
                .filter(|o| o.key == "bet")
                .filter_map(|o| {
                    let freq = o.gto_freq.unwrap_or(0.0);
                    let regret = o.meta.cfr_probability.unwrap_or(0.0) - freq;
                    Some((freq, freq, regret))
                })
                .collect();
            if !observations.is_empty() {
                bet_sizing.observe_postflop(street.as_str(), &context, &observations);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;
    use crate::episode::NodeContext;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state() -> HandState {
        HandState {
            hero_cards: [make_card(12, 0), make_card(12, 1)],
            rival_cards: None,
            board: vec![],
            hero_contrib: 1.0,
            rival_contrib: 2.5,
            pot: 3.5,
            hero_stack: 99.0,
            rival_stack: 97.5,
            effective_stack: 97.5,
            rival_continue_range: None,
            hand_over: false,
            nodes: HashMap::new(),
        }
    }

    fn node() -> Node {
        Node {
            street: Street::Preflop,
            description: "BB facing a 2.5bb open".to_string(),
            pot_bb: 3.5,
            effective_bb: 97.5,
            hero_cards: vec![make_card(12, 0), make_card(12, 1)],
            board: vec![],
            actor: "hero".to_string(),
            context: NodeContext { open_size: Some(2.5), ..Default::default() },
        }
    }

    #[test]
    fn preflop_menu_always_has_fold_and_call() {
        let mut bet_sizing = BetSizingManager::default();
        let mut rng = StdRng::seed_from_u64(11);
        let options = options_for(&node(), &state(), &mut bet_sizing, 200, &mut rng);
        assert!(options.iter().any(|o| o.key == "fold"));
        assert!(options.iter().any(|o| o.key == "call"));
    }

    #[test]
    fn pocket_aces_gets_at_least_one_threebet_size() {
        let mut bet_sizing = BetSizingManager::default();
        let mut rng = StdRng::seed_from_u64(11);
        let options = options_for(&node(), &state(), &mut bet_sizing, 200, &mut rng);
        assert!(options.iter().any(|o| o.key == "3bet"));
    }

    #[test]
    fn aggressive_option_rationale_follows_the_fold_continue_contract() {
        let mut bet_sizing = BetSizingManager::default();
        let mut rng = StdRng::seed_from_u64(11);
        let options = options_for(&node(), &state(), &mut bet_sizing, 200, &mut rng);
        let aggressive = options.iter().find(|o| o.key == "3bet" || o.key == "jam").expect("an aggressive option");
        assert!(aggressive.why.contains("Rival folds"));
        assert!(aggressive.why.contains("needing eq"));
        assert!(aggressive.why.contains("When called"));
        assert!(aggressive.why.contains("equity"));
        assert!(aggressive.why.contains("EV"));
        assert!(aggressive.why.contains("bb."));
    }

    #[test]
    fn aggressive_option_attaches_a_rival_profile() {
        let mut bet_sizing = BetSizingManager::default();
        let mut rng = StdRng::seed_from_u64(11);
        let options = options_for(&node(), &state(), &mut bet_sizing, 200, &mut rng);
        let aggressive = options.iter().find(|o| o.key == "3bet" || o.key == "jam").expect("an aggressive option");
        assert!(aggressive.meta.rival_profile.is_some());
    }
}
