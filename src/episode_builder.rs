//! Builds a fresh `Episode` for one hand: deals hero/rival cards and a full
//! board up front, then lays out preflop/flop/turn/river nodes with the
//! rival's postflop behaviour (check/bet/lead sizes) pre-rolled according to
//! a named style. The hero still chooses live at each node; only the
//! rival's scripted facing action is decided here.

use rand::Rng;

use crate::cards::{deal_hand, format_cards_spaced, Card};
use crate::episode::{Episode, HandState, Node, NodeContext, Street};
use crate::seating::{Seat, SeatAssignment};
use std::collections::HashMap;

const DEFAULT_STACK_BB: f64 = 100.0;
const SB_BLIND: f64 = 0.5;
const BB_BLIND: f64 = 1.0;
const OPEN_SIZES: [f64; 3] = [2.0, 2.5, 3.0];

#[derive(Debug, Clone, Copy)]
pub struct VillainStyleConfig {
    pub name: &'static str,
    pub turn_bet_probability: f64,
    pub turn_bet_sizes: &'static [f64],
    pub river_lead_probability: f64,
    pub river_lead_sizes: &'static [f64],
}

const BALANCED: VillainStyleConfig = VillainStyleConfig {
    name: "balanced",
    turn_bet_probability: 0.65,
    turn_bet_sizes: &[0.33, 0.5, 0.75, 1.0],
    river_lead_probability: 0.35,
    river_lead_sizes: &[0.5, 1.0, 1.25],
};

const AGGRESSIVE: VillainStyleConfig = VillainStyleConfig {
    name: "aggressive",
    turn_bet_probability: 0.8,
    turn_bet_sizes: &[0.5, 0.75, 1.0],
    river_lead_probability: 0.55,
    river_lead_sizes: &[0.66, 1.0, 1.5],
};

const PASSIVE: VillainStyleConfig = VillainStyleConfig {
    name: "passive",
    turn_bet_probability: 0.45,
    turn_bet_sizes: &[0.33, 0.5],
    river_lead_probability: 0.18,
    river_lead_sizes: &[0.4, 0.75],
};

pub fn resolve_rival_style(style: crate::rival::RivalStyle) -> VillainStyleConfig {
    use crate::rival::RivalStyle;
    match style {
        RivalStyle::Aggressive => AGGRESSIVE,
        RivalStyle::Passive => PASSIVE,
        RivalStyle::Balanced => BALANCED,
    }
}

pub fn available_rival_styles() -> &'static [&'static str] {
    &["balanced", "aggressive", "passive"]
}

fn blind_for(seat: Seat) -> f64 {
    match seat {
        Seat::Sb => SB_BLIND,
        Seat::Bb => BB_BLIND,
    }
}

/// Builds one full hand: a dealt `Episode` for presentation plus the
/// `HandState` the resolver mutates as the hero acts through it.
pub fn build_episode<R: Rng + ?Sized>(
    rng: &mut R,
    seats: SeatAssignment,
    style: VillainStyleConfig,
) -> (Episode, HandState) {
    let (hero_cards, rival_cards, board) = deal_hand(rng);
    let open_size = OPEN_SIZES[rng.gen_range(0..OPEN_SIZES.len())];

    let opener_blind = blind_for(seats.rival);
    let hero_contrib = blind_for(seats.hero);
    let rival_contrib = blind_for(seats.rival) + (open_size - opener_blind).max(0.0);
    let hero_stack = (DEFAULT_STACK_BB - hero_contrib).max(0.0);
    let rival_stack = (DEFAULT_STACK_BB - rival_contrib).max(0.0);
    let pot = hero_contrib + rival_contrib;
    let effective_stack = hero_stack.min(rival_stack);

    let hero_seat_str = seats.hero.as_str().to_string();
    let rival_seat_str = seats.rival.as_str().to_string();
    let rival_label = format!("Rival ({rival_seat_str})");
    let villain_range = if seats.rival == Seat::Sb { "sb_open" } else { "bb_defend" };

    let preflop = Node {
        street: Street::Preflop,
        description: format!("{rival_label} opens {open_size:.1}bb."),
        pot_bb: pot,
        effective_bb: effective_stack,
        hero_cards: hero_cards.to_vec(),
        board: vec![],
        actor: hero_seat_str.clone(),
        context: NodeContext {
            rival_range: Vec::new(),
            pending_rival_bet: None,
            bet_context: Some(villain_range.to_string()),
            open_size: Some(open_size),
        },
    };

    let flop_cards: Vec<Card> = board[..3].to_vec();
    let flop = Node {
        street: Street::Flop,
        description: format!("{}; {rival_label} checks.", format_cards_spaced(&flop_cards)),
        pot_bb: pot,
        effective_bb: effective_stack,
        hero_cards: hero_cards.to_vec(),
        board: flop_cards,
        actor: hero_seat_str.clone(),
        context: NodeContext {
            rival_range: Vec::new(),
            pending_rival_bet: None,
            bet_context: Some("check".to_string()),
            open_size: Some(open_size),
        },
    };

    let turn_board: Vec<Card> = board[..4].to_vec();
    let turn_bets = rng.gen_bool(style.turn_bet_probability);
    let (turn_description, turn_context) = if turn_bets {
        let bet_turn = (pot * style.turn_bet_sizes[rng.gen_range(0..style.turn_bet_sizes.len())]).max(0.25);
        (
            format!("{}; {rival_label} bets {bet_turn:.2}bb into {pot:.2}bb.", format_cards_spaced(&turn_board)),
            NodeContext {
                rival_range: Vec::new(),
                pending_rival_bet: Some(bet_turn),
                bet_context: Some("bet".to_string()),
                open_size: Some(open_size),
            },
        )
    } else {
        (
            format!("{}; {rival_label} checks.", format_cards_spaced(&turn_board)),
            NodeContext {
                rival_range: Vec::new(),
                pending_rival_bet: None,
                bet_context: Some("check".to_string()),
                open_size: Some(open_size),
            },
        )
    };
    let turn = Node {
        street: Street::Turn,
        description: turn_description,
        pot_bb: pot,
        effective_bb: effective_stack,
        hero_cards: hero_cards.to_vec(),
        board: turn_board,
        actor: hero_seat_str.clone(),
        context: turn_context,
    };

    let river_leads = rng.gen_bool(style.river_lead_probability);
    let (river_description, river_context) = if river_leads {
        let lead_size = (pot * style.river_lead_sizes[rng.gen_range(0..style.river_lead_sizes.len())]).max(0.25);
        (
            format!("{}; {rival_label} leads {lead_size:.2}bb into {pot:.2}bb.", format_cards_spaced(&board)),
            NodeContext {
                rival_range: Vec::new(),
                pending_rival_bet: Some(lead_size),
                bet_context: Some("bet".to_string()),
                open_size: Some(open_size),
            },
        )
    } else {
        (
            format!("{}; choose your bet.", format_cards_spaced(&board)),
            NodeContext {
                rival_range: Vec::new(),
                pending_rival_bet: None,
                bet_context: Some("oop-check".to_string()),
                open_size: Some(open_size),
            },
        )
    };
    let river = Node {
        street: Street::River,
        description: river_description,
        pot_bb: pot,
        effective_bb: effective_stack,
        hero_cards: hero_cards.to_vec(),
        board: board.to_vec(),
        actor: hero_seat_str.clone(),
        context: river_context,
    };

    let mut nodes = HashMap::new();
    nodes.insert(Street::Preflop, preflop.clone());
    nodes.insert(Street::Flop, flop.clone());
    nodes.insert(Street::Turn, turn.clone());
    nodes.insert(Street::River, river.clone());

    let episode = Episode::new(vec![preflop, flop, turn, river], hero_seat_str, rival_seat_str);

    let state = HandState {
        hero_cards,
        rival_cards: Some(rival_cards),
        board: vec![],
        hero_contrib,
        rival_contrib,
        pot,
        hero_stack,
        rival_stack,
        effective_stack,
        rival_continue_range: None,
        hand_over: false,
        nodes,
    };

    (episode, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn build_episode_produces_four_nodes_in_street_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let seats = SeatAssignment { hero: Seat::Bb, rival: Seat::Sb };
        let (episode, state) = build_episode(&mut rng, seats, BALANCED);
        let streets: Vec<Street> = episode.nodes.iter().map(|n| n.street).collect();
        assert_eq!(streets, vec![Street::Preflop, Street::Flop, Street::Turn, Street::River]);
        assert_eq!(state.pot, state.hero_contrib + state.rival_contrib);
    }

    #[test]
    fn resolve_rival_style_maps_the_aggressive_variant() {
        let style = resolve_rival_style(crate::rival::RivalStyle::Aggressive);
        assert_eq!(style.name, "aggressive");
    }
}
