//! Domain types shared across the dynamic engine: a decision `Node`, the
//! `Episode` that sequences nodes for one hand, the mutable `HandState` they
//! share, and the `Option`/`OptionResolution` pair the option generator and
//! resolver pass back and forth.

use std::collections::HashMap;

use crate::cards::Card;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    pub fn as_str(&self) -> &'static str {
        match self {
            Street::Preflop => "preflop",
            Street::Flop => "flop",
            Street::Turn => "turn",
            Street::River => "river",
        }
    }
}

/// Free-form per-node scratch state: rival sampled range, pending rival bets,
/// bet-sizing context tags, and anything else the resolver needs to stash
/// between option generation and resolution. Kept loosely typed (mirroring
/// the original's `dict[str, Any]` context) since its shape varies by street.
#[derive(Debug, Clone, Default)]
pub struct NodeContext {
    pub rival_range: Vec<(Card, Card)>,
    pub pending_rival_bet: std::option::Option<f64>,
    pub bet_context: std::option::Option<String>,
    /// Preflop open size in bb, carried forward so later streets can still
    /// reference "what did the hand open for" when sizing continuation bets.
    pub open_size: std::option::Option<f64>,
}

/// A single decision point within an episode.
#[derive(Debug, Clone)]
pub struct Node {
    pub street: Street,
    pub description: String,
    pub pot_bb: f64,
    pub effective_bb: f64,
    pub hero_cards: Vec<Card>,
    pub board: Vec<Card>,
    pub actor: String,
    pub context: NodeContext,
}

/// Sequential nodes for one hand plus seat metadata.
#[derive(Debug, Clone)]
pub struct Episode {
    pub nodes: Vec<Node>,
    pub hero_seat: String,
    pub villain_seat: String,
}

impl Episode {
    pub fn new(nodes: Vec<Node>, hero_seat: String, villain_seat: String) -> Self {
        assert!(!nodes.is_empty(), "episode must contain at least one node");
        Self { nodes, hero_seat, villain_seat }
    }
}

/// Mutable state shared by every node in a hand: contributions, stacks, and
/// the rival's known or still-live range.
#[derive(Debug, Clone)]
pub struct HandState {
    pub hero_cards: [Card; 2],
    pub rival_cards: std::option::Option<[Card; 2]>,
    pub board: Vec<Card>,
    pub hero_contrib: f64,
    pub rival_contrib: f64,
    pub pot: f64,
    pub hero_stack: f64,
    pub rival_stack: f64,
    pub effective_stack: f64,
    pub rival_continue_range: std::option::Option<Vec<(Card, Card)>>,
    pub hand_over: bool,
    /// Cached per-street nodes so `hand_state` mutation helpers can keep a
    /// node's `pot_bb`/`effective_bb` synced after a contribution changes.
    pub nodes: HashMap<Street, Node>,
}

/// A value the caller can read out of `HandState` by key, mirroring the
/// original's permissive `dict.get(key, default)` state accessor.
pub fn state_value(state: &HandState, key: &str, default: f64) -> f64 {
    match key {
        "hero_contrib" => state.hero_contrib,
        "rival_contrib" => state.rival_contrib,
        "pot" => state.pot,
        "hero_stack" => state.hero_stack,
        "rival_stack" => state.rival_stack,
        "effective_stack" => state.effective_stack,
        _ => default,
    }
}

/// An offered action, with EV/rationale for presentation and optional
/// metadata used by the CFR refiner and rival-strategy sampler.
#[derive(Debug, Clone)]
pub struct Option {
    pub key: String,
    pub ev: f64,
    pub why: String,
    pub gto_freq: std::option::Option<f64>,
    pub ends_hand: bool,
    pub meta: OptionMeta,
    pub resolution_note: std::option::Option<String>,
}

/// Structured metadata attached to an `Option`. Kept as a typed struct
/// (rather than a free-form map) since every field here has a single,
/// well-known producer and consumer in this engine.
#[derive(Debug, Clone, Default)]
pub struct OptionMeta {
    pub street: std::option::Option<Street>,
    pub risk: std::option::Option<f64>,
    pub supports_cfr: bool,
    pub cfr_payoffs: std::option::Option<CfrPayoffs>,
    pub hero_ev_fold: std::option::Option<f64>,
    pub hero_ev_continue: std::option::Option<f64>,
    pub baseline_ev: std::option::Option<f64>,
    pub cfr_backend: std::option::Option<String>,
    pub cfr_probability: std::option::Option<f64>,
    pub cfr_rival_mix: HashMap<String, f64>,
    pub rival_profile: std::option::Option<crate::rival_strategy::RivalProfile>,
    pub rival_raise_ratio: std::option::Option<f64>,
    pub hero_ev_raise: std::option::Option<f64>,
    pub hero_call_vs_raise: std::option::Option<f64>,
    pub bet_context: std::option::Option<String>,
    pub villain_adapt: std::option::Option<crate::rival_strategy::VillainAdapt>,
    pub cfr_iterations: std::option::Option<u32>,
    pub cfr_regret: std::option::Option<f64>,
    pub cfr_avg_ev: std::option::Option<f64>,
    pub cfr_validation: std::option::Option<CfrValidation>,
}

/// Sanity-check diagnostics attached by the CFR refiner alongside the
/// adjusted EV: how far each side's average strategy is from a best
/// response, and whether the payoff matrix it solved was actually zero-sum.
#[derive(Debug, Clone, Default)]
pub struct CfrValidation {
    pub hero_exploitability: f64,
    pub rival_exploitability: f64,
    pub zero_sum_deviation: f64,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CfrPayoffs {
    pub rival_actions: Vec<String>,
    pub hero: Vec<f64>,
}

/// Structured outcome after an option is applied in the engine.
#[derive(Debug, Clone, Default)]
pub struct OptionResolution {
    pub hand_ended: bool,
    pub note: std::option::Option<String>,
    pub reveal_rival: bool,
}

/// One logged decision, matching what `summarize_records`/the API surface
/// consume: which option was chosen vs. the best/worst available, and the EV
/// gap between them.
#[derive(Debug, Clone)]
pub struct Record {
    pub street: Street,
    pub pot_bb: f64,
    pub chosen_key: String,
    pub chosen_ev: f64,
    pub best_key: String,
    pub best_ev: f64,
    pub worst_ev: f64,
    pub room_ev: f64,
    pub ev_loss: f64,
    pub hand_ended: bool,
    pub resolution_note: std::option::Option<String>,
    pub hand_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;

    fn sample_node() -> Node {
        Node {
            street: Street::Preflop,
            description: "BB facing an open".to_string(),
            pot_bb: 3.5,
            effective_bb: 100.0,
            hero_cards: vec![make_card(12, 0), make_card(11, 0)],
            board: vec![],
            actor: "hero".to_string(),
            context: NodeContext::default(),
        }
    }

    #[test]
    fn episode_requires_at_least_one_node() {
        let episode = Episode::new(vec![sample_node()], "BB".to_string(), "SB".to_string());
        assert_eq!(episode.nodes.len(), 1);
    }

    #[test]
    #[should_panic]
    fn empty_episode_panics() {
        Episode::new(vec![], "BB".to_string(), "SB".to_string());
    }

    #[test]
    fn state_value_reads_known_keys_and_falls_back_for_unknown() {
        let state = HandState {
            hero_cards: [make_card(12, 0), make_card(11, 0)],
            rival_cards: None,
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
        };
        assert_eq!(state_value(&state, "pot", -1.0), 3.5);
        assert_eq!(state_value(&state, "nonsense", -1.0), -1.0);
    }
}
