//! Session lifecycle: owns every in-flight hand's `HandState`, advances
//! through an episode's nodes as the hero chooses, and accumulates the
//! `Record`s the scoring module summarizes. Guarded by a single
//! `parking_lot::Mutex` per session so reads/writes never interleave.

use std::collections::HashMap;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::bet_sizing::BetSizingManager;
use crate::episode::{Episode, HandState, Option as EngineOption, Record, Street};
use crate::episode_builder::{build_episode, resolve_rival_style};
use crate::error::{EngineError, EngineResult};
use crate::option_generator::options_for;
use crate::resolve::resolve_for;
use crate::rival::RivalStyle;
use crate::rival_strategy::build_profile;
use crate::scoring::{summarize_records, SummaryStats};
use crate::seating::SeatRotation;

/// Configuration for a training session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub hands: u32,
    pub mc_trials: u32,
    pub seed: Option<u64>,
    pub rival_style: RivalStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { hands: 1, mc_trials: 200, seed: None, rival_style: RivalStyle::Balanced }
    }
}

/// One node's worth of presentation data plus the live options offered.
#[derive(Debug, Clone)]
pub struct NodeView {
    pub street: Street,
    pub description: String,
    pub pot_bb: f64,
    pub effective_bb: f64,
    pub hero_cards: Vec<crate::cards::Card>,
    pub board_cards: Vec<crate::cards::Card>,
    pub actor: String,
    pub hand_no: u32,
    pub total_hands: u32,
    pub options: Vec<EngineOption>,
}

/// What `get_node` returns: either the next decision or a finished summary.
#[derive(Debug, Clone)]
pub enum NodeOutcome {
    Node(NodeView),
    Done(SummaryStats),
}

/// What `choose` returns after applying a chosen option.
#[derive(Debug, Clone)]
pub struct ChoiceOutcome {
    pub chosen_key: String,
    pub best_key: String,
    pub correct: bool,
    pub ev_loss: f64,
    pub resolution_note: Option<String>,
    pub hand_ended: bool,
    pub next: NodeOutcome,
}

struct SessionState {
    config: SessionConfig,
    rng: StdRng,
    rotation: SeatRotation,
    bet_sizing: BetSizingManager,
    episodes: Vec<Episode>,
    hand_states: Vec<HandState>,
    hand_index: usize,
    current_index: usize,
    records: Vec<Record>,
    /// The option menu last computed for `(hand_index, node_index)`, shared
    /// between `node_view` and `choose` so the same decision is offered and
    /// resolved against one Monte Carlo draw rather than two independent ones.
    cached_options: Option<(usize, usize, Vec<EngineOption>)>,
}

impl SessionState {
    fn new(config: SessionConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let rotation = SeatRotation::default();
        let style = resolve_rival_style(config.rival_style);
        let seats = rotation.assignment_for(0);
        let (episode, state) = build_episode(&mut rng, seats, style);
        Self {
            config: SessionConfig { seed: Some(seed), hands: config.hands.max(1), mc_trials: config.mc_trials.max(10), ..config },
            rng,
            rotation,
            bet_sizing: BetSizingManager::default(),
            episodes: vec![episode],
            hand_states: vec![state],
            hand_index: 0,
            current_index: 0,
            records: Vec::new(),
            cached_options: None,
        }
    }

    fn ensure_episode(&mut self) {
        if self.hand_index >= self.episodes.len() {
            let style = resolve_rival_style(self.config.rival_style);
            let seats = self.rotation.assignment_for(self.hand_index);
            let (episode, state) = build_episode(&mut self.rng, seats, style);
            self.episodes.push(episode);
            self.hand_states.push(state);
        }
    }

    /// Advances `hand_index`/`current_index` to the next live node, or
    /// returns `None` once every configured hand has been played out.
    fn active_node(&mut self) -> Option<(usize, usize)> {
        loop {
            self.ensure_episode();
            let episode = &self.episodes[self.hand_index];
            if self.current_index < episode.nodes.len() && !self.hand_states[self.hand_index].hand_over {
                return Some((self.hand_index, self.current_index));
            }
            if self.hand_index + 1 >= self.config.hands as usize {
                return None;
            }
            self.hand_index += 1;
            self.current_index = 0;
        }
    }

    /// Returns the cached menu for this node if one is already live,
    /// otherwise computes it with `options_for` and caches it. Computing the
    /// menu mutates `bet_sizing`'s observed-size feedback, so calling it twice
    /// per node (once to show it, once to resolve a choice against it) would
    /// both double-count that feedback and let the two calls draw different
    /// Monte Carlo samples for what should be the same decision.
    fn options_for_node(&mut self, hand_index: usize, node_index: usize) -> Vec<EngineOption> {
        if let Some((h, n, options)) = &self.cached_options {
            if *h == hand_index && *n == node_index {
                return options.clone();
            }
        }
        let trials = self.config.mc_trials;
        let node = self.episodes[hand_index].nodes[node_index].clone();
        let state = self.hand_states[hand_index].clone();
        let options = options_for(&node, &state, &mut self.bet_sizing, trials, &mut self.rng);
        self.cached_options = Some((hand_index, node_index, options.clone()));
        options
    }

    fn node_view(&mut self, hand_index: usize, node_index: usize) -> NodeView {
        let node = self.episodes[hand_index].nodes[node_index].clone();
        let options = self.options_for_node(hand_index, node_index);
        NodeView {
            street: node.street,
            description: node.description,
            pot_bb: node.pot_bb,
            effective_bb: node.effective_bb,
            hero_cards: node.hero_cards,
            board_cards: node.board,
            actor: node.actor,
            hand_no: hand_index as u32 + 1,
            total_hands: self.config.hands,
            options,
        }
    }
}

fn best_option<'a>(options: &'a [EngineOption]) -> &'a EngineOption {
    options.iter().max_by(|a, b| a.ev.partial_cmp(&b.ev).unwrap_or(std::cmp::Ordering::Equal)).expect("at least one option")
}

fn worst_option_ev(options: &[EngineOption]) -> f64 {
    options.iter().map(|o| o.ev).fold(f64::INFINITY, f64::min)
}

/// Owns every live session behind a map keyed by session id.
pub struct SessionManager {
    sessions: Mutex<HashMap<Uuid, SessionState>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self { sessions: Mutex::new(HashMap::new()) }
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&self, config: SessionConfig) -> Uuid {
        let state = SessionState::new(config);
        let id = Uuid::new_v4();
        self.sessions.lock().insert(id, state);
        id
    }

    pub fn get_node(&self, session_id: Uuid) -> EngineResult<NodeOutcome> {
        let mut sessions = self.sessions.lock();
        let state = sessions.get_mut(&session_id).ok_or(EngineError::SessionNotFound)?;
        match state.active_node() {
            None => Ok(NodeOutcome::Done(summarize_records(&state.records))),
            Some((hand_index, node_index)) => Ok(NodeOutcome::Node(state.node_view(hand_index, node_index))),
        }
    }

    pub fn choose(&self, session_id: Uuid, choice_index: usize) -> EngineResult<ChoiceOutcome> {
        let mut sessions = self.sessions.lock();
        let state = sessions.get_mut(&session_id).ok_or(EngineError::SessionNotFound)?;
        let (hand_index, node_index) = state.active_node().ok_or_else(|| EngineError::InvalidChoice("session already complete".to_string()))?;

        let node = state.episodes[hand_index].nodes[node_index].clone();
        let hand_state_snapshot = state.hand_states[hand_index].clone();
        let options = state.options_for_node(hand_index, node_index);
        state.cached_options = None;
        if choice_index >= options.len() {
            return Err(EngineError::InvalidChoice("choice index out of range".to_string()));
        }
        let chosen = options[choice_index].clone();
        let best = best_option(&options).clone();
        let worst_ev = worst_option_ev(&options);

        let is_final_street = node_index + 1 >= state.episodes[hand_index].nodes.len();
        let rival_combo_range = hand_state_snapshot.rival_continue_range.clone();
        let profile = rival_combo_range.as_ref().map(|range| {
            let combos: Vec<crate::cards::Combo> =
                range.iter().filter_map(|(a, b)| crate::cards::Combo::new(*a, *b).ok()).collect();
            build_profile(&combos, 0.35, 0.65, None)
        });

        let hand_state = &mut state.hand_states[hand_index];
        let resolution = resolve_for(&chosen, hand_state, profile.as_ref(), None, is_final_street, &mut state.rng);

        let room_ev = (best.ev - worst_ev).max(1e-9);
        let record = Record {
            street: node.street,
            pot_bb: node.pot_bb,
            chosen_key: chosen.key.clone(),
            chosen_ev: chosen.ev,
            best_key: best.key.clone(),
            best_ev: best.ev,
            worst_ev,
            room_ev,
            ev_loss: best.ev - chosen.ev,
            hand_ended: resolution.hand_ended,
            resolution_note: resolution.note.clone(),
            hand_index,
        };
        state.records.push(record.clone());

        if resolution.hand_ended {
            state.hand_states[hand_index].hand_over = true;
            state.current_index = state.episodes[hand_index].nodes.len();
        } else {
            state.current_index = node_index + 1;
        }

        let next = match state.active_node() {
            None => NodeOutcome::Done(summarize_records(&state.records)),
            Some((next_hand, next_node)) => NodeOutcome::Node(state.node_view(next_hand, next_node)),
        };

        Ok(ChoiceOutcome {
            chosen_key: chosen.key,
            best_key: best.key,
            correct: record.chosen_key == record.best_key,
            ev_loss: record.ev_loss,
            resolution_note: record.resolution_note,
            hand_ended: record.hand_ended,
            next,
        })
    }

    pub fn summary(&self, session_id: Uuid) -> EngineResult<SummaryStats> {
        let sessions = self.sessions.lock();
        let state = sessions.get(&session_id).ok_or(EngineError::SessionNotFound)?;
        Ok(summarize_records(&state.records))
    }

    /// Plays a whole session end to end, asking `chooser` for an option index
    /// at every node. Used by the benchmark harness to run unattended,
    /// deterministic self-play without going through the CLI prompt loop.
    /// Returns the finished summary plus the raw per-decision records so a
    /// caller running several scenarios can pool them into one combined
    /// summary the way a single long session would read. `cleanup` drops the
    /// session from the manager once it's done so a benchmark sweep doesn't
    /// accumulate finished sessions in memory.
    pub fn drive_session<F>(&self, session_id: Uuid, mut chooser: F, cleanup: bool) -> EngineResult<(SummaryStats, Vec<Record>)>
    where
        F: FnMut(&NodeView) -> usize,
    {
        loop {
            match self.get_node(session_id)? {
                NodeOutcome::Done(summary) => {
                    let mut sessions = self.sessions.lock();
                    let records = if cleanup {
                        sessions.remove(&session_id).map(|s| s.records).unwrap_or_default()
                    } else {
                        sessions.get(&session_id).map(|s| s.records.clone()).unwrap_or_default()
                    };
                    return Ok((summary, records));
                }
                NodeOutcome::Node(node) => {
                    let choice_index = chooser(&node);
                    self.choose(session_id, choice_index)?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_session_starts_on_an_unfinished_node() {
        let manager = SessionManager::new();
        let id = manager.create_session(SessionConfig { hands: 1, mc_trials: 20, seed: Some(1), rival_style: RivalStyle::Balanced });
        let outcome = manager.get_node(id).unwrap();
        assert!(matches!(outcome, NodeOutcome::Node(_)));
    }

    #[test]
    fn unknown_session_id_reports_not_found() {
        let manager = SessionManager::new();
        let err = manager.get_node(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, EngineError::SessionNotFound);
    }

    #[test]
    fn choosing_an_out_of_range_index_is_rejected() {
        let manager = SessionManager::new();
        let id = manager.create_session(SessionConfig { hands: 1, mc_trials: 20, seed: Some(2), rival_style: RivalStyle::Balanced });
        let err = manager.choose(id, 999).unwrap_err();
        assert!(matches!(err, EngineError::InvalidChoice(_)));
    }

    #[test]
    fn playing_fold_every_street_ends_the_first_hand_immediately() {
        let manager = SessionManager::new();
        let id = manager.create_session(SessionConfig { hands: 1, mc_trials: 20, seed: Some(3), rival_style: RivalStyle::Balanced });
        let NodeOutcome::Node(node) = manager.get_node(id).unwrap() else { panic!("expected a node") };
        let fold_index = node.options.iter().position(|o| o.key == "fold").expect("fold is always offered");
        let result = manager.choose(id, fold_index).unwrap();
        assert!(result.hand_ended);
        assert!(matches!(result.next, NodeOutcome::Done(_)));
    }
}
