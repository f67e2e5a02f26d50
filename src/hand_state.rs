//! Pure mutation helpers over `HandState`: recomputing the pot, propagating
//! the effective stack to cached nodes, and applying a stack-capped
//! contribution. Kept as free functions rather than methods so the resolver
//! can call them in the same order the original engine does.

use crate::episode::{HandState, Street};

pub fn recalculate_pot(state: &mut HandState) {
    state.pot = state.hero_contrib + state.rival_contrib;
}

pub fn update_effective_stack(state: &mut HandState) {
    state.effective_stack = state.hero_stack.min(state.rival_stack);
    let effective = state.effective_stack;
    for node in state.nodes.values_mut() {
        node.effective_bb = effective;
    }
}

/// Applies `amount` toward `role`'s stack, capped at what's left in it.
/// Returns the amount actually applied, then recalculates the pot and
/// effective stack.
pub fn apply_contribution(state: &mut HandState, role: Role, amount: f64) -> f64 {
    let (contrib, stack) = match role {
        Role::Hero => (&mut state.hero_contrib, &mut state.hero_stack),
        Role::Rival => (&mut state.rival_contrib, &mut state.rival_stack),
    };
    let applied = amount.max(0.0).min(*stack);
    if applied < amount.max(0.0) {
        tracing::debug!(role = ?role, requested = amount, applied, "contribution truncated to remaining stack");
    }
    *contrib += applied;
    *stack -= applied;
    recalculate_pot(state);
    update_effective_stack(state);
    applied
}

pub fn set_street_pot(state: &mut HandState, street: Street, pot: f64) {
    if let Some(node) = state.nodes.get_mut(&street) {
        node.pot_bb = pot;
        node.effective_bb = state.effective_stack;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Hero,
    Rival,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;
    use crate::episode::{Node, NodeContext};
    use std::collections::HashMap;

    fn state() -> HandState {
        HandState {
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
        }
    }

    #[test]
    fn apply_contribution_caps_at_remaining_stack() {
        let mut s = state();
        let applied = apply_contribution(&mut s, Role::Hero, 500.0);
        assert_eq!(applied, 97.5);
        assert_eq!(s.hero_stack, 0.0);
        assert_eq!(s.pot, s.hero_contrib + s.rival_contrib);
    }

    #[test]
    fn apply_contribution_updates_effective_stack_and_cached_nodes() {
        let mut s = state();
        s.nodes.insert(
            Street::Flop,
            Node {
                street: Street::Flop,
                description: String::new(),
                pot_bb: 3.5,
                effective_bb: 97.5,
                hero_cards: vec![],
                board: vec![],
                actor: "hero".to_string(),
                context: NodeContext::default(),
            },
        );
        apply_contribution(&mut s, Role::Rival, 10.0);
        assert_eq!(s.effective_stack, s.hero_stack.min(s.rival_stack));
        assert_eq!(s.nodes[&Street::Flop].effective_bb, s.effective_stack);
    }

    #[test]
    fn set_street_pot_syncs_cached_node() {
        let mut s = state();
        s.nodes.insert(
            Street::Turn,
            Node {
                street: Street::Turn,
                description: String::new(),
                pot_bb: 3.5,
                effective_bb: 97.5,
                hero_cards: vec![],
                board: vec![],
                actor: "hero".to_string(),
                context: NodeContext::default(),
            },
        );
        set_street_pot(&mut s, Street::Turn, 12.0);
        assert_eq!(s.nodes[&Street::Turn].pot_bb, 12.0);
    }
}
