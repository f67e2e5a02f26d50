//! Deterministic playability scoring for two-card holdings, shared by the
//! range model, preflop mix, and rival strategy so every subsystem ranks combos
//! the same way.

use crate::cards::{rank_of, suit_of, Card, Combo};

/// Higher is stronger. Calibrated against solver charts: suited and connected
/// holdings gain value, offsuit gappy holdings with weak kickers lose it.
pub fn combo_playability_score(combo: Combo) -> f64 {
    let a = combo.0;
    let b = combo.1;
    let ra = rank_of(a) as i32;
    let rb = rank_of(b) as i32;
    let suited = suit_of(a) == suit_of(b);
    let (high, low) = if ra >= rb { (ra, rb) } else { (rb, ra) };

    let mut score = (high * 10 + low) as f64;
    if high == low {
        score += 80.0 + high as f64 * 5.0;
        return score;
    }

    if suited {
        score += 5.0;
    }
    let gap = high - low - 1;
    if gap <= 0 {
        score += 4.0;
    } else if gap == 1 {
        score += 3.0;
    } else if gap == 2 {
        score += 1.0;
    } else if gap >= 4 {
        score -= gap as f64;
    }

    let offsuit_penalty = if suited { 0.0 } else { 1.0 };
    if gap >= 2 {
        score -= offsuit_penalty * (gap as f64 - 1.5);
    }
    if !suited && low <= 4 {
        score -= 3.4 - 0.35 * low as f64;
    }
    if !suited && gap >= 2 && low <= 5 {
        score -= 0.6 * (6 - low) as f64;
    }
    if gap >= 5 {
        score -= 0.5 * gap as f64;
    }
    if !suited && high <= 9 {
        score -= 0.5;
    }
    if !suited && gap >= 3 {
        score -= 1.2 * (gap as f64 - 2.0);
    }
    if !suited && high >= 10 && low <= 5 && gap >= 3 {
        score -= 6.0;
    }

    score
}

/// All 1326 distinct two-card combos from a standard deck, ranked once by
/// `combo_playability_score` descending. Cached process-wide the first time
/// it's requested (mirrors `@lru_cache(1)` on the Python side).
pub fn all_combos_sorted() -> &'static Vec<Combo> {
    use std::sync::OnceLock;
    static COMBOS: OnceLock<Vec<Combo>> = OnceLock::new();
    COMBOS.get_or_init(|| {
        let deck: Vec<Card> = crate::cards::standard_deck();
        let mut combos = Vec::with_capacity(1326);
        for i in 0..deck.len() {
            for j in (i + 1)..deck.len() {
                combos.push(Combo::new(deck[i], deck[j]).expect("distinct cards"));
            }
        }
        combos.sort_by(|a, b| {
            combo_playability_score(*b)
                .partial_cmp(&combo_playability_score(*a))
                .unwrap()
        });
        combos
    })
}

/// A coarse "how wet is this board" score in `[0, 1]` used to widen or narrow
/// postflop bet-sizing candidates. Counts suit concentration and rank
/// connectivity since the upstream reference's board-texture helper could not
/// be resolved; documented as a best-effort heuristic in DESIGN.md.
pub fn board_texture_score(board: &[Card]) -> f64 {
    if board.len() < 3 {
        return 0.5;
    }
    let mut suit_counts = [0u8; 4];
    for &c in board {
        suit_counts[suit_of(c) as usize] += 1;
    }
    let max_suit = *suit_counts.iter().max().unwrap_or(&0);
    let flush_component = match max_suit {
        0 | 1 => 0.0,
        2 => 0.25,
        3 => 0.6,
        _ => 0.9,
    };

    let mut ranks: Vec<i32> = board.iter().map(|&c| rank_of(c) as i32).collect();
    ranks.sort_unstable();
    ranks.dedup();
    let mut connectivity = 0.0;
    for window in ranks.windows(2) {
        let gap = window[1] - window[0];
        if gap <= 4 {
            connectivity += (5 - gap) as f64 / 4.0;
        }
    }
    let straight_component = (connectivity / (board.len() as f64)).min(1.0);

    (0.55 * flush_component + 0.45 * straight_component).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;

    #[test]
    fn pairs_outrank_unpaired_of_similar_rank() {
        let pair = Combo::new(make_card(10, 0), make_card(10, 1)).unwrap();
        let unpaired = Combo::new(make_card(10, 0), make_card(9, 1)).unwrap();
        assert!(combo_playability_score(pair) > combo_playability_score(unpaired));
    }

    #[test]
    fn suited_outranks_offsuit_same_ranks() {
        let suited = Combo::new(make_card(12, 0), make_card(9, 0)).unwrap();
        let offsuit = Combo::new(make_card(12, 0), make_card(9, 1)).unwrap();
        assert!(combo_playability_score(suited) > combo_playability_score(offsuit));
    }

    #[test]
    fn all_combos_sorted_is_fully_ranked_and_stable() {
        let combos = all_combos_sorted();
        assert_eq!(combos.len(), 1326);
        let first_score = combo_playability_score(combos[0]);
        let last_score = combo_playability_score(combos[combos.len() - 1]);
        assert!(first_score >= last_score);
    }

    #[test]
    fn wet_board_scores_higher_than_dry_board() {
        let dry = [make_card(1, 0), make_card(6, 1), make_card(11, 2)];
        let wet = [make_card(5, 0), make_card(6, 0), make_card(7, 0)];
        assert!(board_texture_score(&wet) > board_texture_score(&dry));
    }
}
