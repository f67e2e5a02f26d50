//! Hand evaluation and hero equity estimation.
//!
//! `equity_vs_combo`/`equity_vs_range` canonicalise their inputs (§4.1) and consult a
//! process-wide LRU cache. When the board has three or more cards the remaining
//! board cards are enumerated exhaustively for an exact result; otherwise equity is
//! estimated by adaptive Monte Carlo sampling that stops once the standard error
//! falls under the caller's target.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use itertools::Itertools;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::cards::{self, Card};
use crate::error::EngineError;
use crate::lru_cache::LruCache;

pub const MONTE_CHUNK: u32 = 150;
pub const MAX_MONTE_TRIALS: u32 = 1000;
pub const DEFAULT_TARGET_STD_ERROR: f64 = 0.025;
const EQUITY_CACHE_CAPACITY: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum HandCategory {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandStrength {
    pub category: HandCategory,
    pub ranks: [u8; 5],
}

impl PartialOrd for HandStrength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandStrength {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category.cmp(&other.category).then_with(|| self.ranks.cmp(&other.ranks))
    }
}

fn fill(mut values: Vec<u8>) -> [u8; 5] {
    values.resize(5, 0);
    [values[0], values[1], values[2], values[3], values[4]]
}

/// Evaluate the best hand made by exactly five cards (ranks here are 0..=12;
/// the straight/ace-low handling below works in that 0-based space).
fn evaluate_five(cards: &[Card; 5]) -> HandStrength {
    let mut counts = [0u8; 13];
    let mut suits = [0u8; 4];
    let mut sorted_ranks: Vec<u8> = cards.iter().map(|&c| cards::rank_of(c)).collect();
    sorted_ranks.sort_unstable_by(|a, b| b.cmp(a));

    for &card in cards {
        counts[cards::rank_of(card) as usize] += 1;
        suits[cards::suit_of(card) as usize] += 1;
    }

    let is_flush = suits.contains(&5);

    // bit i (1..=13) set means rank (i-1) present; bit 0 doubles the ace for the wheel.
    let mut mask: u16 = 0;
    for rank in 0u8..13 {
        if counts[rank as usize] > 0 {
            mask |= 1 << (rank + 1);
            if rank == 12 {
                mask |= 1; // ace also counts low for A-2-3-4-5
            }
        }
    }

    let mut straight_high: Option<u8> = None;
    for high in (4u8..13).rev() {
        let mut needed: u16 = 0;
        for i in 0..5u8 {
            needed |= 1 << (high - i + 1);
        }
        if mask & needed == needed {
            straight_high = Some(high);
            break;
        }
    }
    if straight_high.is_none() {
        // wheel: A(12) counted low via bit 0, ranks 0,1,2,3 plus ace-low bit.
        let wheel_needed: u16 = (1 << 1) | (1 << 2) | (1 << 3) | (1 << 4) | 1;
        if mask & wheel_needed == wheel_needed {
            straight_high = Some(3); // "5-high" in 0-based rank space
        }
    }

    let mut groups: Vec<(u8, u8)> = (0..13)
        .filter_map(|rank| {
            let count = counts[rank as usize];
            if count > 0 { Some((count, rank)) } else { None }
        })
        .collect();
    groups.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    if is_flush {
        if let Some(high) = straight_high {
            return HandStrength {
                category: HandCategory::StraightFlush,
                ranks: straight_ranks(high),
            };
        }
    }

    if let Some(&(count, rank)) = groups.first() {
        match count {
            4 => {
                let kicker = groups.iter().find(|(c, _)| *c == 1).map(|(_, r)| *r).unwrap_or(0);
                return HandStrength {
                    category: HandCategory::FourOfAKind,
                    ranks: fill(vec![rank, kicker]),
                };
            }
            3 => {
                if groups.get(1).map(|(c, _)| *c == 2).unwrap_or(false) {
                    let pair_rank = groups[1].1;
                    return HandStrength {
                        category: HandCategory::FullHouse,
                        ranks: fill(vec![rank, pair_rank]),
                    };
                }
            }
            _ => {}
        }
    }

    if is_flush {
        return HandStrength {
            category: HandCategory::Flush,
            ranks: fill(sorted_ranks.clone()),
        };
    }

    if let Some(high) = straight_high {
        return HandStrength {
            category: HandCategory::Straight,
            ranks: straight_ranks(high),
        };
    }

    if let Some(&(count, rank)) = groups.first() {
        match count {
            3 => {
                let mut kickers: Vec<u8> = groups.iter().filter(|(c, _)| *c == 1).map(|(_, r)| *r).collect();
                kickers.sort_unstable_by(|a, b| b.cmp(a));
                let mut values = vec![rank];
                values.extend(kickers);
                return HandStrength {
                    category: HandCategory::ThreeOfAKind,
                    ranks: fill(values),
                };
            }
            2 => {
                if groups.get(1).map(|(c, _)| *c == 2).unwrap_or(false) {
                    let first_pair = rank;
                    let second_pair = groups[1].1;
                    let kicker = groups.iter().find(|(c, _)| *c == 1).map(|(_, r)| *r).unwrap_or(0);
                    return HandStrength {
                        category: HandCategory::TwoPair,
                        ranks: fill(vec![first_pair, second_pair, kicker]),
                    };
                }
                let mut kickers: Vec<u8> = groups.iter().filter(|(c, _)| *c == 1).map(|(_, r)| *r).collect();
                kickers.sort_unstable_by(|a, b| b.cmp(a));
                let mut values = vec![rank];
                values.extend(kickers);
                return HandStrength {
                    category: HandCategory::OnePair,
                    ranks: fill(values),
                };
            }
            _ => {}
        }
    }

    HandStrength {
        category: HandCategory::HighCard,
        ranks: fill(sorted_ranks),
    }
}

fn straight_ranks(high: u8) -> [u8; 5] {
    fill(vec![high, high.wrapping_sub(1), high.wrapping_sub(2), high.wrapping_sub(3), high.wrapping_sub(4)])
}

pub fn best_five_card_hand(cards: &[Card]) -> HandStrength {
    assert!(cards.len() >= 5, "at least 5 cards required");
    cards
        .iter()
        .copied()
        .combinations(5)
        .map(|combo| evaluate_five(&[combo[0], combo[1], combo[2], combo[3], combo[4]]))
        .max()
        .expect("combinations non-empty")
}

pub fn compare_strength(a: HandStrength, b: HandStrength) -> Ordering {
    a.cmp(&b)
}

/// `1.0` hero wins, `0.5` chop, `0.0` hero loses, given a fully specified board.
pub fn showdown_result(hero: &[Card], board: &[Card], rival: &[Card]) -> f64 {
    let mut hero_seven: Vec<Card> = hero.to_vec();
    hero_seven.extend_from_slice(board);
    let mut rival_seven: Vec<Card> = rival.to_vec();
    rival_seven.extend_from_slice(board);
    match compare_strength(best_five_card_hand(&hero_seven), best_five_card_hand(&rival_seven)) {
        Ordering::Greater => 1.0,
        Ordering::Equal => 0.5,
        Ordering::Less => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    hero: [Card; 2],
    board: Vec<Card>,
    rival: [Card; 2],
    trials: u32,
    target_std_error_q: i64,
}

fn equity_cache() -> &'static Mutex<LruCache<CacheKey, f64>> {
    static CACHE: OnceLock<Mutex<LruCache<CacheKey, f64>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(LruCache::new(EQUITY_CACHE_CAPACITY)))
}

fn quantise_std_error(target: Option<f64>) -> i64 {
    let value = target.unwrap_or(0.0);
    (value * 10_000.0).round() as i64
}

fn seed_from_key(key: &CacheKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Hero's equity against a single specific rival combo, given `trials` as a floor
/// on Monte Carlo sampling (ignored for exact enumeration) and an optional target
/// standard error (ignored for exact enumeration).
pub fn equity_vs_combo(
    hero: [Card; 2],
    board: &[Card],
    rival: [Card; 2],
    trials: u32,
    target_std_error: Option<f64>,
) -> Result<f64, EngineError> {
    if board.len() > 5 {
        return Err(EngineError::InvalidBoard(format!("board has {} cards, max 5", board.len())));
    }
    let canon = cards::canonicalize_cards(&hero, board, &rival)?;
    let key = CacheKey {
        hero: [canon.hero[0], canon.hero[1]],
        board: canon.board.clone(),
        rival: [canon.rival[0], canon.rival[1]],
        trials,
        target_std_error_q: quantise_std_error(target_std_error),
    };

    if let Some(&cached) = equity_cache().lock().get(&key) {
        return Ok(cached);
    }

    let result = if board.len() >= 3 {
        exact_equity(hero, board, rival)
    } else {
        let seed = seed_from_key(&key);
        let mut rng = StdRng::seed_from_u64(seed);
        adaptive_monte_carlo_equity(hero, board, rival, trials, target_std_error.unwrap_or(DEFAULT_TARGET_STD_ERROR), &mut rng)
    };

    equity_cache().lock().put(key, result);
    Ok(result)
}

pub fn equity_vs_range(hero: [Card; 2], board: &[Card], combos: &[[Card; 2]], trials: u32) -> Result<f64, EngineError> {
    if combos.is_empty() {
        return Ok(0.5);
    }
    let mut total = 0.0;
    for &rival in combos {
        total += equity_vs_combo(hero, board, rival, trials, None)?;
    }
    Ok(total / combos.len() as f64)
}

fn exact_equity(hero: [Card; 2], board: &[Card], rival: [Card; 2]) -> f64 {
    let needed = 5usize.saturating_sub(board.len());
    if needed == 0 {
        return showdown_result(&hero, board, &rival);
    }
    let used: Vec<Card> = hero.iter().chain(board.iter()).chain(rival.iter()).copied().collect();
    let remaining: Vec<Card> = cards::standard_deck().into_iter().filter(|c| !used.contains(c)).collect();

    let mut total = 0.0;
    let mut count = 0u64;
    for fill_cards in remaining.into_iter().combinations(needed) {
        let mut full_board = board.to_vec();
        full_board.extend(fill_cards);
        total += showdown_result(&hero, &full_board, &rival);
        count += 1;
    }
    if count == 0 { 0.5 } else { total / count as f64 }
}

#[allow(clippy::too_many_arguments)]
fn adaptive_monte_carlo_equity<R: rand::Rng + ?Sized>(
    hero: [Card; 2],
    board: &[Card],
    rival: [Card; 2],
    min_trials: u32,
    target_std_error: f64,
    rng: &mut R,
) -> f64 {
    let used: Vec<Card> = hero.iter().chain(board.iter()).chain(rival.iter()).copied().collect();
    let mut deck: Vec<Card> = cards::standard_deck().into_iter().filter(|c| !used.contains(c)).collect();

    let min_trials = min_trials.min(MAX_MONTE_TRIALS).max(1);
    let mut wins = 0.0f64;
    let mut n: u32 = 0;

    while n < MAX_MONTE_TRIALS {
        let chunk = MONTE_CHUNK.min(MAX_MONTE_TRIALS - n);
        for _ in 0..chunk {
            deck.shuffle(rng);
            let cards_needed = 5usize.saturating_sub(board.len());
            let mut full_board = board.to_vec();
            full_board.extend_from_slice(&deck[..cards_needed]);
            wins += showdown_result(&hero, &full_board, &rival);
        }
        n += chunk;

        let p = wins / n as f64;
        let se = (p * (1.0 - p) / n as f64).sqrt();
        if n >= min_trials && se <= target_std_error {
            break;
        }
    }

    wins / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;

    #[test]
    fn straight_flush_beats_four_kind() {
        let sf = [make_card(8, 2), make_card(9, 2), make_card(10, 2), make_card(11, 2), make_card(12, 2)];
        let four = [make_card(7, 0), make_card(7, 1), make_card(7, 2), make_card(7, 3), make_card(12, 0)];
        assert!(evaluate_five(&sf) > evaluate_five(&four));
    }

    #[test]
    fn wheel_straight_detected() {
        let hand = [make_card(12, 0), make_card(0, 1), make_card(1, 2), make_card(2, 3), make_card(3, 0)];
        let strength = evaluate_five(&hand);
        assert_eq!(strength.category, HandCategory::Straight);
        assert_eq!(strength.ranks[0], 3);
    }

    #[test]
    fn exact_equity_is_zero_half_or_one_with_full_board() {
        let hero = [make_card(12, 0), make_card(11, 0)];
        let rival = [make_card(1, 1), make_card(2, 2)];
        let board = [make_card(0, 3), make_card(3, 0), make_card(4, 1), make_card(5, 2), make_card(6, 3)];
        let eq = equity_vs_combo(hero, &board, rival, 1, None).unwrap();
        assert!(eq == 0.0 || eq == 0.5 || eq == 1.0);
    }

    #[test]
    fn equity_matches_exact_enumeration_with_three_board_cards() {
        let hero = [make_card(12, 0), make_card(11, 0)];
        let rival = [make_card(1, 1), make_card(2, 2)];
        let board = [make_card(0, 3), make_card(3, 0), make_card(4, 1)];
        let eq = equity_vs_combo(hero, &board, rival, 50, None).unwrap();
        let direct = exact_equity(hero, &board, rival);
        assert!((eq - direct).abs() < 1e-9);
    }

    #[test]
    fn invalid_board_length_rejected() {
        let hero = [make_card(12, 0), make_card(11, 0)];
        let rival = [make_card(1, 1), make_card(2, 2)];
        let board = [make_card(0, 3), make_card(3, 0), make_card(4, 1), make_card(5, 2), make_card(6, 3), make_card(7, 0)];
        assert!(equity_vs_combo(hero, &board, rival, 10, None).is_err());
    }
}
