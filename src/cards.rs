//! Integer card model: cards are `u8` in `[0, 52)`, `rank = card / 4`, `suit = card % 4`.
//!
//! This replaces the enum-based `Card`/`Rank`/`Suit` model the trainer used to carry;
//! equity, canonicalisation, and range ranking all want a flat integer so they can
//! index arrays and build cache keys directly instead of matching on enums.

use std::fmt;

use crate::error::EngineError;

pub const RANKS: &str = "23456789TJQKA";
pub const SUITS_LOWER: &str = "shdc";
pub const SUITS_UPPER: &str = "SHDC";
pub const DECK_SIZE: u8 = 52;

pub type Card = u8;

pub fn rank_of(card: Card) -> u8 {
    card / 4
}

pub fn suit_of(card: Card) -> u8 {
    card % 4
}

pub fn make_card(rank: u8, suit: u8) -> Card {
    rank * 4 + suit
}

/// Render a card in `rank+suit` notation, e.g. `"As"`, `"Th"`. Lowercase suit.
pub fn card_notation(card: Card) -> String {
    let rank_ch = RANKS.as_bytes()[rank_of(card) as usize] as char;
    let suit_ch = SUITS_LOWER.as_bytes()[suit_of(card) as usize] as char;
    format!("{rank_ch}{suit_ch}")
}

/// Render a card the way the HTTP API does: uppercase rank and suit, e.g. `"AS"`.
pub fn card_notation_upper(card: Card) -> String {
    let rank_ch = RANKS.as_bytes()[rank_of(card) as usize] as char;
    let suit_ch = SUITS_UPPER.as_bytes()[suit_of(card) as usize] as char;
    format!("{rank_ch}{suit_ch}")
}

pub fn cards_notation(cards: &[Card]) -> Vec<String> {
    cards.iter().copied().map(card_notation).collect()
}

pub fn cards_notation_upper(cards: &[Card]) -> Vec<String> {
    cards.iter().copied().map(card_notation_upper).collect()
}

pub fn format_cards_spaced(cards: &[Card]) -> String {
    cards_notation(cards).join(" ")
}

/// Parse a single two-character card string such as `"As"`, `"10h"`/`"Th"`, or `"AS"`.
pub fn parse_card(input: &str) -> Result<Card, EngineError> {
    let trimmed = input.trim();
    if trimmed.len() < 2 {
        return Err(EngineError::InvalidInput(format!("malformed card: {input}")));
    }
    let (rank_part, suit_part) = trimmed.split_at(trimmed.len() - 1);
    let rank_part = if rank_part.eq_ignore_ascii_case("10") { "T" } else { rank_part };
    let rank_ch = rank_part
        .chars()
        .next()
        .ok_or_else(|| EngineError::InvalidInput(format!("malformed card: {input}")))?;
    let rank_upper = rank_ch.to_ascii_uppercase();
    let rank = RANKS
        .find(rank_upper)
        .ok_or_else(|| EngineError::InvalidInput(format!("unknown rank in card: {input}")))? as u8;
    let suit_ch = suit_part
        .chars()
        .next()
        .ok_or_else(|| EngineError::InvalidInput(format!("malformed card: {input}")))?;
    let suit_lower = suit_ch.to_ascii_lowercase();
    let suit = SUITS_LOWER
        .find(suit_lower)
        .ok_or_else(|| EngineError::InvalidInput(format!("unknown suit in card: {input}")))? as u8;
    Ok(make_card(rank, suit))
}

pub fn standard_deck() -> Vec<Card> {
    (0..DECK_SIZE).collect()
}

/// An unordered pair of distinct cards, canonicalised to `(lo, hi)` with `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combo(pub Card, pub Card);

impl Combo {
    pub fn new(a: Card, b: Card) -> Result<Self, EngineError> {
        if a == b {
            return Err(EngineError::InvalidDeal(format!("duplicate card in combo: {a}")));
        }
        Ok(if a < b { Combo(a, b) } else { Combo(b, a) })
    }

    pub fn cards(&self) -> [Card; 2] {
        [self.0, self.1]
    }

    pub fn is_pair(&self) -> bool {
        rank_of(self.0) == rank_of(self.1)
    }

    pub fn is_suited(&self) -> bool {
        suit_of(self.0) == suit_of(self.1)
    }

    pub fn category(&self) -> ComboCategory {
        if self.is_pair() {
            ComboCategory::Pair
        } else if self.is_suited() {
            ComboCategory::Suited
        } else {
            ComboCategory::Offsuit
        }
    }

    pub fn blocks(&self, card: Card) -> bool {
        self.0 == card || self.1 == card
    }

    pub fn blocks_any(&self, cards: &[Card]) -> bool {
        cards.iter().any(|&c| self.blocks(c))
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", card_notation(self.0), card_notation(self.1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComboCategory {
    Pair,
    Suited,
    Offsuit,
}

/// Canonical two-card abbreviation, e.g. `A5s`, `KQo`, `77`. Invariant under
/// swapping the two cards (it always sorts by rank first).
pub fn canonical_hand_abbrev(combo: Combo) -> String {
    let (a, b) = (combo.0, combo.1);
    let (hi, lo) = if rank_of(a) >= rank_of(b) { (a, b) } else { (b, a) };
    let hi_ch = RANKS.as_bytes()[rank_of(hi) as usize] as char;
    let lo_ch = RANKS.as_bytes()[rank_of(lo) as usize] as char;
    if rank_of(hi) == rank_of(lo) {
        format!("{hi_ch}{lo_ch}")
    } else if suit_of(hi) == suit_of(lo) {
        format!("{hi_ch}{lo_ch}s")
    } else {
        format!("{hi_ch}{lo_ch}o")
    }
}

/// All 24 permutations of the four suits, used by `canonicalize_cards` to search
/// for the suit-isomorphism that yields the lexicographically smallest encoding.
fn suit_permutations() -> Vec<[u8; 4]> {
    let mut perms = Vec::with_capacity(24);
    let base = [0u8, 1, 2, 3];
    permute(&base, &mut Vec::new(), &mut [false; 4], &mut perms);
    perms
}

fn permute(base: &[u8; 4], current: &mut Vec<u8>, used: &mut [bool; 4], out: &mut Vec<[u8; 4]>) {
    if current.len() == 4 {
        out.push([current[0], current[1], current[2], current[3]]);
        return;
    }
    for &s in base {
        let idx = s as usize;
        if used[idx] {
            continue;
        }
        used[idx] = true;
        current.push(s);
        permute(base, current, used, out);
        current.pop();
        used[idx] = false;
    }
}

fn remap(card: Card, perm: &[u8; 4]) -> Card {
    make_card(rank_of(card), perm[suit_of(card) as usize])
}

/// Canonicalised encoding of a hero/board/rival layout under the suit-isomorphism
/// that yields the lexicographically smallest tuple. Used as the equity cache key
/// so suit-isomorphic situations share the same cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalLayout {
    pub hero: Vec<Card>,
    pub board: Vec<Card>,
    pub rival: Vec<Card>,
}

pub fn canonicalize_cards(hero: &[Card], board: &[Card], rival: &[Card]) -> Result<CanonicalLayout, EngineError> {
    let mut all: Vec<Card> = hero.iter().chain(board.iter()).chain(rival.iter()).copied().collect();
    all.sort_unstable();
    for window in all.windows(2) {
        if window[0] == window[1] {
            return Err(EngineError::InvalidDeal("duplicate card across hero/board/rival".to_string()));
        }
    }

    let mut best: Option<(Vec<Card>, Vec<Card>, Vec<Card>)> = None;
    for perm in suit_permutations() {
        let mut h: Vec<Card> = hero.iter().map(|&c| remap(c, &perm)).collect();
        let mut b: Vec<Card> = board.iter().map(|&c| remap(c, &perm)).collect();
        let mut r: Vec<Card> = rival.iter().map(|&c| remap(c, &perm)).collect();
        h.sort_unstable();
        b.sort_unstable();
        r.sort_unstable();
        let candidate = (h, b, r);
        let better = match &best {
            None => true,
            Some(current) => candidate < *current,
        };
        if better {
            best = Some(candidate);
        }
    }
    let (hero, board, rival) = best.expect("24 suit permutations always produce a candidate");
    Ok(CanonicalLayout { hero, board, rival })
}

/// Deal disjoint hero(2), rival(2), board(5) from a freshly shuffled deck.
pub fn deal_hand<R: rand::Rng + ?Sized>(rng: &mut R) -> ([Card; 2], [Card; 2], [Card; 5]) {
    use rand::seq::SliceRandom;
    let mut deck = standard_deck();
    deck.shuffle(rng);
    let hero = [deck[0], deck[1]];
    let rival = [deck[2], deck[3]];
    let board = [deck[4], deck[5], deck[6], deck[7], deck[8]];
    (hero, rival, board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_string_round_trips_all_52() {
        for c in 0..DECK_SIZE {
            let notation = card_notation(c);
            let parsed = parse_card(&notation).unwrap();
            assert_eq!(parsed, c);
        }
    }

    #[test]
    fn abbrev_invariant_under_swap() {
        let a = Combo::new(make_card(12, 0), make_card(11, 1)).unwrap();
        let b = Combo::new(make_card(11, 1), make_card(12, 0)).unwrap();
        assert_eq!(canonical_hand_abbrev(a), canonical_hand_abbrev(b));
        assert_eq!(canonical_hand_abbrev(a), "AKo");
    }

    #[test]
    fn pair_and_suited_detection() {
        let pair = Combo::new(make_card(7, 0), make_card(7, 1)).unwrap();
        assert!(pair.is_pair());
        let suited = Combo::new(make_card(12, 2), make_card(10, 2)).unwrap();
        assert!(suited.is_suited());
        assert_eq!(canonical_hand_abbrev(suited), "AJs");
    }

    #[test]
    fn canonicalisation_is_suit_isomorphism_invariant() {
        let hero_a = [make_card(12, 0), make_card(11, 0)];
        let board_a = [make_card(2, 1), make_card(5, 2), make_card(9, 3)];
        let hero_b = [make_card(12, 1), make_card(11, 1)];
        let board_b = [make_card(2, 0), make_card(5, 2), make_card(9, 3)];
        let c1 = canonicalize_cards(&hero_a, &board_a, &[]).unwrap();
        let c2 = canonicalize_cards(&hero_b, &board_b, &[]).unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn canonicalisation_rejects_duplicate_cards() {
        let hero = [make_card(12, 0), make_card(12, 0)];
        assert!(canonicalize_cards(&hero, &[], &[]).is_err());
    }
}
