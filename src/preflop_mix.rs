//! Per-combo preflop {fold, call, 3bet, jam} frequency mix as a function of
//! open size, built from table-driven bands that widen/narrow with open size.

use std::collections::HashMap;

use crate::cards::{Card, Combo};
use crate::hand_strength::{all_combos_sorted, combo_playability_score};

#[derive(Debug, Clone, Copy)]
pub struct DefenseProfile {
    pub defend: f64,
    pub threebet: f64,
    pub jam: f64,
    pub marginal_band: f64,
    pub threebet_smooth: f64,
}

const PROFILE_ANCHORS: [(f64, DefenseProfile); 5] = [
    (
        2.0,
        DefenseProfile { defend: 0.72, threebet: 0.13, jam: 0.012, marginal_band: 0.08, threebet_smooth: 0.042 },
    ),
    (
        2.3,
        DefenseProfile { defend: 0.68, threebet: 0.13, jam: 0.012, marginal_band: 0.15, threebet_smooth: 0.038 },
    ),
    (
        2.5,
        DefenseProfile { defend: 0.70, threebet: 0.13, jam: 0.012, marginal_band: 0.20, threebet_smooth: 0.033 },
    ),
    (
        2.8,
        DefenseProfile { defend: 0.48, threebet: 0.115, jam: 0.015, marginal_band: 0.058, threebet_smooth: 0.028 },
    ),
    (
        3.2,
        DefenseProfile { defend: 0.34, threebet: 0.17, jam: 0.015, marginal_band: 0.05, threebet_smooth: 0.015 },
    ),
];

fn blend(low: DefenseProfile, high: DefenseProfile, t: f64) -> DefenseProfile {
    let inv = 1.0 - t;
    DefenseProfile {
        defend: low.defend * inv + high.defend * t,
        threebet: low.threebet * inv + high.threebet * t,
        jam: low.jam * inv + high.jam * t,
        marginal_band: low.marginal_band * inv + high.marginal_band * t,
        threebet_smooth: low.threebet_smooth * inv + high.threebet_smooth * t,
    }
}

fn profile_for_open(open_size: f64) -> DefenseProfile {
    if open_size <= PROFILE_ANCHORS[0].0 {
        return PROFILE_ANCHORS[0].1;
    }
    for window in PROFILE_ANCHORS.windows(2) {
        let (lo_x, lo_prof) = window[0];
        let (hi_x, hi_prof) = window[1];
        if open_size <= hi_x {
            let span = hi_x - lo_x;
            let t = if span <= 0.0 { 0.0 } else { (open_size - lo_x) / span };
            return blend(lo_prof, hi_prof, t);
        }
    }
    PROFILE_ANCHORS[PROFILE_ANCHORS.len() - 1].1
}

fn combos_without_blockers(blocked: &[Card]) -> Vec<Combo> {
    all_combos_sorted().iter().copied().filter(|c| !c.blocks_any(blocked)).collect()
}

fn percentile(combo: Combo, blocked: &[Card]) -> f64 {
    let combos = combos_without_blockers(blocked);
    let total = combos.len();
    if let Some(idx) = combos.iter().position(|&c| c == combo) {
        if total > 1 {
            1.0 - (idx as f64 / (total - 1) as f64)
        } else {
            1.0
        }
    } else {
        0.5
    }
}

/// Recommended fold/call/3bet/jam frequencies for a combo, summing to 1.
pub fn action_mix_for_combo(combo: Combo, open_size: f64, blocked: &[Card]) -> HashMap<String, f64> {
    let pct = percentile(combo, blocked);
    let profile = profile_for_open(open_size);

    let fold_cut = (1.0 - profile.defend).max(0.0);
    let marginal_end = (fold_cut + profile.marginal_band).min(1.0);

    if pct <= fold_cut {
        return HashMap::from([("fold".to_string(), 1.0)]);
    }

    if pct <= marginal_end {
        let band = profile.marginal_band.max(1e-6);
        let progress = ((pct - fold_cut) / band).clamp(0.0, 1.0);
        return HashMap::from([("fold".to_string(), 1.0 - progress), ("call".to_string(), progress)]);
    }

    let jam_start = if profile.jam > 0.0 { (marginal_end).max(1.0 - profile.jam) } else { 1.0 };
    let threebet_start = (marginal_end).max(jam_start - profile.threebet);

    if pct >= jam_start {
        if profile.jam <= 0.0 {
            return HashMap::from([("threebet".to_string(), 1.0)]);
        }
        let span = (1.0 - jam_start).max(1e-6);
        let weight = (pct - jam_start) / span;
        let jam_freq = 0.55 + 0.45 * weight;
        return HashMap::from([("jam".to_string(), jam_freq), ("threebet".to_string(), 1.0 - jam_freq)]);
    }

    if pct >= threebet_start {
        let threebet_span = profile.threebet.max(1e-6);
        let smooth = profile.threebet_smooth.min(threebet_span);
        if pct <= threebet_start + smooth {
            let local = (pct - threebet_start) / smooth.max(1e-6);
            let threebet_freq = 0.45 + 0.45 * local;
            return HashMap::from([("threebet".to_string(), threebet_freq), ("call".to_string(), 1.0 - threebet_freq)]);
        }
        return HashMap::from([("threebet".to_string(), 0.92), ("call".to_string(), 0.08)]);
    }

    HashMap::from([("call".to_string(), 1.0)])
}

pub fn normalise_mix(mix: &HashMap<String, f64>) -> HashMap<String, f64> {
    let total: f64 = mix.values().sum();
    if total <= 0.0 {
        return mix.clone();
    }
    mix.iter().map(|(k, v)| (k.clone(), v / total)).collect()
}

/// Ranks combos for this profile the same way `range_model` does, exposed for
/// callers that want to compute playability without going through a range.
pub fn playability_rank(combo: Combo) -> f64 {
    combo_playability_score(combo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;

    #[test]
    fn premium_combo_never_folds() {
        let aces = Combo::new(make_card(12, 0), make_card(12, 1)).unwrap();
        let mix = action_mix_for_combo(aces, 2.5, &[]);
        assert!(mix.get("fold").copied().unwrap_or(0.0) < 0.5);
    }

    #[test]
    fn weak_combo_folds_at_small_open() {
        let trash = Combo::new(make_card(0, 0), make_card(5, 1)).unwrap();
        let mix = action_mix_for_combo(trash, 2.0, &[]);
        assert!((mix.get("fold").copied().unwrap_or(0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mix_sums_to_one() {
        let combo = Combo::new(make_card(10, 0), make_card(9, 0)).unwrap();
        for open in [2.0, 2.3, 2.5, 2.8, 3.2] {
            let mix = action_mix_for_combo(combo, open, &[]);
            let total: f64 = mix.values().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }
}
