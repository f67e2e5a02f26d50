//! Models how a simulated rival responds to a hero bet/raise: not
//! clairvoyant, but biased toward folding weaker holdings and continuing with
//! stronger ones, with a small amount of opponent-adaptation and sampling noise.

use std::collections::HashMap;

use rand::Rng;

use crate::cards::Combo;
use crate::hand_strength::combo_playability_score;

fn normalize_key(combo: Combo) -> (u8, u8) {
    if combo.0 <= combo.1 {
        (combo.0, combo.1)
    } else {
        (combo.1, combo.0)
    }
}

fn combo_strength(combo: Combo) -> f64 {
    combo_playability_score(combo)
}

/// Tracks how often the hero has been aggressive vs. passive across the
/// session, used to nudge the rival's fold frequency toward exploiting it.
#[derive(Debug, Clone, Copy, Default)]
pub struct VillainAdapt {
    pub aggr: f64,
    pub passive: f64,
}

/// A lightweight response profile attached to an option's metadata, built
/// once per decision and sampled from when the rival's exact hand is hidden.
#[derive(Debug, Clone)]
pub struct RivalProfile {
    pub fold_probability: f64,
    pub continue_ratio: f64,
    pub total: usize,
    pub continue_count: usize,
    pub ranked: Vec<Combo>,
    pub strengths: Vec<f64>,
    ranks: HashMap<(u8, u8), usize>,
    pub strength_bounds: (f64, f64),
    pub threshold_strength: f64,
    pub temperature: f64,
}

/// Outcome of sampling a single rival response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RivalDecision {
    pub folds: bool,
}

pub fn build_profile(
    sampled_range: &[Combo],
    fold_probability: f64,
    continue_ratio: f64,
    strengths: Option<&[(Combo, f64)]>,
) -> RivalProfile {
    let mut strength_lookup: HashMap<(u8, u8), f64> = HashMap::new();
    if let Some(pairs) = strengths {
        for &(combo, score) in pairs {
            strength_lookup.insert(normalize_key(combo), score);
        }
    }

    let mut seen: HashMap<(u8, u8), Combo> = HashMap::new();
    for &combo in sampled_range {
        seen.entry(normalize_key(combo)).or_insert(combo);
    }

    let strength_for = |combo: Combo| -> f64 {
        strength_lookup
            .get(&normalize_key(combo))
            .copied()
            .unwrap_or_else(|| combo_strength(combo))
    };

    let mut ranked: Vec<Combo> = seen.values().copied().collect();
    ranked.sort_by(|a, b| strength_for(*b).partial_cmp(&strength_for(*a)).unwrap());

    let total = ranked.len();
    let fold_probability = fold_probability.clamp(0.0, 1.0);
    let continue_ratio = continue_ratio.clamp(0.0, 1.0);
    let mut continue_count = ((total as f64) * continue_ratio).round().max(0.0) as usize;
    continue_count = continue_count.min(total);
    if continue_ratio > 0.0 && continue_count == 0 {
        continue_count = 1;
    }

    let strength_values: Vec<f64> = ranked.iter().map(|&c| strength_for(c)).collect();
    let ranks: HashMap<(u8, u8), usize> = ranked
        .iter()
        .enumerate()
        .map(|(idx, &c)| (normalize_key(c), idx))
        .collect();
    let min_strength = strength_values.iter().copied().fold(f64::INFINITY, f64::min);
    let max_strength = strength_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (min_strength, max_strength) = if strength_values.is_empty() {
        (0.0, 1.0)
    } else {
        (min_strength, max_strength)
    };
    let threshold_strength = if continue_count > 0 {
        strength_values[continue_count - 1]
    } else {
        min_strength
    };
    let temperature = (0.2 * (1.0 - continue_ratio)).max(0.05);

    RivalProfile {
        fold_probability,
        continue_ratio,
        total,
        continue_count,
        ranked,
        strengths: strength_values,
        ranks,
        strength_bounds: (min_strength, max_strength),
        threshold_strength,
        temperature,
    }
}

fn percentile_for_combo(profile: &RivalProfile, combo: Combo) -> f64 {
    if profile.ranked.is_empty() {
        return 0.5;
    }
    let total = profile.ranked.len().max(1);
    let idx = match profile.ranks.get(&normalize_key(combo)) {
        Some(&idx) => idx,
        None => {
            let target = combo_strength(combo);
            profile
                .strengths
                .iter()
                .position(|&s| target >= s)
                .unwrap_or(total - 1)
        }
    };
    if total > 1 {
        1.0 - (idx as f64 / (total - 1) as f64)
    } else {
        1.0
    }
}

fn strength_for_combo(profile: &RivalProfile, combo: Combo) -> f64 {
    if profile.ranked.is_empty() {
        return combo_strength(combo);
    }
    match profile.ranks.get(&normalize_key(combo)) {
        Some(&idx) => profile.strengths.get(idx).copied().unwrap_or_else(|| combo_strength(combo)),
        None => combo_strength(combo),
    }
}

fn sample_profile_combo<R: Rng + ?Sized>(profile: &RivalProfile, rng: &mut R) -> Option<Combo> {
    if profile.ranked.is_empty() {
        return None;
    }
    let total = profile.ranked.len();
    let continue_count = profile.continue_count;

    if continue_count == 0 || continue_count >= total {
        let idx = (rng.r#gen::<f64>() * total as f64) as usize;
        return Some(profile.ranked[idx.min(total - 1)]);
    }

    if rng.r#gen::<f64>() < profile.continue_ratio {
        let idx = (rng.r#gen::<f64>() * continue_count as f64) as usize;
        return Some(profile.ranked[idx.min(continue_count - 1)]);
    }

    let tail_size = total - continue_count;
    let idx = continue_count + (rng.r#gen::<f64>() * tail_size as f64) as usize;
    Some(profile.ranked[idx.min(total - 1)])
}

/// Samples whether the rival folds or continues against a bet/raise. When
/// `rival_cards` is known (heads-up, cards dealt face up) the decision uses
/// that exact holding; otherwise a holding is sampled from the profile.
pub fn decide_action<R: Rng + ?Sized>(
    profile: Option<&RivalProfile>,
    rival_cards: Option<Combo>,
    adapt: Option<VillainAdapt>,
    rng: &mut R,
) -> RivalDecision {
    let Some(profile) = profile else {
        return RivalDecision { folds: false };
    };

    let mut fold_prob = profile.fold_probability;
    let (min_strength, max_strength) = profile.strength_bounds;
    let spread = (max_strength - min_strength).max(1e-6);
    let noise = (0.18 * (1.0 - profile.continue_ratio)).clamp(0.0, 0.08);

    let mut adapt_scale = 0.0;
    if let Some(adapt) = adapt {
        let deviation = ((adapt.aggr + 1.0) / (adapt.passive + 1.0)).ln();
        let sample_total = adapt.aggr + adapt.passive;
        let sample_weight = (sample_total / 6.0).min(1.0);
        adapt_scale = (0.14 * deviation * sample_weight).clamp(-0.35, 0.35);
    }

    let strength = match rival_cards {
        Some(combo) => Some(strength_for_combo(profile, combo)),
        None => sample_profile_combo(profile, rng).map(|combo| strength_for_combo(profile, combo)),
    };

    if let Some(strength) = strength {
        let strength_norm = (strength - min_strength) / spread;
        let threshold_norm = (profile.threshold_strength - min_strength) / spread;
        let delta = strength_norm - threshold_norm;
        let bias_scale = (((1.0 - profile.fold_probability) * 0.5 + 0.18)).clamp(0.18, 0.45);
        let slope = profile.temperature.max(0.02);
        let shift = (delta / slope).tanh();
        fold_prob -= shift * bias_scale;
    }

    if adapt_scale != 0.0 {
        fold_prob -= adapt_scale;
    }

    if noise > 0.0 {
        fold_prob += (rng.r#gen::<f64>() - 0.5) * 2.0 * noise;
    }

    fold_prob = fold_prob.clamp(0.0, 1.0);
    let draw = rng.r#gen::<f64>();
    RivalDecision { folds: draw < fold_prob }
}

/// `percentile_for_combo` is useful outside of `decide_action` (e.g. for
/// explaining a fold in a decision's rationale text); expose it.
pub fn percentile(profile: &RivalProfile, combo: Combo) -> f64 {
    percentile_for_combo(profile, combo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_range() -> Vec<Combo> {
        let mut combos = Vec::new();
        for rank in 0..13u8 {
            combos.push(Combo::new(make_card(rank, 0), make_card(rank, 1)).unwrap());
        }
        combos
    }

    #[test]
    fn strong_holding_continues_more_than_it_folds_over_many_draws() {
        let combos = sample_range();
        let profile = build_profile(&combos, 0.5, 0.5, None);
        let strongest = *profile.ranked.first().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let folds: usize = (0..500)
            .filter(|_| decide_action(Some(&profile), Some(strongest), None, &mut rng).folds)
            .count();
        assert!(folds < 250);
    }

    #[test]
    fn weak_holding_folds_more_than_it_continues_over_many_draws() {
        let combos = sample_range();
        let profile = build_profile(&combos, 0.5, 0.5, None);
        let weakest = *profile.ranked.last().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let folds: usize = (0..500)
            .filter(|_| decide_action(Some(&profile), Some(weakest), None, &mut rng).folds)
            .count();
        assert!(folds > 250);
    }

    #[test]
    fn missing_profile_never_folds() {
        let mut rng = StdRng::seed_from_u64(1);
        let decision = decide_action(None, None, None, &mut rng);
        assert!(!decision.folds);
    }

    #[test]
    fn percentile_is_one_for_strongest_ranked_combo() {
        let combos = sample_range();
        let profile = build_profile(&combos, 0.5, 0.5, None);
        let strongest = *profile.ranked.first().unwrap();
        assert!((percentile(&profile, strongest) - 1.0).abs() < 1e-9);
    }
}
