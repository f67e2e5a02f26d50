//! Stratified sampling and weighted-average helpers shared by the option
//! generator: sample a rival range down to a workable size while keeping the
//! pair/suited/offsuit mix proportional, then fold weights back into
//! equity-weighted aggregates.

use std::collections::HashMap;

use rand::Rng;

use crate::cards::{suit_of, Card, Combo};

pub type ComboKey = (Card, Card);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComboCategory {
    Pair,
    Suited,
    Offsuit,
}

pub fn combo_category(combo: Combo) -> ComboCategory {
    if combo.0 / 4 == combo.1 / 4 {
        ComboCategory::Pair
    } else if suit_of(combo.0) == suit_of(combo.1) {
        ComboCategory::Suited
    } else {
        ComboCategory::Offsuit
    }
}

pub fn normalize_combo(combo: Combo) -> ComboKey {
    if combo.0 > combo.1 {
        (combo.1, combo.0)
    } else {
        (combo.0, combo.1)
    }
}

fn weighted_sample<R: Rng + ?Sized>(
    entries: &[(usize, Combo)],
    count: usize,
    weights: Option<&HashMap<ComboKey, f64>>,
    rng: &mut R,
) -> Vec<(usize, Combo)> {
    if count == 0 || entries.is_empty() {
        return Vec::new();
    }
    let mut pool: Vec<(usize, Combo)> = entries.to_vec();
    let mut result = Vec::new();

    let entry_weight = |combo: Combo| -> f64 {
        match weights {
            None => 1.0,
            Some(w) => w.get(&normalize_combo(combo)).copied().unwrap_or(0.0).max(0.0),
        }
    };

    for _ in 0..count.min(pool.len()) {
        let totals: Vec<f64> = pool.iter().map(|&(_, c)| entry_weight(c)).collect();
        let weight_sum: f64 = totals.iter().sum();
        let chosen = if weight_sum <= 0.0 {
            rng.gen_range(0..pool.len())
        } else {
            let target = rng.r#gen::<f64>() * weight_sum;
            let mut cumulative = 0.0;
            let mut idx = pool.len() - 1;
            for (i, &w) in totals.iter().enumerate() {
                cumulative += w;
                if cumulative >= target {
                    idx = i;
                    break;
                }
            }
            idx
        };
        result.push(pool.remove(chosen));
    }
    result
}

/// Proportionally samples down to `limit` combos, preserving the
/// pair/suited/offsuit mix of the input range.
pub fn sample_range<R: Rng + ?Sized>(
    combos: &[Combo],
    limit: usize,
    weights: Option<&HashMap<ComboKey, f64>>,
    rng: &mut R,
) -> Vec<Combo> {
    let total = combos.len();
    if limit == 0 || total <= limit {
        return combos.to_vec();
    }

    let mut buckets: HashMap<ComboCategory, Vec<(usize, Combo)>> = HashMap::new();
    for (idx, &combo) in combos.iter().enumerate() {
        buckets.entry(combo_category(combo)).or_default().push((idx, combo));
    }

    let categories = [ComboCategory::Pair, ComboCategory::Suited, ComboCategory::Offsuit];
    let mut allocations: HashMap<ComboCategory, usize> = HashMap::new();
    let mut remainders: Vec<(f64, ComboCategory)> = Vec::new();
    let mut assigned = 0usize;

    for &cat in &categories {
        let count = buckets.get(&cat).map(|v| v.len()).unwrap_or(0);
        if count == 0 {
            continue;
        }
        let exact = limit as f64 * (count as f64 / total as f64);
        let alloc = (exact as usize).min(count);
        allocations.insert(cat, alloc);
        assigned += alloc;
        remainders.push((exact - alloc as f64, cat));
    }

    let mut remaining = limit.saturating_sub(assigned);
    if remaining > 0 {
        remainders.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        for &(_, cat) in &remainders {
            if remaining == 0 {
                break;
            }
            let available = buckets.get(&cat).map(|v| v.len()).unwrap_or(0);
            let current = *allocations.get(&cat).unwrap_or(&0);
            if current >= available {
                continue;
            }
            *allocations.entry(cat).or_insert(0) += 1;
            remaining -= 1;
        }
    }

    if remaining > 0 {
        for &cat in &categories {
            if remaining == 0 {
                break;
            }
            let available = buckets.get(&cat).map(|v| v.len()).unwrap_or(0);
            if available == 0 {
                continue;
            }
            let alloc = *allocations.get(&cat).unwrap_or(&0);
            let extra = (available - alloc).min(remaining);
            if extra == 0 {
                continue;
            }
            *allocations.entry(cat).or_insert(0) += extra;
            remaining -= extra;
        }
    }

    let mut selected: Vec<(usize, Combo)> = Vec::new();
    for &cat in &categories {
        let Some(entries) = buckets.get(&cat) else { continue };
        let take = *allocations.get(&cat).unwrap_or(&0);
        if take == 0 {
            continue;
        }
        selected.extend(weighted_sample(entries, take, weights, rng));
    }

    selected.sort_by_key(|&(idx, _)| idx);
    selected.truncate(limit);
    selected.into_iter().map(|(_, combo)| combo).collect()
}

pub fn subset_weights(weights: &HashMap<ComboKey, f64>, combos: &[Combo]) -> Option<HashMap<ComboKey, f64>> {
    if weights.is_empty() {
        return None;
    }
    let mut subset = HashMap::new();
    for &combo in combos {
        let key = normalize_combo(combo);
        let weight = weights.get(&key).copied().unwrap_or(0.0);
        if weight > 0.0 {
            subset.insert(key, weight);
        }
    }
    let total: f64 = subset.values().sum();
    if total <= 0.0 {
        return None;
    }
    let scale = 1.0 / total;
    Some(subset.into_iter().map(|(k, v)| (k, v * scale)).collect())
}

pub fn weighted_average(values: &HashMap<ComboKey, f64>, weights: Option<&HashMap<ComboKey, f64>>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let Some(weights) = weights else {
        return values.values().sum::<f64>() / values.len() as f64;
    };
    let mut total_weight = 0.0;
    let mut weighted_sum = 0.0;
    for (combo, &value) in values {
        let weight = weights.get(combo).copied().unwrap_or(0.0);
        if weight <= 0.0 {
            continue;
        }
        total_weight += weight;
        weighted_sum += weight * value;
    }
    if total_weight <= 0.0 {
        return values.values().sum::<f64>() / values.len() as f64;
    }
    weighted_sum / total_weight
}

/// Returns the top `fraction` of total weight, re-normalised to sum to 1,
/// plus how much of the original mass that slice represents.
pub fn top_weight_fraction(weights: &HashMap<ComboKey, f64>, fraction: f64) -> (Option<HashMap<ComboKey, f64>>, f64) {
    if weights.is_empty() {
        return (None, 0.0);
    }
    let fraction = fraction.clamp(0.0, 1.0);
    if fraction <= 0.0 {
        return (None, 0.0);
    }
    let mut sorted: Vec<(ComboKey, f64)> = weights.iter().map(|(&k, &v)| (k, v)).collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    let total_weight: f64 = weights.values().sum();
    if total_weight <= 0.0 {
        return (None, 0.0);
    }
    let target = total_weight * fraction;
    let mut selected = HashMap::new();
    let mut cumulative = 0.0;
    for (combo, weight) in sorted {
        if weight <= 0.0 {
            continue;
        }
        selected.insert(combo, weight);
        cumulative += weight;
        if cumulative >= target {
            break;
        }
    }
    if selected.is_empty() {
        return (None, 0.0);
    }
    let selected_total: f64 = selected.values().sum();
    if selected_total <= 0.0 {
        return (None, 0.0);
    }
    let scale = 1.0 / selected_total;
    let normalized: HashMap<ComboKey, f64> = selected.into_iter().map(|(k, v)| (k, v * scale)).collect();
    (Some(normalized), selected_total.min(1.0))
}

pub fn weighted_equity(equities: &HashMap<ComboKey, f64>, weights: Option<&HashMap<ComboKey, f64>>) -> f64 {
    if equities.is_empty() {
        return 0.0;
    }
    let Some(weights) = weights else {
        return equities.values().sum::<f64>() / equities.len() as f64;
    };
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (combo, &weight) in weights {
        if let Some(&equity) = equities.get(combo) {
            numerator += equity * weight;
            denominator += weight;
        }
    }
    if denominator <= 0.0 {
        return equities.values().sum::<f64>() / equities.len() as f64;
    }
    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::make_card;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn full_range() -> Vec<Combo> {
        crate::hand_strength::all_combos_sorted().clone()
    }

    #[test]
    fn sample_range_preserves_category_proportions_roughly() {
        let combos = full_range();
        let mut rng = StdRng::seed_from_u64(3);
        let sampled = sample_range(&combos, 150, None, &mut rng);
        assert_eq!(sampled.len(), 150);
        let pairs = sampled.iter().filter(|&&c| combo_category(c) == ComboCategory::Pair).count();
        assert!(pairs > 0);
    }

    #[test]
    fn sample_range_is_noop_under_limit() {
        let combos = vec![Combo::new(make_card(12, 0), make_card(12, 1)).unwrap()];
        let mut rng = StdRng::seed_from_u64(1);
        let sampled = sample_range(&combos, 10, None, &mut rng);
        assert_eq!(sampled.len(), 1);
    }

    #[test]
    fn top_weight_fraction_normalises_to_one() {
        let mut weights = HashMap::new();
        weights.insert((0u8, 1u8), 0.6);
        weights.insert((2u8, 3u8), 0.4);
        let (selected, _) = top_weight_fraction(&weights, 0.5);
        let selected = selected.unwrap();
        let total: f64 = selected.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_equity_falls_back_to_plain_average_without_weights() {
        let mut equities = HashMap::new();
        equities.insert((0u8, 1u8), 0.6);
        equities.insert((2u8, 3u8), 0.4);
        assert!((weighted_equity(&equities, None) - 0.5).abs() < 1e-9);
    }
}
