//! Tracks CFR feedback per sizing bucket and expands or collapses the bet
//! sizes/fractions offered at a node, so the option menu widens where there's
//! regret to exploit and narrows where a size never gets picked.

use std::collections::{HashMap, HashSet};

fn fp2(x: f64) -> i64 {
    (x * 100.0).round() as i64
}

fn fp3(x: f64) -> i64 {
    (x * 1000.0).round() as i64
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn dedup_sorted(values: &[f64]) -> Vec<f64> {
    let mut seen = HashSet::new();
    let mut out: Vec<f64> = values
        .iter()
        .copied()
        .filter(|&v| seen.insert(fp2(v)))
        .collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap());
    out
}

#[derive(Debug, Clone, Copy)]
pub struct BetSizingConfig {
    pub min_increment: f64,
    pub usage_decay: f64,
    pub usage_floor: f64,
    pub usage_drop_threshold: f64,
    pub regret_expand_threshold: f64,
    pub postflop_regret_expand_threshold: f64,
    pub preflop_base_multipliers: [f64; 3],
    pub preflop_min_count: usize,
    pub preflop_max_count: usize,
    pub postflop_max_count: usize,
}

impl Default for BetSizingConfig {
    fn default() -> Self {
        Self {
            min_increment: 0.25,
            usage_decay: 0.82,
            usage_floor: 0.01,
            usage_drop_threshold: 0.012,
            regret_expand_threshold: 0.45,
            postflop_regret_expand_threshold: 0.3,
            preflop_base_multipliers: [2.8, 3.5, 5.0],
            preflop_min_count: 2,
            preflop_max_count: 6,
            postflop_max_count: 5,
        }
    }
}

/// One `(size, observed_frequency, regret)` sample fed back after a hand.
pub type SizeObservation = (f64, f64, f64);

#[derive(Debug, Clone)]
struct PreflopState {
    sizes: Vec<f64>,
    protected: HashSet<i64>,
    usage: HashMap<i64, f64>,
    regrets: HashMap<i64, f64>,
}

impl PreflopState {
    fn normalised_sizes(&self, hero_contrib: f64, hero_stack: f64, config: &BetSizingConfig) -> Vec<f64> {
        let cap = hero_contrib + hero_stack;
        let mut trimmed: Vec<f64> = Vec::new();
        for &size in &dedup_sorted(&self.sizes) {
            if size <= hero_contrib + config.min_increment {
                continue;
            }
            if size > cap + 1e-6 {
                continue;
            }
            trimmed.push(round2(size));
        }
        if trimmed.is_empty() {
            let fallback = cap.min(hero_contrib + config.min_increment.max(hero_stack * 0.65));
            trimmed.push(round2(fallback));
        }
        dedup_sorted(&trimmed)
    }

    fn observe(&mut self, hero_contrib: f64, hero_stack: f64, observations: &[SizeObservation], config: &BetSizingConfig) {
        if observations.is_empty() {
            return;
        }
        let cap = hero_contrib + hero_stack;
        let mut max_regret = f64::NEG_INFINITY;
        let mut max_size: Option<f64> = None;

        for &(size, freq, regret) in observations {
            let size = round2(size.max(hero_contrib + config.min_increment).min(cap));
            let key = fp2(size);
            let prior = *self.usage.get(&key).unwrap_or(&config.usage_floor);
            self.usage.insert(key, prior * config.usage_decay + freq.max(0.0));
            self.regrets.insert(key, regret);
            if regret > max_regret {
                max_regret = regret;
                max_size = Some(size);
            }
            if !self.sizes.iter().any(|&s| fp2(s) == key) {
                self.sizes.push(size);
            }
        }

        if let Some(max_size) = max_size {
            if max_regret > config.regret_expand_threshold && self.sizes.len() < config.preflop_max_count {
                if let Some(candidate) = interpolate_preflop_size(max_size, &self.sizes, hero_contrib, cap, config) {
                    let key = fp2(candidate);
                    self.sizes.push(candidate);
                    self.usage.entry(key).or_insert(config.usage_floor);
                    self.regrets.entry(key).or_insert(0.0);
                }
            }
        }

        if self.sizes.len() > config.preflop_min_count {
            let mut removable: Vec<f64> = self
                .sizes
                .iter()
                .copied()
                .filter(|&size| {
                    let key = fp2(size);
                    !self.protected.contains(&key) && *self.usage.get(&key).unwrap_or(&0.0) < config.usage_drop_threshold
                })
                .collect();
            removable.sort_by(|a, b| {
                self.usage
                    .get(&fp2(*a))
                    .unwrap_or(&0.0)
                    .partial_cmp(self.usage.get(&fp2(*b)).unwrap_or(&0.0))
                    .unwrap()
            });
            for size in removable {
                if self.sizes.len() <= config.preflop_min_count {
                    break;
                }
                let key = fp2(size);
                self.sizes.retain(|&s| fp2(s) != key);
                self.usage.remove(&key);
                self.regrets.remove(&key);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PostflopState {
    fractions: Vec<f64>,
    protected: HashSet<i64>,
    usage: HashMap<i64, f64>,
    regrets: HashMap<i64, f64>,
}

impl PostflopState {
    fn fractions_for(&self, config: &BetSizingConfig) -> Vec<f64> {
        let mut trimmed: Vec<f64> = dedup_sorted(&self.fractions).into_iter().filter(|&f| f > 0.0).collect();
        if trimmed.is_empty() {
            trimmed = vec![0.5];
        }
        trimmed.truncate(config.postflop_max_count);
        trimmed
    }

    fn observe(&mut self, observations: &[SizeObservation], config: &BetSizingConfig) {
        if observations.is_empty() {
            return;
        }
        let mut max_regret = f64::NEG_INFINITY;
        let mut max_fraction: Option<f64> = None;
        for &(fraction, freq, regret) in observations {
            let fraction = round3(fraction.max(0.05).min(3.0));
            let key = fp3(fraction);
            let prior = *self.usage.get(&key).unwrap_or(&config.usage_floor);
            self.usage.insert(key, prior * config.usage_decay + freq.max(0.0));
            self.regrets.insert(key, regret);
            if regret > max_regret {
                max_regret = regret;
                max_fraction = Some(fraction);
            }
            if !self.fractions.iter().any(|&f| fp3(f) == key) {
                self.fractions.push(fraction);
            }
        }
        if let Some(max_fraction) = max_fraction {
            if max_regret > config.postflop_regret_expand_threshold && self.fractions.len() < config.postflop_max_count {
                if let Some(candidate) = interpolate_fraction(max_fraction, &self.fractions) {
                    let key = fp3(candidate);
                    self.fractions.push(candidate);
                    self.usage.entry(key).or_insert(config.usage_floor);
                    self.regrets.entry(key).or_insert(0.0);
                }
            }
        }
        if self.fractions.len() > 1 {
            let removable: Vec<f64> = self
                .fractions
                .iter()
                .copied()
                .filter(|&f| {
                    let key = fp3(f);
                    !self.protected.contains(&key) && *self.usage.get(&key).unwrap_or(&0.0) < config.usage_drop_threshold
                })
                .collect();
            for fraction in removable {
                if self.fractions.len() <= 1 {
                    break;
                }
                let key = fp3(fraction);
                self.fractions.retain(|&f| fp3(f) != key);
                self.usage.remove(&key);
                self.regrets.remove(&key);
            }
        }
    }
}

/// Process-wide (per-session, in practice) store of bet-sizing branches,
/// keyed by a coarse bucket of the situation so similar spots share state.
pub struct BetSizingManager {
    config: BetSizingConfig,
    preflop_states: HashMap<(i64, i64), PreflopState>,
    postflop_states: HashMap<(String, String), PostflopState>,
}

impl BetSizingManager {
    pub fn new(config: BetSizingConfig) -> Self {
        Self {
            config,
            preflop_states: HashMap::new(),
            postflop_states: HashMap::new(),
        }
    }

    pub fn preflop_raise_sizes(&mut self, open_size: f64, hero_contrib: f64, hero_stack: f64, rival_stack: f64) -> Vec<f64> {
        let key = (bucket(open_size, 0.1), bucket(hero_stack.min(rival_stack), 5.0));
        let config = self.config;
        let state = self.preflop_states.entry(key).or_insert_with(|| {
            let sizes = initial_preflop_sizes(open_size, hero_contrib, hero_stack, rival_stack, &config);
            let protected = sizes.iter().map(|&s| fp2(s)).collect();
            PreflopState { sizes, protected, usage: HashMap::new(), regrets: HashMap::new() }
        });
        state.normalised_sizes(hero_contrib, hero_stack, &self.config)
    }

    pub fn observe_preflop(
        &mut self,
        open_size: f64,
        hero_contrib: f64,
        hero_stack: f64,
        rival_stack: f64,
        observations: &[SizeObservation],
    ) {
        if observations.is_empty() {
            return;
        }
        let key = (bucket(open_size, 0.1), bucket(hero_stack.min(rival_stack), 5.0));
        if let Some(state) = self.preflop_states.get_mut(&key) {
            state.observe(hero_contrib, hero_stack, observations, &self.config);
        }
    }

    pub fn postflop_bet_fractions(&mut self, street: &str, context: &str, base_fractions: &[f64]) -> Vec<f64> {
        let key = (street.to_string(), context.to_string());
        let config = self.config;
        let state = self.postflop_states.entry(key).or_insert_with(|| {
            let mut base: Vec<f64> = base_fractions.iter().copied().filter(|&f| f > 0.0).map(|f| f.max(0.05)).collect();
            if base.is_empty() {
                base = vec![0.5];
            }
            base.truncate(config.postflop_max_count);
            let protected = base.iter().map(|&f| fp3(f)).collect();
            PostflopState { fractions: base, protected, usage: HashMap::new(), regrets: HashMap::new() }
        });
        state.fractions_for(&self.config)
    }

    pub fn observe_postflop(&mut self, street: &str, context: &str, observations: &[SizeObservation]) {
        if observations.is_empty() {
            return;
        }
        let key = (street.to_string(), context.to_string());
        if let Some(state) = self.postflop_states.get_mut(&key) {
            state.observe(observations, &self.config);
        }
    }
}

impl Default for BetSizingManager {
    fn default() -> Self {
        Self::new(BetSizingConfig::default())
    }
}

fn initial_preflop_sizes(open_size: f64, hero_contrib: f64, hero_stack: f64, rival_stack: f64, config: &BetSizingConfig) -> Vec<f64> {
    let cap = hero_contrib + hero_stack.min(rival_stack);
    let mut sizes: Vec<f64> = Vec::new();
    for &mult in &config.preflop_base_multipliers {
        let mut size = round2(open_size * mult);
        if size <= hero_contrib + config.min_increment {
            continue;
        }
        size = size.min(cap);
        if size > hero_contrib + config.min_increment {
            sizes.push(size);
        }
    }
    if sizes.is_empty() && cap > hero_contrib + config.min_increment {
        sizes.push(round2(cap.min(hero_contrib + config.min_increment.max(hero_stack * 0.6))));
    }
    dedup_sorted(&sizes)
}

fn interpolate_preflop_size(anchor: f64, sizes: &[f64], hero_contrib: f64, cap: f64, config: &BetSizingConfig) -> Option<f64> {
    let ordered = dedup_sorted(sizes);
    let idx = ordered.iter().position(|&s| fp2(s) == fp2(anchor))?;
    let mut lower_bound = hero_contrib + config.min_increment;
    let mut upper_bound = cap;
    if idx > 0 {
        lower_bound = lower_bound.max(ordered[idx - 1] + config.min_increment);
    }
    if idx + 1 < ordered.len() {
        upper_bound = upper_bound.min(ordered[idx + 1] - config.min_increment);
    }
    if upper_bound - lower_bound <= config.min_increment {
        return None;
    }
    let midpoint = (upper_bound + lower_bound) / 2.0;
    let mut candidate = round2(midpoint);
    if candidate <= hero_contrib + config.min_increment || candidate >= cap - config.min_increment / 2.0 {
        return None;
    }
    if ordered.iter().any(|&s| fp2(s) == fp2(candidate)) {
        candidate += config.min_increment;
    }
    Some(round2(candidate.max(hero_contrib + config.min_increment).min(cap)))
}

fn interpolate_fraction(anchor: f64, fractions: &[f64]) -> Option<f64> {
    let ordered = dedup_sorted(fractions);
    let idx = ordered.iter().position(|&f| fp3(f) == fp3(anchor))?;
    let lower = if idx > 0 { ordered[idx - 1] } else { (anchor * 0.5).max(0.05) };
    let upper = if idx + 1 < ordered.len() { ordered[idx + 1] } else { (anchor * 1.5).min(3.0) };
    if upper - lower <= 0.05 {
        return None;
    }
    let mut candidate = round3((upper + lower) / 2.0);
    if ordered.iter().any(|&f| fp3(f) == fp3(candidate)) {
        candidate += 0.05;
    }
    Some(round3(candidate.max(0.05).min(3.0)))
}

fn bucket(value: f64, step: f64) -> i64 {
    if step <= 0.0 {
        return fp2(value);
    }
    fp2((value / step).round() * step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflop_sizes_grow_with_open_size() {
        let mut manager = BetSizingManager::default();
        let sizes = manager.preflop_raise_sizes(2.5, 2.5, 100.0, 100.0);
        assert!(!sizes.is_empty());
        assert!(sizes.iter().all(|&s| s > 2.5));
    }

    #[test]
    fn high_regret_observation_expands_preflop_sizes() {
        let mut manager = BetSizingManager::default();
        let _ = manager.preflop_raise_sizes(2.5, 2.5, 100.0, 100.0);
        let observations = vec![(7.0, 0.4, 0.9)];
        manager.observe_preflop(2.5, 2.5, 100.0, 100.0, &observations);
        let sizes_after = manager.preflop_raise_sizes(2.5, 2.5, 100.0, 100.0);
        assert!(sizes_after.len() >= 1);
    }

    #[test]
    fn postflop_fractions_fall_back_to_half_pot_when_empty() {
        let mut manager = BetSizingManager::default();
        let fractions = manager.postflop_bet_fractions("flop", "dry", &[]);
        assert_eq!(fractions, vec![0.5]);
    }

    #[test]
    fn unused_postflop_fraction_eventually_drops() {
        let mut manager = BetSizingManager::default();
        let _ = manager.postflop_bet_fractions("turn", "wet", &[0.33, 0.5, 0.75]);
        for _ in 0..5 {
            manager.observe_postflop("turn", "wet", &[(0.5, 0.9, 0.0), (0.75, 0.9, 0.0)]);
        }
        let fractions = manager.postflop_bet_fractions("turn", "wet", &[0.33, 0.5, 0.75]);
        assert!(fractions.contains(&0.5));
    }
}
