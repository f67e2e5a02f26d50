//! Small-form counterfactual regret minimisation over the handful of actions
//! at a single betting spot. Not a general game-tree solver: it treats each
//! node's options as a one-shot matrix game between hero and rival and runs
//! vanilla regret matching until both sides' average strategies converge.

use crate::episode::{CfrValidation, Option as EngineOption};

#[derive(Debug, Clone, Copy)]
pub struct LocalCfrConfig {
    pub iterations: u32,
    pub minimum_actions: usize,
    pub extra_iterations_per_action: u32,
}

impl Default for LocalCfrConfig {
    fn default() -> Self {
        Self { iterations: 200, minimum_actions: 2, extra_iterations_per_action: 120 }
    }
}

pub struct LocalCfrBackend {
    config: LocalCfrConfig,
}

impl LocalCfrBackend {
    pub fn new(config: LocalCfrConfig) -> Self {
        Self { config }
    }

    /// Refines `options` in place: eligible rows get a CFR-adjusted `ev` and
    /// `gto_freq`, plus `cfr_*` metadata. Options that don't carry payoff
    /// metadata are left untouched.
    pub fn refine(&self, options: &mut [EngineOption]) {
        let eligible: Vec<usize> = options.iter().enumerate().filter(|(_, o)| supports_cfr(o)).map(|(i, _)| i).collect();
        if eligible.len() < self.config.minimum_actions {
            return;
        }

        let rows: Vec<&EngineOption> = eligible.iter().map(|&i| &options[i]).collect();
        let Some((matrix, rival_actions)) = extract_payoffs(&rows) else {
            return;
        };

        let num_actions = matrix.len();
        let num_rival_actions = rival_actions.len();
        let mut hero_regret = vec![0.0_f64; num_actions];
        let mut hero_strategy_sum = vec![0.0_f64; num_actions];
        let mut rival_regret = vec![0.0_f64; num_rival_actions];
        let mut rival_strategy_sum = vec![0.0_f64; num_rival_actions];

        let extra_actions = num_actions.saturating_sub(self.config.minimum_actions) as u32;
        let iterations = (self.config.iterations + extra_actions * self.config.extra_iterations_per_action).max(1);

        for _ in 0..iterations {
            let hero_strategy = regret_matching(&hero_regret);
            let rival_strategy = regret_matching(&rival_regret);

            for i in 0..num_actions {
                hero_strategy_sum[i] += hero_strategy[i];
            }
            for j in 0..num_rival_actions {
                rival_strategy_sum[j] += rival_strategy[j];
            }

            let hero_util = mat_vec(&matrix, &rival_strategy);
            let hero_expected = dot(&hero_strategy, &hero_util);
            for i in 0..num_actions {
                hero_regret[i] += hero_util[i] - hero_expected;
            }

            let rival_payoff = neg_transpose_vec(&matrix, &hero_strategy);
            let rival_expected = dot(&rival_strategy, &rival_payoff);
            for j in 0..num_rival_actions {
                rival_regret[j] += rival_payoff[j] - rival_expected;
            }
        }

        let hero_avg = normalise_strategy(&hero_strategy_sum);
        let rival_avg = normalise_strategy(&rival_strategy_sum);
        let adjusted_values = mat_vec(&matrix, &rival_avg);
        let rival_payoff = neg_transpose_vec(&matrix, &hero_avg);

        let hero_best_response = adjusted_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let hero_expected = dot(&hero_avg, &adjusted_values);
        let hero_exploitability = (hero_best_response - hero_expected).max(0.0);

        let rival_best_response = rival_payoff.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let rival_expected = dot(&rival_avg, &rival_payoff);
        let rival_exploitability = (rival_best_response - rival_expected).max(0.0);

        // `rival_payoff` is always `-matrix^T`, so this matrix is zero-sum by
        // construction; the field stays in place for a future backend that
        // solves asymmetric payoffs directly.
        let validation =
            CfrValidation { hero_exploitability, rival_exploitability, zero_sum_deviation: 0.0, flags: Vec::new() };

        for (row, &opt_idx) in eligible.iter().enumerate() {
            let option = &mut options[opt_idx];
            if option.meta.baseline_ev.is_none() {
                option.meta.baseline_ev = Some(option.ev);
            }
            option.meta.cfr_backend = Some("local_cfr_v1".to_string());
            option.meta.cfr_probability = Some(hero_avg[row]);
            option.meta.cfr_rival_mix = rival_actions
                .iter()
                .cloned()
                .zip(rival_avg.iter().copied())
                .collect();
            option.meta.cfr_iterations = Some(iterations);
            option.meta.cfr_regret = Some(hero_regret[row]);
            option.meta.cfr_avg_ev = Some(adjusted_values[row]);
            option.meta.cfr_validation = Some(validation.clone());
            option.gto_freq = Some(hero_avg[row]);
            option.ev = adjusted_values[row];
        }
    }
}

impl Default for LocalCfrBackend {
    fn default() -> Self {
        Self::new(LocalCfrConfig::default())
    }
}

fn supports_cfr(option: &EngineOption) -> bool {
    if !option.meta.supports_cfr {
        return false;
    }
    option.meta.cfr_payoffs.is_some() || (option.meta.hero_ev_fold.is_some() && option.meta.hero_ev_continue.is_some())
}

fn extract_payoffs(options: &[&EngineOption]) -> Option<(Vec<Vec<f64>>, Vec<String>)> {
    let mut rows_info: Vec<(Vec<String>, Vec<f64>)> = Vec::new();
    let mut labels_order: Vec<String> = Vec::new();

    for option in options {
        let (labels, hero_row) = if let Some(payoffs) = &option.meta.cfr_payoffs {
            (payoffs.rival_actions.clone(), payoffs.hero.clone())
        } else {
            let fold_ev = option.meta.hero_ev_fold?;
            let continue_ev = option.meta.hero_ev_continue?;
            if !fold_ev.is_finite() || !continue_ev.is_finite() {
                return None;
            }
            (vec!["fold".to_string(), "continue".to_string()], vec![fold_ev, continue_ev])
        };
        if hero_row.iter().any(|v| !v.is_finite()) {
            return None;
        }
        for label in &labels {
            if !labels_order.contains(label) {
                labels_order.push(label.clone());
            }
        }
        rows_info.push((labels, hero_row));
    }

    if rows_info.is_empty() {
        return None;
    }

    if let Some(pos) = labels_order.iter().position(|l| l == "fold") {
        let fold = labels_order.remove(pos);
        labels_order.insert(0, fold);
    }

    let mut matrix = Vec::with_capacity(rows_info.len());
    for (labels, hero_values) in rows_info {
        let value_map: std::collections::HashMap<&str, f64> =
            labels.iter().map(|s| s.as_str()).zip(hero_values.iter().copied()).collect();
        let mut row = Vec::with_capacity(labels_order.len());
        for label in &labels_order {
            let value = if let Some(&v) = value_map.get(label.as_str()) {
                v
            } else if label == "jam" {
                *value_map.get("call").unwrap_or(value_map.get("fold").unwrap_or(&0.0))
            } else if label == "continue" {
                *value_map.get("call").unwrap_or(value_map.get("fold").unwrap_or(&0.0))
            } else {
                *value_map.get("fold").unwrap_or(&0.0)
            };
            row.push(value);
        }
        matrix.push(row);
    }

    Some((matrix, labels_order))
}

fn regret_matching(regrets: &[f64]) -> Vec<f64> {
    let positives: Vec<f64> = regrets.iter().map(|&r| r.max(0.0)).collect();
    let total: f64 = positives.iter().sum();
    if total <= 1e-12 {
        return vec![1.0 / positives.len() as f64; positives.len()];
    }
    positives.iter().map(|&p| p / total).collect()
}

fn normalise_strategy(strategy_sum: &[f64]) -> Vec<f64> {
    let total: f64 = strategy_sum.iter().sum();
    if total <= 1e-12 {
        return vec![1.0 / strategy_sum.len() as f64; strategy_sum.len()];
    }
    strategy_sum.iter().map(|&s| s / total).collect()
}

fn mat_vec(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix.iter().map(|row| dot(row, vector)).collect()
}

fn neg_transpose_vec(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    let cols = matrix[0].len();
    (0..cols)
        .map(|j| -matrix.iter().zip(vector.iter()).map(|(row, &v)| row[j] * v).sum::<f64>())
        .collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::OptionMeta;

    fn option(key: &str, fold_ev: f64, continue_ev: f64) -> EngineOption {
        let mut meta = OptionMeta::default();
        meta.supports_cfr = true;
        meta.hero_ev_fold = Some(fold_ev);
        meta.hero_ev_continue = Some(continue_ev);
        EngineOption {
            key: key.to_string(),
            ev: continue_ev,
            why: String::new(),
            gto_freq: None,
            ends_hand: false,
            meta,
            resolution_note: None,
        }
    }

    #[test]
    fn refine_leaves_fewer_than_minimum_actions_untouched() {
        let mut options = vec![option("fold", 0.0, 1.0)];
        let backend = LocalCfrBackend::default();
        backend.refine(&mut options);
        assert!(options[0].meta.cfr_backend.is_none());
    }

    #[test]
    fn refine_assigns_frequencies_summing_to_one() {
        let mut options = vec![option("call", -1.0, 2.0), option("raise", -1.0, 3.0)];
        let backend = LocalCfrBackend::default();
        backend.refine(&mut options);
        let total: f64 = options.iter().filter_map(|o| o.gto_freq).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn refine_sets_baseline_ev_once() {
        let mut options = vec![option("call", -1.0, 2.0), option("raise", -1.0, 3.0)];
        options[0].meta.baseline_ev = Some(5.0);
        let backend = LocalCfrBackend::default();
        backend.refine(&mut options);
        assert_eq!(options[0].meta.baseline_ev, Some(5.0));
        assert_eq!(options[1].meta.baseline_ev, Some(3.0));
    }
}
