//! Converts a chosen-vs-best EV gap into a human-facing score/accuracy, and
//! aggregates per-decision records into a session summary. Tuned so small
//! EV losses (within the noise floor for the pot size) don't read as mistakes.

use crate::episode::Record;

const RATIO_NOISE_FLOOR_BASE: f64 = 0.003;
const RATIO_NOISE_FLOOR_PCT: f64 = 0.00075;
const RATIO_DECAY: f64 = 20.0;
const EV_NOISE_FLOOR_BASE: f64 = 0.02;
const EV_NOISE_FLOOR_PCT: f64 = 0.0025;
const EV_DECAY: f64 = 2.0;
const YELLOW_POT_MULTIPLIER: f64 = 0.05;
const YELLOW_FALLBACK: f64 = 0.35;
const MIN_YELLOW_BAND: f64 = 0.08;
const YELLOW_GAMMA: f64 = 0.75;
const RED_DECAY: f64 = 18.0;
const HARD_MISTAKE_RATIO: f64 = 0.5;
const NOISE_EPSILON: f64 = 1e-9;
const MIN_POT: f64 = 1e-6;

/// `_extract_pot`: the pot a decision's EV gap is weighed against. Prefers
/// the node's actual pot, falling back to the EV room between best and
/// worst, then the bigger of the two EVs' magnitudes, then a flat 1.0bb.
fn extract_pot(record: &Record) -> f64 {
    if record.pot_bb > MIN_POT {
        return record.pot_bb;
    }
    if record.room_ev > MIN_POT {
        return record.room_ev;
    }
    let fallback = record.best_ev.abs().max(record.chosen_ev.abs());
    if fallback > MIN_POT {
        fallback
    } else {
        1.0
    }
}

fn ev_noise_floor(pot: f64) -> f64 {
    EV_NOISE_FLOOR_BASE + EV_NOISE_FLOOR_PCT * pot
}

fn ratio_noise_floor(pot: f64) -> f64 {
    (RATIO_NOISE_FLOOR_BASE + RATIO_NOISE_FLOOR_PCT * pot).min(0.99)
}

fn score_for(value: f64, noise_floor: f64, decay: f64) -> f64 {
    let score = 100.0 * (-decay * (value - noise_floor).max(0.0)).exp();
    score.clamp(0.0, 100.0)
}

/// `max(0, best - chosen) / pot`, clamped so a near-zero pot doesn't blow up.
pub fn decision_loss_ratio(best_ev: f64, chosen_ev: f64, pot: f64) -> f64 {
    let pot = pot.max(1e-6);
    ((best_ev - chosen_ev).max(0.0)) / pot
}

/// The tighter of an EV-based and a ratio-based exponential-decay score.
pub fn decision_score(best_ev: f64, chosen_ev: f64, pot: f64) -> f64 {
    let ev_loss = (best_ev - chosen_ev).max(0.0);
    let ratio = decision_loss_ratio(best_ev, chosen_ev, pot);
    let score_ev = score_for(ev_loss, ev_noise_floor(pot), EV_DECAY);
    let score_ratio = score_for(ratio, ratio_noise_floor(pot), RATIO_DECAY);
    score_ev.min(score_ratio)
}

fn within_noise(ev_loss: f64, ratio: f64, pot: f64) -> bool {
    ev_loss <= ev_noise_floor(pot) + NOISE_EPSILON || ratio <= ratio_noise_floor(pot) + NOISE_EPSILON
}

fn ev_band_credit(ev_loss: f64, pot: f64) -> f64 {
    let noise_floor = ev_noise_floor(pot);
    if ev_loss <= noise_floor {
        return 1.0;
    }
    let yellow_width = (YELLOW_POT_MULTIPLIER * pot).max(YELLOW_FALLBACK).max(MIN_YELLOW_BAND);
    let yellow_end = noise_floor + yellow_width;
    if ev_loss <= yellow_end {
        let t = ((ev_loss - noise_floor) / yellow_width).clamp(0.0, 1.0);
        return 1.0 - 0.5 * t.powf(YELLOW_GAMMA);
    }
    let ratio = (ev_loss - yellow_end) / pot.max(1e-6);
    if ratio >= HARD_MISTAKE_RATIO {
        return 0.0;
    }
    0.5 * (-RED_DECAY * ratio).exp()
}

/// `1.0` when within noise of optimal, otherwise a smooth credit curve that
/// reaches 0 once the loss is a hard mistake relative to the pot.
pub fn decision_accuracy(same_key: bool, best_ev: f64, chosen_ev: f64, pot: f64) -> f64 {
    if same_key {
        return 1.0;
    }
    let ev_loss = (best_ev - chosen_ev).max(0.0);
    let ratio = decision_loss_ratio(best_ev, chosen_ev, pot);
    if within_noise(ev_loss, ratio, pot) {
        return 1.0;
    }
    ev_band_credit(ev_loss, pot)
}

/// `effective_option_ev`/`effective_ev`: clamp EV up to a known baseline so a
/// CFR-refined EV can never read worse than the engine's own floor for it.
pub fn effective_ev(raw_ev: f64, baseline: Option<f64>) -> f64 {
    match baseline {
        Some(baseline) if baseline.is_finite() => raw_ev.max(baseline),
        _ => raw_ev,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryStats {
    pub hands: usize,
    pub decisions: usize,
    pub hits: f64,
    pub ev_lost: f64,
    pub score: f64,
}

/// Pot-weighted aggregation across a session's decisions.
pub fn summarize_records(records: &[Record]) -> SummaryStats {
    if records.is_empty() {
        return SummaryStats::default();
    }
    let hand_ids: std::collections::HashSet<usize> = records.iter().map(|r| r.hand_index).collect();
    let mut total_weight = 0.0;
    let mut weighted_hits = 0.0;
    let mut weighted_score = 0.0;
    let mut ev_lost = 0.0;

    for record in records {
        let pot = extract_pot(record);
        let weight = pot;
        total_weight += weight;
        let accuracy = decision_accuracy(record.chosen_key == record.best_key, record.best_ev, record.chosen_ev, pot);
        weighted_hits += accuracy * weight;
        weighted_score += decision_score(record.best_ev, record.chosen_ev, pot) * weight;
        ev_lost += record.ev_loss;
    }

    let total_weight = total_weight.max(1e-9);
    SummaryStats {
        hands: hand_ids.len(),
        decisions: records.len(),
        hits: weighted_hits / total_weight,
        ev_lost,
        score: weighted_score / total_weight,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvConservationReport {
    pub delta: f64,
    pub within_tolerance: bool,
}

/// Checks that `sum(best) - sum(chosen) == sum(ev_lost)` once both sides are
/// optionally clamped against their own baseline EV. The record writer only
/// ever clamps `best_ev`; this diagnostic clamps both sides independently so
/// it can flag drift the writer's narrower rule wouldn't catch.
pub fn ev_conservation_diagnostics(
    records: &[Record],
    best_baseline_ev: Option<&[f64]>,
    chosen_baseline_ev: Option<&[f64]>,
) -> EvConservationReport {
    let mut total_best = 0.0;
    let mut total_chosen = 0.0;
    let mut total_ev_lost = 0.0;
    for (i, record) in records.iter().enumerate() {
        let best = match best_baseline_ev.and_then(|b| b.get(i)) {
            Some(&baseline) => effective_ev(record.best_ev, Some(baseline)),
            None => record.best_ev,
        };
        let chosen = match chosen_baseline_ev.and_then(|b| b.get(i)) {
            Some(&baseline) => effective_ev(record.chosen_ev, Some(baseline)),
            None => record.chosen_ev,
        };
        total_best += best;
        total_chosen += chosen;
        total_ev_lost += record.ev_loss;
    }
    let delta = (total_best - total_chosen) - total_ev_lost;
    EvConservationReport { delta, within_tolerance: delta.abs() < 1e-6 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::Street;

    #[test]
    fn exact_match_scores_one_hundred() {
        assert_eq!(decision_score(5.0, 5.0, 10.0), 100.0);
    }

    #[test]
    fn small_loss_within_noise_is_full_accuracy() {
        assert_eq!(decision_accuracy(false, 5.0, 4.999, 10.0), 1.0);
    }

    #[test]
    fn hard_mistake_scores_near_zero_accuracy() {
        let accuracy = decision_accuracy(false, 10.0, -10.0, 5.0);
        assert!(accuracy < 0.05);
    }

    #[test]
    fn effective_ev_clamps_to_baseline() {
        assert_eq!(effective_ev(1.0, Some(2.0)), 2.0);
        assert_eq!(effective_ev(3.0, Some(2.0)), 3.0);
        assert_eq!(effective_ev(3.0, None), 3.0);
    }

    fn record(hand_index: usize, best_ev: f64, chosen_ev: f64) -> Record {
        Record {
            street: Street::River,
            pot_bb: 0.0,
            chosen_key: "call".to_string(),
            chosen_ev,
            best_key: "raise".to_string(),
            best_ev,
            worst_ev: chosen_ev.min(best_ev) - 1.0,
            room_ev: (best_ev - chosen_ev).max(1e-9),
            ev_loss: (best_ev - chosen_ev).max(0.0),
            hand_ended: false,
            resolution_note: None,
            hand_index,
        }
    }

    #[test]
    fn extract_pot_prefers_pot_bb_then_room_ev_then_ev_magnitude() {
        let mut r = record(0, 5.0, 4.0);
        r.pot_bb = 12.0;
        assert_eq!(extract_pot(&r), 12.0);
        r.pot_bb = 0.0;
        assert_eq!(extract_pot(&r), r.room_ev);
        r.pot_bb = 0.0;
        r.room_ev = 0.0;
        assert_eq!(extract_pot(&r), r.best_ev.abs().max(r.chosen_ev.abs()));
        r.best_ev = 0.0;
        r.chosen_ev = 0.0;
        assert_eq!(extract_pot(&r), 1.0);
    }

    #[test]
    fn summarize_counts_distinct_hands() {
        let records = vec![record(0, 5.0, 5.0), record(0, 4.0, 4.0), record(1, 3.0, 3.0)];
        let summary = summarize_records(&records);
        assert_eq!(summary.hands, 2);
        assert_eq!(summary.decisions, 3);
        assert!(summary.hits > 0.99);
    }

    #[test]
    fn ev_conservation_holds_without_baselines() {
        let records = vec![record(0, 5.0, 3.0)];
        let report = ev_conservation_diagnostics(&records, None, None);
        assert!(report.within_tolerance);
    }
}
