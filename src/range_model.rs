//! Rival range modelling: deterministic combo ranking plus solver-calibrated
//! SB-open / BB-defend percentile tables, interpolated linearly by open size.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::cards::Card;
use crate::hand_strength::all_combos_sorted;

#[derive(Debug, Clone, Copy)]
pub struct RangeProfile {
    pub percent: f64,
}

#[derive(Debug, Clone)]
pub struct RangeTable {
    pub sb_open: Vec<(f64, RangeProfile)>,
    pub bb_defend: Vec<(f64, RangeProfile)>,
}

fn default_sb_open() -> Vec<(f64, RangeProfile)> {
    vec![
        (2.0, RangeProfile { percent: 0.90 }),
        (2.2, RangeProfile { percent: 0.87 }),
        (2.5, RangeProfile { percent: 0.82 }),
        (2.8, RangeProfile { percent: 0.75 }),
        (3.2, RangeProfile { percent: 0.68 }),
    ]
}

fn default_bb_defend() -> Vec<(f64, RangeProfile)> {
    vec![
        (2.0, RangeProfile { percent: 0.66 }),
        (2.3, RangeProfile { percent: 0.58 }),
        (2.5, RangeProfile { percent: 0.54 }),
        (2.8, RangeProfile { percent: 0.45 }),
        (3.2, RangeProfile { percent: 0.36 }),
    ]
}

fn default_table() -> RangeTable {
    RangeTable {
        sb_open: default_sb_open(),
        bb_defend: default_bb_defend(),
    }
}

#[derive(Debug, Deserialize)]
struct ConfigEntry {
    size: f64,
    percent: f64,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigSide {
    sb_open: Option<Vec<ConfigEntry>>,
    bb_defend: Option<Vec<ConfigEntry>>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    default: Option<ConfigSide>,
    stacks: Option<std::collections::HashMap<String, ConfigSide>>,
}

fn parse_entries(entries: Option<Vec<ConfigEntry>>, fallback: &[(f64, RangeProfile)]) -> Vec<(f64, RangeProfile)> {
    let Some(entries) = entries else {
        return fallback.to_vec();
    };
    let mut parsed: Vec<(f64, RangeProfile)> = entries
        .into_iter()
        .map(|e| (e.size, RangeProfile { percent: e.percent }))
        .collect();
    if parsed.is_empty() {
        return fallback.to_vec();
    }
    parsed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    parsed
}

/// Loaded once at first use: an optional `ranges/config.json` resource next to
/// the binary, falling back to the built-in defaults on any parse failure or
/// if the file is absent. A missing/malformed config is never a startup error.
fn load_range_tables() -> &'static std::collections::HashMap<String, RangeTable> {
    static TABLES: OnceLock<std::collections::HashMap<String, RangeTable>> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut tables = std::collections::HashMap::new();
        let loaded = std::fs::read_to_string("ranges/config.json")
            .ok()
            .and_then(|text| serde_json::from_str::<ConfigFile>(&text).ok());

        let Some(config) = loaded else {
            tracing::debug!("no ranges/config.json found or it failed to parse; using built-in defaults");
            tables.insert("default".to_string(), default_table());
            return tables;
        };

        let default_side = config.default.unwrap_or_default();
        let default = RangeTable {
            sb_open: parse_entries(default_side.sb_open, &default_sb_open()),
            bb_defend: parse_entries(default_side.bb_defend, &default_bb_defend()),
        };

        if let Some(stacks) = config.stacks {
            for (key, side) in stacks {
                let table = RangeTable {
                    sb_open: parse_entries(side.sb_open, &default.sb_open),
                    bb_defend: parse_entries(side.bb_defend, &default.bb_defend),
                };
                tables.insert(key, table);
            }
        }
        tables.insert("default".to_string(), default);
        tables
    })
}

fn table_for_stack(stack_depth: Option<f64>) -> RangeTable {
    let tables = load_range_tables();
    match stack_depth {
        Some(depth) if depth.is_finite() => {
            let key = depth.round().to_string();
            tables.get(&key).or_else(|| tables.get("default")).cloned_table()
        }
        _ => tables.get("default").cloned_table(),
    }
}

trait ClonedTable {
    fn cloned_table(self) -> RangeTable;
}
impl ClonedTable for Option<&RangeTable> {
    fn cloned_table(self) -> RangeTable {
        self.cloned().unwrap_or_else(default_table)
    }
}

fn interpolate_profile(value: f64, profiles: &[(f64, RangeProfile)]) -> RangeProfile {
    if profiles.is_empty() {
        return RangeProfile { percent: 0.5 };
    }
    if value <= profiles[0].0 {
        return profiles[0].1;
    }
    for window in profiles.windows(2) {
        let (lo_x, lo_prof) = window[0];
        let (hi_x, hi_prof) = window[1];
        if value <= hi_x {
            let span = hi_x - lo_x;
            if span <= 0.0 {
                return hi_prof;
            }
            let t = (value - lo_x) / span;
            return RangeProfile {
                percent: lo_prof.percent * (1.0 - t) + hi_prof.percent * t,
            };
        }
    }
    profiles[profiles.len() - 1].1
}

fn filter_blocked(combos: &[crate::cards::Combo], blocked: &[Card]) -> Vec<crate::cards::Combo> {
    combos.iter().copied().filter(|c| !c.blocks_any(blocked)).collect()
}

pub fn top_percent(percent: f64, blocked: &[Card]) -> Vec<crate::cards::Combo> {
    let all = filter_blocked(all_combos_sorted(), blocked);
    let percent = percent.clamp(0.0, 1.0);
    let count = ((all.len() as f64) * percent).round().max(1.0) as usize;
    let len = all.len();
    all.into_iter().take(count.min(len.max(1))).collect()
}

pub fn rival_sb_open_range(open_size: f64, blocked: &[Card], stack_depth: Option<f64>) -> Vec<crate::cards::Combo> {
    let table = table_for_stack(stack_depth);
    let profile = interpolate_profile(open_size, &table.sb_open);
    top_percent(profile.percent, blocked)
}

pub fn rival_bb_defend_range(open_size: f64, blocked: &[Card], stack_depth: Option<f64>) -> Vec<crate::cards::Combo> {
    let table = table_for_stack(stack_depth);
    let profile = interpolate_profile(open_size, &table.bb_defend);
    top_percent(profile.percent, blocked)
}

pub fn tighten_range(combos: &[crate::cards::Combo], fraction: f64) -> Vec<crate::cards::Combo> {
    let mut sorted = combos.to_vec();
    sorted.sort_by(|a, b| {
        crate::hand_strength::combo_playability_score(*b)
            .partial_cmp(&crate::hand_strength::combo_playability_score(*a))
            .unwrap()
    });
    let fraction = fraction.clamp(0.0, 1.0);
    let count = ((sorted.len() as f64) * fraction).round().max(1.0) as usize;
    let len = sorted.len();
    sorted.into_iter().take(count.min(len.max(1))).collect()
}

pub fn combos_without_blockers(blocked: &[Card]) -> Vec<crate::cards::Combo> {
    filter_blocked(all_combos_sorted(), blocked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sb_open_defend_share_tracks_anchors() {
        let range = rival_sb_open_range(2.5, &[], None);
        let fraction = range.len() as f64 / 1326.0;
        assert!((fraction - 0.82).abs() < 0.01);
    }

    #[test]
    fn bb_defend_share_tracks_anchors() {
        let range = rival_bb_defend_range(2.0, &[], None);
        let fraction = range.len() as f64 / 1326.0;
        assert!((fraction - 0.66).abs() < 0.01);
    }

    #[test]
    fn blocked_cards_are_excluded() {
        let blocked = [crate::cards::make_card(12, 0), crate::cards::make_card(12, 1)];
        let range = rival_sb_open_range(2.5, &blocked, None);
        assert!(range.iter().all(|c| !c.blocks_any(&blocked)));
    }

    #[test]
    fn tighten_range_returns_strongest_prefix() {
        let full = combos_without_blockers(&[]);
        let tight = tighten_range(&full, 0.1);
        assert!(tight.len() < full.len());
        let weakest_tight = crate::hand_strength::combo_playability_score(*tight.last().unwrap());
        let strongest_excluded = crate::hand_strength::combo_playability_score(full[tight.len()]);
        assert!(weakest_tight >= strongest_excluded);
    }
}
