//! Process-wide feature flag overrides, read from `GTOTRAINER_FEATURES` and
//! overridable at runtime for tests via a stacked enable/disable scope.

use std::collections::HashSet;
use std::sync::Mutex;

const ENV_VAR: &str = "GTOTRAINER_FEATURES";

fn normalise(flag: &str) -> String {
    flag.trim().to_lowercase()
}

fn parse_env(raw: &str) -> HashSet<String> {
    raw.split(',').map(normalise).filter(|f| !f.is_empty()).collect()
}

struct OverrideFrame {
    enabled: HashSet<String>,
    disabled: HashSet<String>,
}

fn override_stack() -> &'static Mutex<Vec<OverrideFrame>> {
    static STACK: std::sync::OnceLock<Mutex<Vec<OverrideFrame>>> = std::sync::OnceLock::new();
    STACK.get_or_init(|| Mutex::new(Vec::new()))
}

fn current_overrides() -> (HashSet<String>, HashSet<String>) {
    let stack = override_stack().lock().unwrap();
    let mut enabled = HashSet::new();
    let mut disabled = HashSet::new();
    for frame in stack.iter() {
        enabled.extend(frame.enabled.iter().cloned());
        disabled.extend(frame.disabled.iter().cloned());
    }
    (enabled, disabled)
}

pub fn is_enabled(flag: &str) -> bool {
    let flag = normalise(flag);
    let (enabled, disabled) = current_overrides();
    if disabled.contains(&flag) {
        return false;
    }
    if enabled.contains(&flag) {
        return true;
    }
    std::env::var(ENV_VAR).map(|raw| parse_env(&raw).contains(&flag)).unwrap_or(false)
}

/// RAII guard pushing an override frame; popped when dropped.
pub struct OverrideGuard;

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        override_stack().lock().unwrap().pop();
    }
}

pub fn push_override(enable: &[&str], disable: &[&str]) -> OverrideGuard {
    let frame = OverrideFrame {
        enabled: enable.iter().map(|s| normalise(s)).collect(),
        disabled: disable.iter().map(|s| normalise(s)).collect(),
    };
    override_stack().lock().unwrap().push(frame);
    OverrideGuard
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    static TEST_LOCK: StdMutex<()> = StdMutex::new(());

    #[test]
    fn override_enable_wins_over_absence() {
        let _lock = TEST_LOCK.lock().unwrap();
        assert!(!is_enabled("benchmark_v2"));
        let _guard = push_override(&["benchmark_v2"], &[]);
        assert!(is_enabled("benchmark_v2"));
    }

    #[test]
    fn override_disable_wins_over_enable() {
        let _lock = TEST_LOCK.lock().unwrap();
        let _outer = push_override(&["foo"], &[]);
        {
            let _inner = push_override(&[], &["foo"]);
            assert!(!is_enabled("foo"));
        }
        assert!(is_enabled("foo"));
    }
}
