use serde::{Deserialize, Serialize};

/// Named rival behaviour profile selectable through the session API; the
/// actual fold/continue math lives in `rival_strategy`, and the postflop
/// scripted-bet tendencies it implies live in `episode_builder`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RivalStyle {
    #[default]
    Balanced,
    Aggressive,
    Passive,
}

impl RivalStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            RivalStyle::Balanced => "balanced",
            RivalStyle::Aggressive => "aggressive",
            RivalStyle::Passive => "passive",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "aggressive" => RivalStyle::Aggressive,
            "passive" => RivalStyle::Passive,
            _ => RivalStyle::Balanced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_style_name_falls_back_to_balanced() {
        assert_eq!(RivalStyle::parse("unknown"), RivalStyle::Balanced);
    }

    #[test]
    fn round_trips_through_as_str() {
        assert_eq!(RivalStyle::parse(RivalStyle::Aggressive.as_str()), RivalStyle::Aggressive);
    }
}
