use std::io::{self, Write};

use anyhow::{anyhow, Result};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cards::cards_notation_upper;
use crate::episode::Option as EngineOption;
use crate::rival::RivalStyle;
use crate::scoring::SummaryStats;
use crate::session::{NodeOutcome, NodeView, SessionConfig, SessionManager};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub hands: u32,
    pub mc_samples: u32,
    pub seed: Option<u64>,
    #[serde(default)]
    pub rival_style: RivalStyle,
    #[serde(default)]
    pub no_color: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self { hands: 1, mc_samples: 200, seed: None, rival_style: RivalStyle::Balanced, no_color: false }
    }
}

/// One CLI action pick, kept for callers that want to replay a chosen line.
#[derive(Debug, Clone)]
pub struct ActionChoice {
    pub key: String,
    pub chosen_ev_bb: f64,
}

pub struct Trainer {
    config: TrainerConfig,
    manager: SessionManager,
    session_id: Uuid,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        let manager = SessionManager::new();
        let session_id = manager.create_session(SessionConfig {
            hands: config.hands,
            mc_trials: config.mc_samples,
            seed: config.seed,
            rival_style: config.rival_style,
        });
        Self { config, manager, session_id }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut input = String::new();

        loop {
            let outcome = self.manager.get_node(self.session_id).map_err(|e| anyhow!(e.to_string()))?;
            let node = match outcome {
                NodeOutcome::Done(summary) => {
                    self.print_summary(&summary);
                    break;
                }
                NodeOutcome::Node(node) => node,
            };

            self.print_node(&node);

            if node.options.is_empty() {
                break;
            }

            loop {
                input.clear();
                print!("Select action [1-{}] (h=help, q=quit): ", node.options.len());
                io::stdout().flush()?;
                io::stdin().read_line(&mut input)?;
                let trimmed = input.trim().to_lowercase();

                if trimmed == "q" {
                    return Ok(());
                }

                if trimmed == "h" {
                    self.print_help(&node);
                    continue;
                }

                match trimmed.parse::<usize>() {
                    Ok(index) if (1..=node.options.len()).contains(&index) => {
                        self.manager.choose(self.session_id, index - 1).map_err(|e| anyhow!(e.to_string()))?;
                        break;
                    }
                    _ => println!("Invalid selection. Try again or press 'h' for help."),
                }
            }
        }

        Ok(())
    }

    pub fn summary(&self) -> Result<SummaryStats> {
        self.manager.summary(self.session_id).map_err(|e| anyhow!(e.to_string()))
    }

    fn print_node(&self, node: &NodeView) {
        let hero_cards = cards_notation_upper(&node.hero_cards).join(" ");
        let board = if node.board_cards.is_empty() {
            "--".to_string()
        } else {
            cards_notation_upper(&node.board_cards).join(" ")
        };

        let option_line = node
            .options
            .iter()
            .enumerate()
            .map(|(idx, opt)| format!("{}. {} ({:.2}bb)", idx + 1, opt.key, opt.ev))
            .collect::<Vec<_>>()
            .join(", ");

        if self.config.no_color {
            println!(
                "Hand {} | Hero {} | Board {} | Pot {:.1}bb | Options: {}",
                node.hand_no, hero_cards, board, node.pot_bb, option_line
            );
        } else {
            println!(
                "{} {} {} {} {} {} {} {:.1}bb {} {}",
                "Hand".bold().cyan(),
                node.hand_no,
                "Hero".bold().white(),
                hero_cards.bold().yellow(),
                "Board".bold().white(),
                board.bold().blue(),
                "Pot".bold().white(),
                node.pot_bb,
                "Options".bold().yellow(),
                option_line
            );
        }
    }

    pub fn print_summary(&self, summary: &SummaryStats) {
        if self.config.no_color {
            println!("Summary: hands={}, score={:.1}%, EV loss={:.2}bb", summary.hands, summary.score, summary.ev_lost);
        } else {
            println!(
                "{} {} {} {:.1}% {} {:.2}bb",
                "Summary".bold().magenta(),
                summary.hands,
                "Score".bold().white(),
                summary.score,
                "EV loss".bold().white(),
                summary.ev_lost
            );
        }
    }

    fn print_help(&self, node: &NodeView) {
        println!("Available actions for hand {}:", node.hand_no);
        for (idx, option) in node.options.iter().enumerate() {
            println!("  {}. {} ({:.2}bb) - {}", idx + 1, option.key, option.ev, option.why);
        }
        println!("Press the number of your choice, 'h' to view this help, or 'q' to quit.");
    }

    pub fn autoplay_best(&mut self) -> Result<SummaryStats> {
        loop {
            let outcome = self.manager.get_node(self.session_id).map_err(|e| anyhow!(e.to_string()))?;
            let node = match outcome {
                NodeOutcome::Done(summary) => return Ok(summary),
                NodeOutcome::Node(node) => node,
            };
            let best_index = best_index(&node.options);
            self.manager.choose(self.session_id, best_index).map_err(|e| anyhow!(e.to_string()))?;
        }
    }
}

fn best_index(options: &[EngineOption]) -> usize {
    options
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.ev.partial_cmp(&b.ev).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
