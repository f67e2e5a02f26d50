pub mod benchmark;
pub mod bet_sizing;
pub mod cards;
pub mod cfr;
pub mod concurrency;
pub mod episode;
pub mod episode_builder;
pub mod equity;
pub mod error;
pub mod feature_flags;
pub mod hand_state;
pub mod hand_strength;
pub mod lru_cache;
pub mod option_generator;
pub mod preflop_mix;
pub mod range_model;
pub mod range_sampling;
pub mod resolve;
pub mod rival;
pub mod rival_strategy;
pub mod scoring;
pub mod seating;
pub mod session;
pub mod trainer;
pub mod web;

pub use error::{EngineError, EngineResult};
pub use rival::RivalStyle;
pub use trainer::{ActionChoice, Trainer, TrainerConfig};
