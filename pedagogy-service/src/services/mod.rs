pub mod analysis;
pub mod export;
pub mod generation;
pub mod history;
pub mod metrics;
pub mod prompts;
pub mod providers;
