pub mod heuristic;
pub mod llm;

pub use heuristic::HeuristicScorer;
pub use llm::LlmScorer;
