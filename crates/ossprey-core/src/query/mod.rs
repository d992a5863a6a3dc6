pub mod guards;
pub mod heuristics;
pub mod intent;
pub mod planner;
pub mod rerank;
pub mod router;
pub mod rules;
pub mod tabular;
pub mod tokenizer;
pub mod vectors;
