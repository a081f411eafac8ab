pub mod audit;
pub mod config;
pub mod heuristic;
pub mod history;
pub mod orchestrator;
pub mod paths;
pub mod remote;
pub mod storage;
pub mod summary;
pub mod text_metrics;
pub mod util;
pub mod warn;
