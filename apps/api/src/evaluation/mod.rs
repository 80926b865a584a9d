pub mod batch;
pub mod handlers;
pub mod keyword;
pub mod orchestrator;
pub mod recommendation;
pub mod scoring;
pub mod versioning;
