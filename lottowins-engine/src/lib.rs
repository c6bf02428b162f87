pub mod analysis;
pub mod config;
pub mod quick_pick;
pub mod report;
pub mod sampler;
pub mod scoring;
pub mod ticket;
