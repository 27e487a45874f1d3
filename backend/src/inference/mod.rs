pub mod backends;
pub mod config;
pub mod pipeline;
pub mod prediction;
pub mod preprocess;
