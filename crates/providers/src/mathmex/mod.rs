pub mod client;
pub mod config;

pub use client::MathMexClient;
pub use config::MathMexConfig;
