pub mod backfill;
pub mod config;
pub mod error;
pub mod markdown;
pub mod model;
pub mod notion;
pub mod openai;
pub mod scheduler;
pub mod scripting;
pub mod store;
pub mod thumbnail;
pub mod youtube;

#[cfg(test)]
mod testutil;
