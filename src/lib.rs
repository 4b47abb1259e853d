// Arbitrates timed matches between two UCI engines that sit behind line-oriented consoles.

pub mod arbiter;
pub mod core;
pub mod engine;
pub mod error;
pub mod link;
pub mod rules;

#[cfg(test)]
mod tests;
