/// Upstream clients, one file per source, sharing the bounded fetcher.

pub mod fetch;
pub mod narvesen;
pub mod ngu;
pub mod nve;

#[cfg(test)]
mod fixtures;
