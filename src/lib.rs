pub mod broker;
pub mod client;
pub mod command;
pub mod config;
pub mod consumer;
pub mod logger;
pub mod provider;
pub mod rpc;
pub mod samples;
pub mod shell;
#[cfg(test)]
pub mod tests;
pub mod types;
pub mod worker;
