pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;

#[cfg(test)]
pub mod testing;
