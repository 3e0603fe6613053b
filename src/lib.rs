pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod mail;
pub mod middleware;
pub mod services;
pub mod state;

pub use app::app;

#[cfg(test)]
pub mod testing;
