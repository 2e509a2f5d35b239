pub mod config;
pub mod database;
pub mod handlers;
pub mod security;
pub mod services;
pub mod utils;
