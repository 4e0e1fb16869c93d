pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod service;
pub mod utils;
