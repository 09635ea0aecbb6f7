pub mod config;
pub mod feed;
pub mod history;
pub mod http_client;
pub mod matcher;
pub mod persist;
pub mod picks_fetch;
pub mod state;
