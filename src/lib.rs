pub mod chat;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod github;
pub mod http;
pub mod notify;
pub mod repos;
pub mod runtime;
pub mod session;
