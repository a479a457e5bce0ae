// citewatch - Google Scholar citation tracker
// Author: kelexine (https://github.com/kelexine)

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod settings;
pub mod storage;
pub mod transport;
pub mod utils;
