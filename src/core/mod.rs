pub mod config;
pub mod credentials;
pub mod models;
pub mod obfuscation;
pub mod storage;
