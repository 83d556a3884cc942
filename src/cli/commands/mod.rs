pub mod admin;
pub mod asset;
pub mod auth;
pub mod changelog;
pub mod feature;
pub mod image;
pub mod init;
pub mod job;
pub mod owner;
pub mod property;
pub mod report;
pub mod server;
pub mod space;
pub mod transfer;
