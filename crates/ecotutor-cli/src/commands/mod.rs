pub mod init;
pub mod models;
pub mod start;
pub mod validate;
