pub mod accounts;
pub mod config;
pub mod media;
pub mod stl;
