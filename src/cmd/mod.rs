pub mod batch;
pub mod classify;
pub mod config;
pub mod deploy;
pub mod serve;
pub mod ticket;
pub mod tracker;
