pub mod discovery;
pub mod http;
pub mod offline;
pub mod plane;
pub mod railway;
