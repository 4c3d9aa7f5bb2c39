pub mod batch;
pub mod classification;
pub mod event;
pub mod ticket;
