pub mod deal;
pub mod notification;
pub mod ports;
pub mod user;
