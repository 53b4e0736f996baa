//! Monitor wire protocol

pub mod command;
pub mod message;

pub use command::{MonitorCommand, SUBSCRIBE_PREFIX};
pub use message::{encode, MonitorMessage};
