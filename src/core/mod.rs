pub mod engine;
pub mod export;
pub mod gateway;
pub mod listing;
pub mod router;
pub mod shape;

pub use crate::domain::model::{OutputRecord, WorkItem};
pub use crate::domain::ports::{Storage, Transport};
pub use crate::utils::error::Result;
