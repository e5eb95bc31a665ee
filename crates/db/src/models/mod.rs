#![allow(clippy::useless_conversion)]

pub mod activity;
pub mod category;
pub mod ids;
pub mod shared_todo;
pub mod subtask;
pub mod tag;
pub mod todo;
pub mod user;
