pub mod activity;
pub mod category;
pub mod shared_todo;
pub mod subtask;
pub mod tag;
pub mod todo;
pub mod todo_tag;
pub mod user;
