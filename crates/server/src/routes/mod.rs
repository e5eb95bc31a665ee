pub mod activities;
pub mod auth;
pub mod categories;
pub mod cron;
pub mod health;
pub mod shares;
pub mod subtasks;
pub mod tags;
pub mod todos;
pub mod trash;
