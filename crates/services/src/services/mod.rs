pub mod activity;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod email;
pub mod error;
pub mod notification;
pub mod share;
pub mod todo;
pub mod validation;
