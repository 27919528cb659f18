pub mod api;
pub mod config;
pub mod console;
pub mod error;
pub mod form;
pub mod models;
pub mod notify;
pub mod page;
pub mod render;
pub mod sync;
pub mod view;
