pub mod api;
pub mod embed;
pub mod error;
pub mod fallback;
pub mod health;
pub mod widget;
