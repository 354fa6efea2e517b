pub mod catalog;
pub mod config;
pub mod constants;
pub mod deeplink;
pub mod geo;
pub mod selection;
pub mod viewport;
