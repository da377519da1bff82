pub mod command;
pub mod locator;
pub mod platform;
pub mod reporter;
