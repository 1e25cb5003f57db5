pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
#[cfg(test)]
pub(crate) mod test_support;
pub mod tools;
pub mod types;
pub mod ui;
pub mod util;
