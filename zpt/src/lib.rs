mod app;
pub mod cli;
pub mod logging;
pub mod timer;

pub use app::App;

// Always expose testing module (integration tests need it)
pub mod testing;
