pub mod controller;
pub mod state;

pub use controller::{LiveController, LiveSnapshot};
pub use state::{LiveState, LiveStatus};
