//! Controller implementations

mod mock;

pub use mock::{ControllerCall, MockController};
