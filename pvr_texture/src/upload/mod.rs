/// Upload module - backend trait, upload driver and mock backend

pub mod backend;
pub mod driver;
pub mod mock_backend;

pub use backend::*;
pub use driver::*;
pub use mock_backend::{MockBackend, MockEvent, MockFaults, MockTexture};
