//! Request handlers.

pub mod health;
pub mod jobs;
pub mod reexport;
pub mod upload;

pub use health::*;
pub use jobs::*;
pub use reexport::*;
pub use upload::*;
