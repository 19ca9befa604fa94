//! Handler module declarations and re-exports

pub mod buffers;
pub mod features;
pub mod interaction;
pub mod query;
pub mod session;

pub use buffers::*;
pub use features::*;
pub use interaction::*;
pub use query::*;
pub use session::*;
