pub mod health;
pub mod premium;
pub mod project;

pub use health::*;
pub use premium::*;
pub use project::*;
