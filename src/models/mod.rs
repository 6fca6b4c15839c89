pub mod decision;
pub mod network;
pub mod project;
pub mod receipt;
pub mod response;
pub mod verification;

pub use decision::*;
pub use network::*;
pub use project::*;
pub use receipt::*;
pub use response::*;
pub use verification::*;
