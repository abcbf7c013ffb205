pub mod availability;
pub mod directory;
pub mod staff;

pub use availability::*;
pub use directory::*;
pub use staff::*;
