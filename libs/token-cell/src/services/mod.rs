pub mod analytics;
pub mod geo;
pub mod token;
pub mod workflow;

pub use analytics::*;
pub use geo::*;
pub use token::*;
pub use workflow::*;
