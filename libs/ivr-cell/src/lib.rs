pub mod error;
pub mod handlers;
pub mod menus;
pub mod models;
pub mod router;
pub mod services;
pub mod twiml;

pub use error::*;
pub use models::*;
pub use router::*;
pub use services::*;
pub use twiml::*;
