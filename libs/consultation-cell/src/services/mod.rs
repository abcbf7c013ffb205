pub mod consultation;
pub mod reminders;

pub use consultation::*;
pub use reminders::*;
