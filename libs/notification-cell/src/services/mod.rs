pub mod sms;
pub mod queue;
pub mod worker;

pub use sms::*;
pub use queue::*;
pub use worker::*;
