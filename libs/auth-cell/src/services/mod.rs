pub mod account;
pub mod otp;
pub mod password;

pub use account::*;
pub use otp::*;
pub use password::*;
