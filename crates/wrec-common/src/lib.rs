pub mod error;
pub mod origin;
pub mod protocol;
