pub mod channel;
pub mod clock;
pub mod config;
pub mod dom;
pub mod engine;
pub mod playback;
pub mod recorder;
pub mod selector;

pub use wrec_common::error;
pub use wrec_common::origin;
pub use wrec_common::protocol;
