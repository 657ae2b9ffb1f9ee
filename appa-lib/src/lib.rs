pub mod codec;
pub mod command;
pub mod config;
pub mod constants;
pub mod device;
pub mod display;
pub mod error;
pub mod frame;
pub mod framer;
pub mod info;
pub mod limits;
pub mod measurement;
pub mod message;
pub mod model;
pub mod session;
pub mod sink;
pub mod storage;
pub mod transport;
pub mod wordcode;

#[cfg(test)]
mod tests;

// Re-export the main entry points for easy access
pub use device::AppaDmm;
pub use error::AppaError;
pub use session::{PollStatus, Session};
pub use transport::{SerialTransport, Transport};
