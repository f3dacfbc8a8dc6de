// Identity module - account and token addresses

mod address;

pub use address::*;
