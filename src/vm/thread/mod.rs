pub mod slot;
pub mod frame;
pub mod thread;
