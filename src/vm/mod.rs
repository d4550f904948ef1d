pub mod vm;
pub mod thread;
pub mod class;
pub mod object;
pub mod instructions;
pub mod class_loader;
pub mod pool;
pub mod error;
pub mod exception;
pub mod interpreter;

#[cfg(test)]
pub mod testing;
