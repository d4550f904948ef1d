pub mod class;
pub mod constant_pool;
pub mod field;
pub mod method;
pub mod name_parsers;
pub mod hierarchy;
