pub mod class_parser;
pub mod classpath;
pub mod helper;
pub mod vm;
