pub mod object;
pub mod string;
