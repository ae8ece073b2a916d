pub mod command;
pub mod kernel;
