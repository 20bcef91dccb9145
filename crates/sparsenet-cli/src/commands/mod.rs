//! CLI command implementations.

pub mod generate;
pub mod init;
pub mod inspect;
pub mod run;
pub mod theta;
