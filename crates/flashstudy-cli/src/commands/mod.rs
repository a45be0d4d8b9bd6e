pub mod init;
pub mod progress;
pub mod reset;
pub mod study;
pub mod subjects;
pub mod validate;
