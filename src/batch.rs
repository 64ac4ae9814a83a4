pub mod discover;
pub mod report;
pub mod runner;
