pub mod child;
pub mod config;
pub mod interrupt;
pub mod send;
