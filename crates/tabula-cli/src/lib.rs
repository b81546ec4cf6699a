pub mod runner;
mod table;
