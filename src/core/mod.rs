pub mod accumulator;
pub mod progress;
pub mod scanner;
pub mod sorter;
