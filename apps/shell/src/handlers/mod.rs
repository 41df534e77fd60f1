pub mod demo;
pub mod stress;
