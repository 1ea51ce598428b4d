#![doc = include_str!("../README.md")]

pub mod assembler;
pub mod batch;
pub mod classifier;
pub mod detector;
pub mod error;
pub mod ops;
pub mod parameters;
pub mod quantity;
pub mod series;
pub mod tables;
