/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
mod byte_order_reader;

pub use byte_order_reader::{ByteOrderReader, Endianness};
