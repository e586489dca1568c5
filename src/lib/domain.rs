//! Domain types and capability traits

pub mod communication;
