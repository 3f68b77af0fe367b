//! Common data types

pub mod scan;

pub use scan::*;
