//! Various utilities

pub mod format;

pub(crate) mod string;
