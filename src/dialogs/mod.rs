//! Export backends

pub mod encode;
