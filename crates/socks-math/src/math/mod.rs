//! Core math modules.

pub mod beta;
pub mod negbinom;
pub mod normalize;
pub mod stable;
