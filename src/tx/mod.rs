//! Transaction Module
//!
//! Raw transaction codec, per-input signing material comparison, and the
//! selective single-input signing guard built on top of them.

mod codec;
mod selective;
mod witness;

pub use codec::*;
pub use selective::*;
pub use witness::*;
