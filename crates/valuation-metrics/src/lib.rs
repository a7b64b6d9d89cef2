//! Pure metric calculators over normalized statement series and price
//! history. Not-computable outcomes are `None`, never an error, zero, or a
//! non-finite number.

pub mod coverage;
pub mod dcf;
pub mod dupont;
pub mod margins;
pub mod performance;
pub mod roic;
pub mod stats;

pub use coverage::*;
pub use dcf::*;
pub use dupont::*;
pub use margins::*;
pub use performance::*;
pub use roic::*;
