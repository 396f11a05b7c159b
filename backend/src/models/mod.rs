pub mod dataset;
pub mod filter;
pub mod macros;
pub mod record;

pub use dataset::*;
pub use filter::*;
pub use record::*;
