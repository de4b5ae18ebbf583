//! Graph generation: raw construction, chain contraction, external exposure

pub mod builder;
pub mod cleaner;
pub mod external;
pub mod generate;


pub use builder::{GraphBuilder, RawGraph};
pub use cleaner::{clean, contract};
pub use external::synthesize;
pub use generate::{from_hcl, from_hcl_path, from_state, generate};
