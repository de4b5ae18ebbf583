//! Infragraph core: resource model, infrastructure graph and error types

pub mod error;
pub mod graph;
pub mod lookup;
pub mod model;
pub mod options;


pub use error::{Error, Result};
pub use graph::Graph;
pub use lookup::LookupTable;
pub use model::{
    EXTERNAL_PREFIX, Edge, EdgeId, EdgeView, InstanceKey, Node, NodeId, ResolvedConfig, Resource,
    ResourceRef, Role, qualify,
};
pub use options::Options;
