mod query;
mod tags;

pub use query::{Fetched, QueryCache, QueryKey, QueryState, QueryStatus, Subscription};
pub use tags::{
    EndpointDecl, EndpointKind, ResourceKind, Tag, TagGraph, TagGraphViolation, TagTemplate,
};
