pub mod corpus;
pub mod dataset;
pub mod snapshot;
