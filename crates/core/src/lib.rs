//! Glue crate for the inspection task-graph engine: context-carried value
//! types, Graphviz visualization, collaborator interfaces consumed (but not
//! implemented) by the engine, a process-wide task registry, and the
//! unified error type spanning the graph/resolver/runner/fetch crates.
//!
//! Nothing in this crate is on the scheduling critical path; it is the
//! layer a caller assembling a real inspection (cluster listing, log
//! fetching, form rendering) depends on in addition to the four engine
//! crates.

mod collaborators;
mod context_keys;
mod error;
mod graphviz;
mod logging;
mod registry;

pub use collaborators::{
    CallOptionInjector, ClientFactory, ClusterListFetcher, ComposerEnvironmentListFetcher,
    FactoryOption, LocationFetcher, NoOpCallOptionInjector,
};
pub use context_keys::{FormFieldHint, InspectionRunMetadata, InspectionSharedMap, InspectionTaskInput};
pub use error::Error;
pub use graphviz::dump_graphviz;
pub use logging::init_test_tracing;
pub use registry::TaskRegistry;
