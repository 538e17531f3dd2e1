//! Collaborator interfaces the engine consumes but never implements:
//! concrete cloud SDK calls, client construction, and per-request auth
//! injection are all out of scope here — only the shapes leaf tasks are
//! written against.

use crate::error::Error;
use async_trait::async_trait;
use inspect_log_fetch::ResourceContainer;
use inspect_task_model::TaskContext;

/// Lists cluster names visible to a project. Consumed by leaf tasks that
/// populate a cluster-selection form field; not part of the engine itself.
#[async_trait]
pub trait ClusterListFetcher: Send + Sync {
    /// List cluster names for `project_id`.
    async fn list(&self, ctx: &TaskContext, project_id: &str) -> Result<Vec<String>, Error>;
}

/// Lists the cloud regions available to a project.
#[async_trait]
pub trait LocationFetcher: Send + Sync {
    /// List region names for `project_id`.
    async fn fetch_regions(&self, ctx: &TaskContext, project_id: &str) -> Result<Vec<String>, Error>;
}

/// Lists environment names within a project/location pair.
#[async_trait]
pub trait ComposerEnvironmentListFetcher: Send + Sync {
    /// List environment names for `project_id` in `location`.
    async fn get_environment_names(
        &self,
        ctx: &TaskContext,
        project_id: &str,
        location: &str,
    ) -> Result<Vec<String>, Error>;
}

/// A one-shot transform applied to a client factory at construction time,
/// e.g. installing a custom transport or credential source. Consumed once,
/// in declaration order, when a [`ClientFactory`] is built.
pub type FactoryOption<F> = Box<dyn Fn(&mut F) -> Result<(), Error> + Send + Sync>;

/// Produces a client scoped to a resource container. The engine only
/// passes an implementation through to leaf tasks; it never constructs or
/// inspects one itself.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// The client type this factory produces.
    type Client: Send + Sync;

    /// Build a client scoped to `container`.
    async fn client_for(&self, container: &ResourceContainer) -> Result<Self::Client, Error>;
}

/// Applies per-request transforms (headers, call options) to an outgoing
/// request, given the resource container it targets. OAuth/credential
/// injection itself is out of scope; this is only the seam a leaf task's
/// HTTP/gRPC call passes through.
pub trait CallOptionInjector: Send + Sync {
    /// Header-style `(name, value)` pairs to attach to a request scoped to
    /// `container`.
    fn inject(&self, container: &ResourceContainer) -> Vec<(String, String)>;
}

/// A [`CallOptionInjector`] that injects nothing, useful as a default when
/// no auth layer is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallOptionInjector;

impl CallOptionInjector for NoOpCallOptionInjector {
    fn inject(&self, _container: &ResourceContainer) -> Vec<(String, String)> {
        Vec::new()
    }
}
