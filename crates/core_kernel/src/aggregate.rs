//! Bidirectional parent/child status propagation
//!
//! One aggregator serves every status axis in the system. A
//! [`StatusHierarchy`] exposes the three store operations the aggregator
//! needs, scoped to an already-open unit of work, and names the
//! [`StatusDomain`] whose resolution rule applies.
//!
//! - [`cascade_from_parent`]: the parent's value is pushed onto every child.
//! - [`recompute_from_child`]: one child changes and the parent is
//!   re-derived from the full post-write sibling set.
//! - [`resync_parent`]: the parent is re-derived after bulk child changes.
//!
//! None of these functions commits. Callers run them inside a unit of work and
//! commit once; an error anywhere leaves the unit of work to roll back.

use async_trait::async_trait;
use std::fmt;
use tracing::debug;

use crate::ports::PortError;
use crate::status::StatusDomain;

/// Store operations on one status axis of one parent/child pairing
#[async_trait]
pub trait StatusHierarchy: Send {
    /// The status axis
    type Domain: StatusDomain;
    /// Parent key
    type ParentId: Copy + Eq + fmt::Display + fmt::Debug + Send + Sync;
    /// Child key
    type ChildId: Copy + Eq + fmt::Display + fmt::Debug + Send + Sync;

    /// Persists the parent's value
    async fn write_parent(
        &mut self,
        parent: Self::ParentId,
        status: <Self::Domain as StatusDomain>::Status,
    ) -> Result<(), PortError>;

    /// Persists one child's value and returns the owning parent
    async fn write_child(
        &mut self,
        child: Self::ChildId,
        status: <Self::Domain as StatusDomain>::Status,
    ) -> Result<Self::ParentId, PortError>;

    /// Lists every child of the parent with its current value
    async fn children(
        &mut self,
        parent: Self::ParentId,
    ) -> Result<Vec<(Self::ChildId, <Self::Domain as StatusDomain>::Status)>, PortError>;
}

/// What happened to the parent after a child-driven write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentResolution<S> {
    /// The parent was rewritten with this value
    Updated(S),
    /// The store listed no children for the parent, which kept its value
    Unchanged,
}

/// Outcome of [`recompute_from_child`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildUpdate<P, S> {
    pub parent: P,
    pub resolution: ParentResolution<S>,
}

/// Writes `status` to the parent and then to every one of its children
///
/// # Returns
///
/// The number of children rewritten
pub async fn cascade_from_parent<H>(
    hierarchy: &mut H,
    parent: H::ParentId,
    status: <H::Domain as StatusDomain>::Status,
) -> Result<usize, PortError>
where
    H: StatusHierarchy + ?Sized,
{
    hierarchy.write_parent(parent, status).await?;

    let children = hierarchy.children(parent).await?;
    for (child, _) in &children {
        hierarchy.write_child(*child, status).await?;
    }

    debug!(
        axis = <H::Domain as StatusDomain>::NAME,
        parent = %parent,
        children = children.len(),
        "cascaded parent status to children"
    );
    Ok(children.len())
}

/// Writes `status` to one child and re-derives the parent from all siblings
///
/// The sibling set is read after the write; the written child's value is
/// applied over whatever the read returns so the resolution never depends on
/// read-your-writes visibility. An empty sibling set leaves the parent alone.
pub async fn recompute_from_child<H>(
    hierarchy: &mut H,
    child: H::ChildId,
    status: <H::Domain as StatusDomain>::Status,
) -> Result<ChildUpdate<H::ParentId, <H::Domain as StatusDomain>::Status>, PortError>
where
    H: StatusHierarchy + ?Sized,
{
    let parent = hierarchy.write_child(child, status).await?;

    let mut siblings = hierarchy.children(parent).await?;
    if !siblings.is_empty() {
        match siblings.iter_mut().find(|(id, _)| *id == child) {
            Some(entry) => entry.1 = status,
            None => siblings.push((child, status)),
        }
    }

    let statuses: Vec<_> = siblings.iter().map(|(_, s)| *s).collect();
    let resolution = match H::Domain::resolve_parent(&statuses) {
        Some(next) => {
            hierarchy.write_parent(parent, next).await?;
            ParentResolution::Updated(next)
        }
        None => ParentResolution::Unchanged,
    };

    debug!(
        axis = <H::Domain as StatusDomain>::NAME,
        parent = %parent,
        child = %child,
        siblings = statuses.len(),
        ?resolution,
        "recomputed parent status from child"
    );
    Ok(ChildUpdate { parent, resolution })
}

/// Re-derives the parent from its current children without writing any child
///
/// Used after bulk child changes (composite updates, single part inserts)
/// that bypass the per-child path.
pub async fn resync_parent<H>(
    hierarchy: &mut H,
    parent: H::ParentId,
) -> Result<ParentResolution<<H::Domain as StatusDomain>::Status>, PortError>
where
    H: StatusHierarchy + ?Sized,
{
    let statuses: Vec<_> = hierarchy
        .children(parent)
        .await?
        .into_iter()
        .map(|(_, s)| s)
        .collect();

    match H::Domain::resolve_parent(&statuses) {
        Some(next) => {
            hierarchy.write_parent(parent, next).await?;
            Ok(ParentResolution::Updated(next))
        }
        None => Ok(ParentResolution::Unchanged),
    }
}
