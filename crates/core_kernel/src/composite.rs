//! Transactional composite writes
//!
//! A composite is one parent row plus a variable-length collection of owned
//! child rows. The drivers here run against a [`CompositeStore`] that is
//! already scoped to a unit of work; atomicity comes from the caller
//! committing that unit of work only after the driver returns `Ok`.
//!
//! The update path reconciles the persisted child set against the payload:
//!
//! 1. update the parent
//! 2. update (or insert) every child named in the payload
//! 3. read back the full persisted child set
//! 4. collapse children that share a natural key, keeping the latest
//! 5. delete persisted children the payload no longer names
//!
//! Steps 4 and 5 are planned by the pure function [`plan_child_sync`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use tracing::debug;

use crate::ports::PortError;

/// A child row that participates in composite reconciliation
pub trait CompositeChild {
    /// Primary key
    type Id: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync;
    /// Business attribute that must be unique among siblings
    type Key: Eq + Hash + Clone + fmt::Debug + Send + Sync;

    fn id(&self) -> Self::Id;

    fn natural_key(&self) -> Self::Key;

    fn updated_at(&self) -> DateTime<Utc>;
}

/// Children to delete after an update, split by reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSyncPlan<Id> {
    /// Losers of a natural-key collapse
    pub duplicates: Vec<Id>,
    /// Surviving children the payload did not name
    pub orphans: Vec<Id>,
}

impl<Id: Copy> ChildSyncPlan<Id> {
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty() && self.orphans.is_empty()
    }

    /// Every id to delete, duplicates first
    pub fn deletions(&self) -> impl Iterator<Item = Id> + '_ {
        self.duplicates.iter().chain(self.orphans.iter()).copied()
    }
}

/// Plans which persisted children to delete
///
/// Within each natural-key group the child with the latest `updated_at`
/// survives. Ties go to a child in `retained`, then to the highest id.
/// Survivors whose id is not in `retained` become orphans.
///
/// # Arguments
///
/// * `persisted` - the full child set read back from the store
/// * `retained` - ids the update payload named (including freshly inserted ones)
pub fn plan_child_sync<C: CompositeChild>(
    persisted: &[C],
    retained: &HashSet<C::Id>,
) -> ChildSyncPlan<C::Id> {
    let mut winners: HashMap<C::Key, &C> = HashMap::new();
    let mut duplicates = Vec::new();

    let rank = |c: &C| (c.updated_at(), retained.contains(&c.id()), c.id());

    for child in persisted {
        match winners.get_mut(&child.natural_key()) {
            None => {
                winners.insert(child.natural_key(), child);
            }
            Some(current) => {
                if rank(child) > rank(*current) {
                    duplicates.push(current.id());
                    *current = child;
                } else {
                    duplicates.push(child.id());
                }
            }
        }
    }

    let mut orphans: Vec<C::Id> = winners
        .values()
        .map(|c| c.id())
        .filter(|id| !retained.contains(id))
        .collect();

    duplicates.sort();
    orphans.sort();

    ChildSyncPlan { duplicates, orphans }
}

/// Store operations for one parent/child composite, scoped to a unit of work
#[async_trait]
pub trait CompositeStore: Send {
    type ParentId: Copy + fmt::Display + Send + Sync;
    type Parent: Send;
    type NewParent: Send;
    type ParentChange: Send;
    type Child: CompositeChild + Send + Sync;
    type NewChild: Send;
    type ChildChange: Send;

    /// Key of a persisted parent
    fn parent_id(parent: &Self::Parent) -> Self::ParentId;

    async fn insert_parent(&mut self, parent: Self::NewParent) -> Result<Self::Parent, PortError>;

    async fn insert_child(
        &mut self,
        parent: Self::ParentId,
        child: Self::NewChild,
    ) -> Result<Self::Child, PortError>;

    async fn update_parent(
        &mut self,
        parent: Self::ParentId,
        change: Self::ParentChange,
    ) -> Result<Self::Parent, PortError>;

    /// Updates the child named by the change, or inserts it when unnamed
    async fn upsert_child(
        &mut self,
        parent: Self::ParentId,
        change: Self::ChildChange,
    ) -> Result<Self::Child, PortError>;

    async fn children(&mut self, parent: Self::ParentId) -> Result<Vec<Self::Child>, PortError>;

    async fn delete_child(
        &mut self,
        child: <Self::Child as CompositeChild>::Id,
    ) -> Result<(), PortError>;
}

/// A parent with its children as persisted
#[derive(Debug, Clone)]
pub struct Composite<P, C> {
    pub parent: P,
    pub children: Vec<C>,
}

/// Inserts the parent, then every child stamped with the new parent id
pub async fn create_with_children<S>(
    store: &mut S,
    parent: S::NewParent,
    children: Vec<S::NewChild>,
) -> Result<Composite<S::Parent, S::Child>, PortError>
where
    S: CompositeStore + ?Sized,
{
    let parent = store.insert_parent(parent).await?;
    let parent_id = S::parent_id(&parent);

    let mut inserted = Vec::with_capacity(children.len());
    for child in children {
        inserted.push(store.insert_child(parent_id, child).await?);
    }

    debug!(parent = %parent_id, children = inserted.len(), "composite created");
    Ok(Composite {
        parent,
        children: inserted,
    })
}

/// Updates the parent and reconciles its children against the payload
///
/// The returned composite holds the children left after deletions.
pub async fn update_with_children<S>(
    store: &mut S,
    parent_id: S::ParentId,
    change: S::ParentChange,
    children: Vec<S::ChildChange>,
) -> Result<Composite<S::Parent, S::Child>, PortError>
where
    S: CompositeStore + ?Sized,
{
    let parent = store.update_parent(parent_id, change).await?;

    let mut retained = HashSet::with_capacity(children.len());
    for child in children {
        let written = store.upsert_child(parent_id, child).await?;
        retained.insert(written.id());
    }

    let persisted = store.children(parent_id).await?;
    let plan = plan_child_sync(&persisted, &retained);
    for child in plan.deletions() {
        store.delete_child(child).await?;
    }

    let removed: HashSet<_> = plan.deletions().collect();
    let children: Vec<_> = persisted
        .into_iter()
        .filter(|c| !removed.contains(&c.id()))
        .collect();

    debug!(
        parent = %parent_id,
        kept = children.len(),
        duplicates = plan.duplicates.len(),
        orphans = plan.orphans.len(),
        "composite updated"
    );
    Ok(Composite { parent, children })
}
