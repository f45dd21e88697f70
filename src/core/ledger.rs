//! Per-cluster capacity ledger.
//!
//! A [`Cluster`] carries immutable limits and mutable availability for each
//! [`ResourceKind`]. `0 <= available <= limit` holds on every dimension after
//! every successful mutation; a mutation that would break it fails without
//! touching the ledger.

use serde::{Deserialize, Serialize};

use crate::core::{SchedulerError, SchedulerResult};
use crate::util::serde::{ClusterId, OrganizationId, ResourceKind};

/// Quantities per resource dimension, in caller-chosen integer units.
///
/// Used both for cluster limits and for a deployment's footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// CPU units.
    pub cpu: u64,
    /// Memory units.
    pub ram: u64,
    /// GPU units.
    pub gpu: u64,
}

impl Resources {
    /// Build a resource vector.
    pub const fn new(cpu: u64, ram: u64, gpu: u64) -> Self {
        Self { cpu, ram, gpu }
    }

    /// Quantity for one dimension.
    pub const fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Cpu => self.cpu,
            ResourceKind::Ram => self.ram,
            ResourceKind::Gpu => self.gpu,
        }
    }

    fn set(&mut self, kind: ResourceKind, value: u64) {
        match kind {
            ResourceKind::Cpu => self.cpu = value,
            ResourceKind::Ram => self.ram = value,
            ResourceKind::Gpu => self.gpu = value,
        }
    }

    /// First dimension where `self` exceeds `other`, if any.
    pub fn first_excess(&self, other: &Self) -> Option<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .find(|&kind| self.get(kind) > other.get(kind))
    }
}

/// Capacity ledger for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster identifier.
    pub id: ClusterId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Display name.
    pub name: String,
    limits: Resources,
    available: Resources,
}

impl Cluster {
    /// New cluster with every unit available.
    pub fn new(
        id: ClusterId,
        organization_id: OrganizationId,
        name: impl Into<String>,
        limits: Resources,
    ) -> Self {
        Self {
            id,
            organization_id,
            name: name.into(),
            limits,
            available: limits,
        }
    }

    /// Absolute limits, fixed at creation.
    pub const fn limits(&self) -> Resources {
        self.limits
    }

    /// Currently unallocated capacity.
    pub const fn available(&self) -> Resources {
        self.available
    }

    /// Currently allocated capacity.
    pub const fn allocated(&self) -> Resources {
        Resources {
            cpu: self.limits.cpu - self.available.cpu,
            ram: self.limits.ram - self.available.ram,
            gpu: self.limits.gpu - self.available.gpu,
        }
    }

    /// True iff every dimension of `footprint` fits in what is available now.
    pub fn can_fit(&self, footprint: &Resources) -> bool {
        footprint.first_excess(&self.available).is_none()
    }

    /// Reject footprints that could never fit, even on an idle cluster.
    pub fn check_satisfiable(&self, footprint: &Resources) -> SchedulerResult<()> {
        match footprint.first_excess(&self.limits) {
            Some(kind) => Err(SchedulerError::UnsatisfiableRequest {
                kind,
                required: footprint.get(kind),
                limit: self.limits.get(kind),
            }),
            None => Ok(()),
        }
    }

    /// Take `footprint` out of the available pool.
    pub fn allocate(&mut self, footprint: &Resources) -> SchedulerResult<()> {
        if let Some(kind) = footprint.first_excess(&self.available) {
            return Err(SchedulerError::InsufficientCapacity {
                kind,
                required: footprint.get(kind),
                available: self.available.get(kind),
            });
        }
        for kind in ResourceKind::ALL {
            self.available
                .set(kind, self.available.get(kind) - footprint.get(kind));
        }
        Ok(())
    }

    /// Return `footprint` to the available pool.
    ///
    /// Never clamps: exceeding a limit means something was released twice.
    pub fn release(&mut self, footprint: &Resources) -> SchedulerResult<()> {
        let mut next = self.available;
        for kind in ResourceKind::ALL {
            let released = footprint.get(kind);
            let would_be = self.available.get(kind).saturating_add(released);
            if would_be > self.limits.get(kind) {
                return Err(SchedulerError::LedgerCorruption {
                    cluster: self.id,
                    kind,
                    released,
                    would_be,
                    limit: self.limits.get(kind),
                });
            }
            next.set(kind, would_be);
        }
        self.available = next;
        Ok(())
    }
}
