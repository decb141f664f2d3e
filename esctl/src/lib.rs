//! esctl - operator toolkit for Elasticsearch clusters and Kibana Fleet
//!
//! # Architecture
//!
//! - **Client**: HTTP accessors for Elasticsearch and Kibana behind the
//!   [`ClusterSettingsApi`] and [`FleetApi`] traits
//! - **Exclusion**: drain and fill nodes through the
//!   `cluster.routing.allocation.exclude.*` settings
//! - **Policy**: delete Fleet agent policies, reassigning bound agents to the
//!   default policy first when forced
//! - **Allocation**: cluster-wide allocation switch and shard explanations
//! - **Settings**: typed cluster settings, lookup with source precedence
//! - **Snapshot**: snapshot repositories, snapshots and restores
//!
//! Every operation re-reads remote state, computes the full target value and
//! writes it back. Nothing is cached between invocations and nothing retries.

pub mod allocation;
pub mod client;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod fleet;
pub mod policy;
pub mod settings;
pub mod snapshot;

pub use allocation::{AllocationExplanation, AllocationStatus, ExplainRequest};
pub use client::{ClusterSettingsApi, EsClient, FleetApi, FleetClient};
pub use config::{Config, OutputFormat};
pub use error::{Error, ErrorKind, Result};
pub use exclusion::{ExclusionCoordinator, ExclusionDimension, ExclusionSet, NameExclusions};
pub use fleet::{
    Agent, AgentPolicy, AgentPolicyUpdate, AgentQuery, AgentUpdate, NewAgentPolicy,
    NewPackagePolicy, PackagePolicy, PackagePolicyUpdate, PackageRef,
};
pub use policy::{BoundAgents, DeletionOutcome, PolicyDeletionCoordinator};
pub use settings::{ClusterSettings, SettingScope, SettingSource, SettingValue, SettingsUpdate};
pub use snapshot::{NewRepository, NewSnapshot, RestoreRequest};
