pub mod clock;
pub mod config;
pub mod policy;
pub mod query;
pub mod region;
pub mod row;
pub mod transform;
pub mod wire;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ServiceConfig, UpstreamConfig};
pub use policy::{AgeRange, Category, ContactInfo, NATIONWIDE, Policy, PolicyStatus};
pub use query::{AgeFilter, Pagination, PolicyPage, PolicyQuery};
pub use row::{PolicyRow, RowError};
pub use wire::{YouthPolicyDetail, YouthPolicyDetailEnvelope, YouthPolicyList, YouthPolicyRecord};
