//! Vargen Code Generation
//!
//! Discovers generated variable types through the asset store and generates,
//! rebuilds and deletes them from a template catalog.

pub mod catalog;
pub mod generator;
pub mod registry;
pub mod reload;
pub mod transaction;

pub use catalog::{Applicability, Placement, TemplateCatalog, TemplateDescriptor, write_default_templates};
pub use generator::Generator;
pub use registry::{ArtifactSet, Partition, PartitionEntry, Registry, ScanWarning};
pub use reload::{ReloadGuard, ReloadLock};
pub use transaction::GeneratedArtifact;
