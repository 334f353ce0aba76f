//! High-level operations.
//!
//! This module contains the implementation of Quay commands.

pub mod changed;
pub mod doctor;
pub mod install;
pub mod new;
pub mod pack;
pub mod plan;
pub mod validate;
pub mod version;

pub use changed::{changed, ChangedOptions, ImpactReport};
pub use doctor::{doctor, DoctorOptions, DoctorReport};
pub use install::{InstallQueue, InstallReport, StepResult, StepStatus};
pub use new::{init_project, new_project, NewOptions};
pub use pack::{pack, PackOptions, PackedArtifact};
pub use plan::{InstallPlan, PlanOptions, PlanStep, StepAction};
pub use validate::{validate, ValidateOptions, ValidateReport};
pub use version::{bump, report, BumpOptions, BumpOutcome, VersionReport};
