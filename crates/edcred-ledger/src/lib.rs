//! In-memory credentialing ledgers for EdCred.
//!
//! Four independent record stores share one structural pattern: a surrogate
//! or composite key, a single lock around the ledger's state, precondition
//! checks before any write, and derived state computed either at write time
//! (assessment pass/fail) or at read time (certificate validity).
//!
//! - [`CourseLedger`] — course definitions and enrollment membership
//! - [`AssessmentLedger`] — assessment definitions and per-student results
//! - [`CertificateLedger`] — issued certificates and their validity
//! - [`EndorsementLedger`] — skill endorsement counts and endorser marks
//! - [`CredentialRegistry`] — owns one of each, built from [`RegistryConfig`]
//!
//! No ledger calls another. A failing mutation leaves its ledger unchanged.

pub mod assessment;
pub mod certificate;
pub mod config;
pub mod course;
pub mod endorsement;
pub mod error;
pub mod registry;

pub use assessment::{Assessment, AssessmentLedger, AssessmentResult, ResultKey};
pub use certificate::{Certificate, CertificateLedger};
pub use config::{ClockConfig, RegistryConfig};
pub use course::{Course, CourseLedger, EnrollmentKey};
pub use endorsement::{EndorsementKey, EndorsementLedger, SkillKey};
pub use error::{ConfigError, LedgerError, Result};
pub use registry::{CredentialRegistry, RegistrySummary};
