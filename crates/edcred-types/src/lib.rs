//! Foundation types for EdCred.
//!
//! This crate provides the identifier, identity, and temporal types shared by
//! every EdCred ledger. Every other EdCred crate depends on `edcred-types`.
//!
//! # Key Types
//!
//! - [`CourseId`], [`AssessmentId`], [`CertificateId`] — surrogate record ids
//! - [`IdAllocator`] — monotonically increasing id counter starting at 1
//! - [`Principal`] — opaque caller-supplied identity (student, instructor, ...)
//! - [`Skill`] — opaque skill name used by endorsements
//! - [`Timestamp`] — milliseconds since the UNIX epoch
//! - [`Clock`] — time source seam, with [`SystemClock`] and [`ManualClock`]

pub mod error;
pub mod ids;
pub mod identity;
pub mod temporal;

pub use error::TypeError;
pub use ids::{AssessmentId, CertificateId, CourseId, IdAllocator, RecordId};
pub use identity::{Principal, Skill};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
