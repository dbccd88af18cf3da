use std::sync::Arc;

use edcred_types::Clock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assessment::AssessmentLedger;
use crate::certificate::CertificateLedger;
use crate::config::RegistryConfig;
use crate::course::CourseLedger;
use crate::endorsement::EndorsementLedger;
use crate::error::Result;

/// One instance of each credentialing ledger, sharing a clock.
///
/// The ledgers remain independent: the registry never routes a call from one
/// to another. Build a fresh registry per run or test for isolation.
pub struct CredentialRegistry {
    clock: Arc<dyn Clock>,
    courses: CourseLedger,
    assessments: AssessmentLedger,
    certificates: CertificateLedger,
    endorsements: EndorsementLedger,
}

/// Record counts across all four ledgers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySummary {
    pub courses: usize,
    pub enrollments: usize,
    pub assessments: usize,
    pub results: usize,
    pub certificates: usize,
    pub endorsed_skills: usize,
}

impl CredentialRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        Self::with_clock(config.build_clock())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        info!(now = %clock.now(), "credential registry initialized");
        Self {
            courses: CourseLedger::new(),
            assessments: AssessmentLedger::new(clock.clone()),
            certificates: CertificateLedger::new(clock.clone()),
            endorsements: EndorsementLedger::new(),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn course_ledger(&self) -> &CourseLedger {
        &self.courses
    }

    pub fn assessment_ledger(&self) -> &AssessmentLedger {
        &self.assessments
    }

    pub fn certificate_ledger(&self) -> &CertificateLedger {
        &self.certificates
    }

    pub fn endorsement_ledger(&self) -> &EndorsementLedger {
        &self.endorsements
    }

    pub fn summary(&self) -> Result<RegistrySummary> {
        Ok(RegistrySummary {
            courses: self.courses.course_count()?,
            enrollments: self.courses.enrollment_count()?,
            assessments: self.assessments.assessment_count()?,
            results: self.assessments.result_count()?,
            certificates: self.certificates.live_count()?,
            endorsed_skills: self.endorsements.endorsed_pair_count()?,
        })
    }
}

impl Default for CredentialRegistry {
    fn default() -> Self {
        Self::new(&RegistryConfig::default())
    }
}
