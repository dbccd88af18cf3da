//! Batch scripts of ledger operations.
//!
//! A script is a list of `op` entries, each tagged with an `action`:
//!
//! ```toml
//! [[op]]
//! action = "create_course"
//! instructor = "instructor1"
//! title = "Blockchain 101"
//! max_students = 1
//!
//! [[op]]
//! action = "enroll"
//! course = 1
//! student = "student1"
//! ```

use std::path::Path;

use anyhow::Context;
use edcred_ledger::{CredentialRegistry, LedgerError};
use edcred_types::{
    AssessmentId, CertificateId, CourseId, Principal, RecordId, Skill, Timestamp, TypeError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Operation {
    CreateCourse {
        instructor: Principal,
        title: String,
        max_students: u32,
    },
    Enroll {
        course: CourseId,
        student: Principal,
    },
    Unenroll {
        course: CourseId,
        student: Principal,
    },
    CourseInfo {
        course: CourseId,
    },
    IsEnrolled {
        course: CourseId,
        student: Principal,
    },
    EnrolledStudents {
        course: CourseId,
    },
    CreateAssessment {
        course: CourseId,
        title: String,
        passing_score: i64,
        total_questions: i64,
    },
    SubmitResult {
        assessment: AssessmentId,
        student: Principal,
        score: i64,
    },
    AssessmentInfo {
        assessment: AssessmentId,
    },
    AssessmentResult {
        assessment: AssessmentId,
        student: Principal,
    },
    IssueCertificate {
        recipient: Principal,
        course: CourseId,
        #[serde(default)]
        expires_at: Option<Timestamp>,
    },
    RevokeCertificate {
        certificate: CertificateId,
    },
    CertificateInfo {
        certificate: CertificateId,
    },
    IsCertificateValid {
        certificate: CertificateId,
    },
    Endorse {
        endorser: Principal,
        endorsee: Principal,
        skill: Skill,
    },
    RevokeEndorsement {
        endorser: Principal,
        endorsee: Principal,
        skill: Skill,
    },
    SkillEndorsements {
        endorsee: Principal,
        skill: Skill,
    },
    HasEndorsed {
        endorser: Principal,
        endorsee: Principal,
        skill: Skill,
    },
    Summary,
}

impl Operation {
    pub fn action(&self) -> &'static str {
        match self {
            Self::CreateCourse { .. } => "create_course",
            Self::Enroll { .. } => "enroll",
            Self::Unenroll { .. } => "unenroll",
            Self::CourseInfo { .. } => "course_info",
            Self::IsEnrolled { .. } => "is_enrolled",
            Self::EnrolledStudents { .. } => "enrolled_students",
            Self::CreateAssessment { .. } => "create_assessment",
            Self::SubmitResult { .. } => "submit_result",
            Self::AssessmentInfo { .. } => "assessment_info",
            Self::AssessmentResult { .. } => "assessment_result",
            Self::IssueCertificate { .. } => "issue_certificate",
            Self::RevokeCertificate { .. } => "revoke_certificate",
            Self::CertificateInfo { .. } => "certificate_info",
            Self::IsCertificateValid { .. } => "is_certificate_valid",
            Self::Endorse { .. } => "endorse",
            Self::RevokeEndorsement { .. } => "revoke_endorsement",
            Self::SkillEndorsements { .. } => "skill_endorsements",
            Self::HasEndorsed { .. } => "has_endorsed",
            Self::Summary => "summary",
        }
    }

    fn principals(&self) -> Vec<&Principal> {
        match self {
            Self::CreateCourse { instructor, .. } => vec![instructor],
            Self::Enroll { student, .. }
            | Self::Unenroll { student, .. }
            | Self::IsEnrolled { student, .. }
            | Self::SubmitResult { student, .. }
            | Self::AssessmentResult { student, .. } => vec![student],
            Self::IssueCertificate { recipient, .. } => vec![recipient],
            Self::Endorse {
                endorser, endorsee, ..
            }
            | Self::RevokeEndorsement {
                endorser, endorsee, ..
            }
            | Self::HasEndorsed {
                endorser, endorsee, ..
            } => vec![endorser, endorsee],
            Self::SkillEndorsements { endorsee, .. } => vec![endorsee],
            Self::CourseInfo { .. }
            | Self::EnrolledStudents { .. }
            | Self::CreateAssessment { .. }
            | Self::AssessmentInfo { .. }
            | Self::RevokeCertificate { .. }
            | Self::CertificateInfo { .. }
            | Self::IsCertificateValid { .. }
            | Self::Summary => vec![],
        }
    }

    fn record_ids(&self) -> Vec<RecordId> {
        match self {
            Self::Enroll { course, .. }
            | Self::Unenroll { course, .. }
            | Self::CourseInfo { course }
            | Self::IsEnrolled { course, .. }
            | Self::EnrolledStudents { course }
            | Self::CreateAssessment { course, .. }
            | Self::IssueCertificate { course, .. } => vec![RecordId::from(*course)],
            Self::SubmitResult { assessment, .. }
            | Self::AssessmentInfo { assessment }
            | Self::AssessmentResult { assessment, .. } => vec![RecordId::from(*assessment)],
            Self::RevokeCertificate { certificate }
            | Self::CertificateInfo { certificate }
            | Self::IsCertificateValid { certificate } => vec![RecordId::from(*certificate)],
            Self::CreateCourse { .. }
            | Self::Endorse { .. }
            | Self::RevokeEndorsement { .. }
            | Self::SkillEndorsements { .. }
            | Self::HasEndorsed { .. }
            | Self::Summary => vec![],
        }
    }

    /// Reject identities and ids a script author almost certainly did not
    /// mean: empty principals and the never-allocated id 0.
    pub fn validate(&self) -> Result<(), TypeError> {
        for principal in self.principals() {
            Principal::parse(principal.as_str())?;
        }
        for id in self.record_ids() {
            id.check_allocatable()?;
        }
        Ok(())
    }

    /// Apply this operation and render its return value.
    pub fn execute(&self, registry: &CredentialRegistry) -> Result<Value, LedgerError> {
        let courses = registry.course_ledger();
        let assessments = registry.assessment_ledger();
        let certificates = registry.certificate_ledger();
        let endorsements = registry.endorsement_ledger();

        let value = match self {
            Self::CreateCourse {
                instructor,
                title,
                max_students,
            } => json!(courses.create_course(instructor.clone(), title.as_str(), *max_students)?),
            Self::Enroll { course, student } => {
                courses.enroll(*course, student.clone())?;
                json!(true)
            }
            Self::Unenroll { course, student } => {
                courses.unenroll(*course, student.clone())?;
                json!(true)
            }
            Self::CourseInfo { course } => json!(courses.course_info(*course)?),
            Self::IsEnrolled { course, student } => {
                json!(courses.is_enrolled(*course, student.clone())?)
            }
            Self::EnrolledStudents { course } => json!(courses.enrolled_students(*course)?),
            Self::CreateAssessment {
                course,
                title,
                passing_score,
                total_questions,
            } => json!(assessments.create_assessment(
                *course,
                title.as_str(),
                *passing_score,
                *total_questions
            )?),
            Self::SubmitResult {
                assessment,
                student,
                score,
            } => json!(assessments.submit_result(*assessment, student.clone(), *score)?),
            Self::AssessmentInfo { assessment } => json!(assessments.assessment_info(*assessment)?),
            Self::AssessmentResult {
                assessment,
                student,
            } => json!(assessments.assessment_result(*assessment, student.clone())?),
            Self::IssueCertificate {
                recipient,
                course,
                expires_at,
            } => json!(certificates.issue(recipient.clone(), *course, *expires_at)?),
            Self::RevokeCertificate { certificate } => {
                certificates.revoke(*certificate)?;
                json!(true)
            }
            Self::CertificateInfo { certificate } => {
                json!(certificates.certificate_info(*certificate)?)
            }
            Self::IsCertificateValid { certificate } => json!(certificates.is_valid(*certificate)?),
            Self::Endorse {
                endorser,
                endorsee,
                skill,
            } => json!(endorsements.endorse(endorser.clone(), endorsee.clone(), skill.clone())?),
            Self::RevokeEndorsement {
                endorser,
                endorsee,
                skill,
            } => json!(endorsements.revoke(endorser.clone(), endorsee.clone(), skill.clone())?),
            Self::SkillEndorsements { endorsee, skill } => {
                json!(endorsements.skill_endorsements(endorsee.clone(), skill.clone())?)
            }
            Self::HasEndorsed {
                endorser,
                endorsee,
                skill,
            } => json!(endorsements.has_endorsed(endorser.clone(), endorsee.clone(), skill.clone())?),
            Self::Summary => json!(registry.summary()?),
        };
        Ok(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "op", default)]
    pub ops: Vec<Operation>,
}

impl Script {
    /// Load from `path`: TOML for a `.toml` extension, JSON otherwise.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let script: Script = if is_toml {
            toml::from_str(&input).with_context(|| format!("parsing {}", path.display()))?
        } else {
            serde_json::from_str(&input).with_context(|| format!("parsing {}", path.display()))?
        };
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (index, op) in self.ops.iter().enumerate() {
            op.validate()
                .with_context(|| format!("op {} ({})", index + 1, op.action()))?;
        }
        Ok(())
    }

    /// Execute every operation in order. Failures are recorded, not
    /// propagated; with `fail_fast` execution stops after the first one.
    pub fn run(&self, registry: &CredentialRegistry, fail_fast: bool) -> Vec<OpOutcome> {
        let mut outcomes = Vec::with_capacity(self.ops.len());
        for (index, op) in self.ops.iter().enumerate() {
            let status = match op.execute(registry) {
                Ok(value) => OpStatus::Ok { value },
                Err(e) => OpStatus::Failed {
                    error: e.to_string(),
                },
            };
            let failed = status.is_failed();
            outcomes.push(OpOutcome {
                index: index + 1,
                action: op.action(),
                status,
            });
            if failed && fail_fast {
                break;
            }
        }
        outcomes
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpOutcome {
    pub index: usize,
    pub action: &'static str,
    #[serde(flatten)]
    pub status: OpStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpStatus {
    Ok { value: Value },
    Failed { error: String },
}

impl OpStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
