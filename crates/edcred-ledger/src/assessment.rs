//! Assessment definitions and per-student results.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use edcred_types::{AssessmentId, Clock, CourseId, IdAllocator, Principal, SystemClock, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LedgerError, Result};

/// An assessment belonging to a course. Immutable once created.
///
/// `course` is carried as a foreign key and is not checked against any
/// course ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub course: CourseId,
    pub title: String,
    pub passing_score: i64,
    pub total_questions: i64,
}

impl Assessment {
    pub fn passes(&self, score: i64) -> bool {
        score >= self.passing_score
    }
}

/// A student's latest submission. `passed` is fixed when the result is
/// written and recomputed only by a new submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub score: i64,
    pub passed: bool,
    pub submitted_at: Timestamp,
}

/// Lookup key for one student's result on one assessment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    pub assessment: AssessmentId,
    pub student: Principal,
}

impl ResultKey {
    pub fn new(assessment: AssessmentId, student: Principal) -> Self {
        Self {
            assessment,
            student,
        }
    }
}

/// Ledger of assessments and their latest results.
pub struct AssessmentLedger {
    clock: Arc<dyn Clock>,
    inner: RwLock<AssessmentState>,
}

#[derive(Default)]
struct AssessmentState {
    ids: IdAllocator<AssessmentId>,
    assessments: HashMap<AssessmentId, Assessment>,
    results: HashMap<ResultKey, AssessmentResult>,
}

impl AssessmentLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(AssessmentState::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, AssessmentState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned("assessment ledger".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, AssessmentState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::LockPoisoned("assessment ledger".into()))
    }

    pub fn create_assessment(
        &self,
        course: CourseId,
        title: impl Into<String>,
        passing_score: i64,
        total_questions: i64,
    ) -> Result<AssessmentId> {
        let mut state = self.write()?;
        let id = state.ids.allocate();
        let assessment = Assessment {
            id,
            course,
            title: title.into(),
            passing_score,
            total_questions,
        };
        debug!(assessment = %id, %course, passing_score, total_questions, "assessment created");
        state.assessments.insert(id, assessment);
        Ok(id)
    }

    /// Record `student`'s score, replacing any earlier submission.
    ///
    /// Only scores above `total_questions` are rejected; there is no lower
    /// bound.
    pub fn submit_result(
        &self,
        assessment: AssessmentId,
        student: impl Into<Principal>,
        score: i64,
    ) -> Result<AssessmentResult> {
        let key = ResultKey::new(assessment, student.into());
        let mut state = self.write()?;

        let definition = state
            .assessments
            .get(&assessment)
            .ok_or_else(|| LedgerError::not_found(assessment))?;
        if score > definition.total_questions {
            return Err(LedgerError::InvalidScore {
                assessment,
                score,
                total_questions: definition.total_questions,
            });
        }

        let result = AssessmentResult {
            score,
            passed: definition.passes(score),
            submitted_at: self.clock.now(),
        };
        debug!(%assessment, student = %key.student, score, passed = result.passed, "result submitted");
        state.results.insert(key, result.clone());
        Ok(result)
    }

    pub fn assessment_info(&self, assessment: AssessmentId) -> Result<Option<Assessment>> {
        Ok(self.read()?.assessments.get(&assessment).cloned())
    }

    pub fn assessment_result(
        &self,
        assessment: AssessmentId,
        student: impl Into<Principal>,
    ) -> Result<Option<AssessmentResult>> {
        let key = ResultKey::new(assessment, student.into());
        Ok(self.read()?.results.get(&key).cloned())
    }

    /// Every student's latest result on `assessment`, sorted by student.
    pub fn results_for(
        &self,
        assessment: AssessmentId,
    ) -> Result<Vec<(Principal, AssessmentResult)>> {
        let state = self.read()?;
        if !state.assessments.contains_key(&assessment) {
            return Err(LedgerError::not_found(assessment));
        }
        let mut results: Vec<_> = state
            .results
            .iter()
            .filter(|(key, _)| key.assessment == assessment)
            .map(|(key, result)| (key.student.clone(), result.clone()))
            .collect();
        results.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(results)
    }

    pub fn assessment_count(&self) -> Result<usize> {
        Ok(self.read()?.assessments.len())
    }

    pub fn result_count(&self) -> Result<usize> {
        Ok(self.read()?.results.len())
    }
}

impl Default for AssessmentLedger {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for AssessmentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentLedger").finish_non_exhaustive()
    }
}
