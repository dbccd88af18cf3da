//! Course definitions and enrollment membership.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use edcred_types::{CourseId, IdAllocator, Principal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LedgerError, Result};

/// A course and its current enrollment count.
///
/// `enrolled_count` always equals the number of live enrollments for this
/// course and never exceeds `max_students`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub instructor: Principal,
    pub title: String,
    pub max_students: u32,
    pub enrolled_count: u32,
}

impl Course {
    pub fn is_full(&self) -> bool {
        self.enrolled_count >= self.max_students
    }

    pub fn remaining_seats(&self) -> u32 {
        self.max_students.saturating_sub(self.enrolled_count)
    }
}

/// Membership key for one student in one course.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnrollmentKey {
    pub course: CourseId,
    pub student: Principal,
}

impl EnrollmentKey {
    pub fn new(course: CourseId, student: Principal) -> Self {
        Self { course, student }
    }
}

/// Ledger of courses and who is enrolled in them.
#[derive(Debug, Default)]
pub struct CourseLedger {
    inner: RwLock<CourseState>,
}

#[derive(Debug, Default)]
struct CourseState {
    ids: IdAllocator<CourseId>,
    courses: HashMap<CourseId, Course>,
    enrollments: HashSet<EnrollmentKey>,
}

impl CourseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CourseState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned("course ledger".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CourseState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::LockPoisoned("course ledger".into()))
    }

    /// Define a new course with no students. Always succeeds.
    pub fn create_course(
        &self,
        instructor: impl Into<Principal>,
        title: impl Into<String>,
        max_students: u32,
    ) -> Result<CourseId> {
        let mut state = self.write()?;
        let id = state.ids.allocate();
        let course = Course {
            id,
            instructor: instructor.into(),
            title: title.into(),
            max_students,
            enrolled_count: 0,
        };
        debug!(course = %id, max_students, "course created");
        state.courses.insert(id, course);
        Ok(id)
    }

    /// Enroll `student` in `course`.
    ///
    /// Checked in order: the course exists, it has a free seat, the student
    /// is not already enrolled.
    pub fn enroll(&self, course: CourseId, student: impl Into<Principal>) -> Result<()> {
        let key = EnrollmentKey::new(course, student.into());
        let mut state = self.write()?;
        let CourseState {
            courses,
            enrollments,
            ..
        } = &mut *state;

        let record = courses
            .get_mut(&course)
            .ok_or_else(|| LedgerError::not_found(course))?;
        if record.is_full() {
            return Err(LedgerError::CourseFull {
                course,
                capacity: record.max_students,
            });
        }
        if enrollments.contains(&key) {
            return Err(LedgerError::AlreadyEnrolled {
                course,
                student: key.student,
            });
        }

        record.enrolled_count += 1;
        debug!(%course, student = %key.student, enrolled = record.enrolled_count, "student enrolled");
        enrollments.insert(key);
        Ok(())
    }

    /// Remove `student` from `course`.
    pub fn unenroll(&self, course: CourseId, student: impl Into<Principal>) -> Result<()> {
        let key = EnrollmentKey::new(course, student.into());
        let mut state = self.write()?;
        let CourseState {
            courses,
            enrollments,
            ..
        } = &mut *state;

        let record = courses
            .get_mut(&course)
            .ok_or_else(|| LedgerError::not_found(course))?;
        if !enrollments.remove(&key) {
            return Err(LedgerError::NotEnrolled {
                course,
                student: key.student,
            });
        }

        record.enrolled_count = record.enrolled_count.saturating_sub(1);
        debug!(%course, student = %key.student, enrolled = record.enrolled_count, "student unenrolled");
        Ok(())
    }

    pub fn course_info(&self, course: CourseId) -> Result<Option<Course>> {
        Ok(self.read()?.courses.get(&course).cloned())
    }

    /// `false` when either the course or the membership is absent.
    pub fn is_enrolled(&self, course: CourseId, student: impl Into<Principal>) -> Result<bool> {
        let key = EnrollmentKey::new(course, student.into());
        Ok(self.read()?.enrollments.contains(&key))
    }

    /// All courses, ordered by id.
    pub fn courses(&self) -> Result<Vec<Course>> {
        let state = self.read()?;
        let mut courses: Vec<Course> = state.courses.values().cloned().collect();
        courses.sort_by_key(|c| c.id);
        Ok(courses)
    }

    /// Students currently enrolled in `course`, sorted.
    pub fn enrolled_students(&self, course: CourseId) -> Result<Vec<Principal>> {
        let state = self.read()?;
        if !state.courses.contains_key(&course) {
            return Err(LedgerError::not_found(course));
        }
        let mut students: Vec<Principal> = state
            .enrollments
            .iter()
            .filter(|key| key.course == course)
            .map(|key| key.student.clone())
            .collect();
        students.sort();
        Ok(students)
    }

    pub fn course_count(&self) -> Result<usize> {
        Ok(self.read()?.courses.len())
    }

    pub fn enrollment_count(&self) -> Result<usize> {
        Ok(self.read()?.enrollments.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn enrolled(ledger: &CourseLedger, course: CourseId) -> u32 {
        ledger.course_info(course).unwrap().unwrap().enrolled_count
    }

    #[test]
    fn create_course_starts_empty() {
        let ledger = CourseLedger::new();
        let id = ledger
            .create_course("instructor1", "Blockchain 101", 20)
            .unwrap();

        assert_eq!(id, CourseId::from_raw(1));
        let course = ledger.course_info(id).unwrap().unwrap();
        assert_eq!(course.title, "Blockchain 101");
        assert_eq!(course.instructor, Principal::from("instructor1"));
        assert_eq!(course.max_students, 20);
        assert_eq!(course.enrolled_count, 0);
    }

    #[test]
    fn ids_are_sequential() {
        let ledger = CourseLedger::new();
        let a = ledger.create_course("i", "A", 1).unwrap();
        let b = ledger.create_course("i", "B", 1).unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn enroll_sets_membership_and_count() {
        let ledger = CourseLedger::new();
        let id = ledger.create_course("instructor1", "Blockchain 101", 20).unwrap();

        ledger.enroll(id, "student1").unwrap();

        assert!(ledger.is_enrolled(id, "student1").unwrap());
        assert_eq!(enrolled(&ledger, id), 1);
    }

    #[test]
    fn enroll_unknown_course_is_not_found() {
        let ledger = CourseLedger::new();
        let missing = CourseId::from_raw(42);
        assert_eq!(
            ledger.enroll(missing, "student1").unwrap_err(),
            LedgerError::NotFound(missing.into())
        );
        assert_eq!(
            ledger.unenroll(missing, "student1").unwrap_err(),
            LedgerError::NotFound(missing.into())
        );
    }

    #[test]
    fn enroll_in_full_course_fails() {
        let ledger = CourseLedger::new();
        let id = ledger.create_course("instructor1", "Blockchain 101", 1).unwrap();
        ledger.enroll(id, "student1").unwrap();

        let error = ledger.enroll(id, "student2").unwrap_err();
        assert_eq!(
            error,
            LedgerError::CourseFull {
                course: id,
                capacity: 1
            }
        );
        assert!(!ledger.is_enrolled(id, "student2").unwrap());
        assert_eq!(enrolled(&ledger, id), 1);
    }

    #[test]
    fn zero_capacity_course_is_always_full() {
        let ledger = CourseLedger::new();
        let id = ledger.create_course("i", "Closed", 0).unwrap();
        assert!(matches!(
            ledger.enroll(id, "student1").unwrap_err(),
            LedgerError::CourseFull { capacity: 0, .. }
        ));
    }

    #[test]
    fn double_enroll_fails() {
        let ledger = CourseLedger::new();
        let id = ledger.create_course("i", "T", 5).unwrap();
        ledger.enroll(id, "student1").unwrap();

        assert_eq!(
            ledger.enroll(id, "student1").unwrap_err(),
            LedgerError::AlreadyEnrolled {
                course: id,
                student: "student1".into()
            }
        );
        assert_eq!(enrolled(&ledger, id), 1);
    }

    #[test]
    fn unenroll_clears_membership_and_count() {
        let ledger = CourseLedger::new();
        let id = ledger.create_course("instructor1", "Blockchain 101", 20).unwrap();
        ledger.enroll(id, "student1").unwrap();

        ledger.unenroll(id, "student1").unwrap();

        assert!(!ledger.is_enrolled(id, "student1").unwrap());
        assert_eq!(enrolled(&ledger, id), 0);
    }

    #[test]
    fn unenroll_without_enrollment_fails() {
        let ledger = CourseLedger::new();
        let id = ledger.create_course("instructor1", "Blockchain 101", 20).unwrap();
        assert_eq!(
            ledger.unenroll(id, "student1").unwrap_err(),
            LedgerError::NotEnrolled {
                course: id,
                student: "student1".into()
            }
        );
        assert_eq!(enrolled(&ledger, id), 0);
    }

    #[test]
    fn freed_seat_can_be_taken() {
        let ledger = CourseLedger::new();
        let id = ledger.create_course("i", "T", 1).unwrap();

        ledger.enroll(id, "student1").unwrap();
        assert_eq!(enrolled(&ledger, id), 1);
        assert!(ledger.enroll(id, "student2").is_err());
        ledger.unenroll(id, "student1").unwrap();
        assert_eq!(enrolled(&ledger, id), 0);
        ledger.enroll(id, "student2").unwrap();
        assert_eq!(enrolled(&ledger, id), 1);
    }

    #[test]
    fn is_enrolled_is_false_for_unknown_course() {
        let ledger = CourseLedger::new();
        assert!(!ledger.is_enrolled(CourseId::from_raw(9), "student1").unwrap());
        assert!(ledger.course_info(CourseId::from_raw(9)).unwrap().is_none());
    }

    #[test]
    fn memberships_are_per_course() {
        let ledger = CourseLedger::new();
        let a = ledger.create_course("i", "A", 5).unwrap();
        let b = ledger.create_course("i", "B", 5).unwrap();
        ledger.enroll(a, "student1").unwrap();

        assert!(ledger.is_enrolled(a, "student1").unwrap());
        assert!(!ledger.is_enrolled(b, "student1").unwrap());
    }

    #[test]
    fn listing_is_ordered() {
        let ledger = CourseLedger::new();
        let id = ledger.create_course("i", "T", 5).unwrap();
        ledger.create_course("i", "U", 5).unwrap();
        ledger.enroll(id, "zed").unwrap();
        ledger.enroll(id, "amy").unwrap();

        let titles: Vec<_> = ledger.courses().unwrap().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["T", "U"]);
        assert_eq!(
            ledger.enrolled_students(id).unwrap(),
            vec![Principal::from("amy"), Principal::from("zed")]
        );
        assert_eq!(ledger.course_count().unwrap(), 2);
        assert_eq!(ledger.enrollment_count().unwrap(), 2);
        assert!(ledger.enrolled_students(CourseId::from_raw(99)).is_err());
    }

    proptest! {
        #[test]
        fn count_matches_memberships(
            capacity in 0u32..4,
            ops in proptest::collection::vec((any::<bool>(), 0usize..5), 0..40),
        ) {
            let ledger = CourseLedger::new();
            let id = ledger.create_course("i", "T", capacity).unwrap();

            for (enroll, student) in ops {
                let student = format!("student{student}");
                let _ = if enroll {
                    ledger.enroll(id, student.as_str())
                } else {
                    ledger.unenroll(id, student.as_str())
                };

                let course = ledger.course_info(id).unwrap().unwrap();
                let members = ledger.enrolled_students(id).unwrap();
                prop_assert_eq!(course.enrolled_count as usize, members.len());
                prop_assert!(course.enrolled_count <= course.max_students);
            }
        }
    }
}
