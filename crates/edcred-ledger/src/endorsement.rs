//! Skill endorsements.
//!
//! Two independent key-spaces are kept: a per-(endorsee, skill) count and a
//! per-(endorser, endorsee, skill) mark. They are not reconciled with each
//! other. Endorsing twice counts twice while leaving a single mark, and
//! revoking lowers the count (never below zero) whether or not the revoking
//! endorser holds a mark.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use edcred_types::{Principal, Skill};
use tracing::debug;

use crate::error::{LedgerError, Result};

/// Count key: one skill of one endorsee.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkillKey {
    pub endorsee: Principal,
    pub skill: Skill,
}

impl SkillKey {
    pub fn new(endorsee: Principal, skill: Skill) -> Self {
        Self { endorsee, skill }
    }
}

/// Mark key: one endorser vouching for one skill of one endorsee.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndorsementKey {
    pub endorser: Principal,
    pub endorsee: Principal,
    pub skill: Skill,
}

impl EndorsementKey {
    pub fn new(endorser: Principal, endorsee: Principal, skill: Skill) -> Self {
        Self {
            endorser,
            endorsee,
            skill,
        }
    }

    fn skill_key(&self) -> SkillKey {
        SkillKey::new(self.endorsee.clone(), self.skill.clone())
    }
}

#[derive(Debug, Default)]
pub struct EndorsementLedger {
    inner: RwLock<EndorsementState>,
}

#[derive(Debug, Default)]
struct EndorsementState {
    counts: HashMap<SkillKey, u64>,
    marks: HashSet<EndorsementKey>,
}

impl EndorsementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EndorsementState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned("endorsement ledger".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, EndorsementState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::LockPoisoned("endorsement ledger".into()))
    }

    /// Record that `endorser` vouches for `endorsee`'s `skill`.
    ///
    /// The count is incremented on every call, including repeats by the same
    /// endorser. Returns the new count.
    pub fn endorse(
        &self,
        endorser: impl Into<Principal>,
        endorsee: impl Into<Principal>,
        skill: impl Into<Skill>,
    ) -> Result<u64> {
        let key = EndorsementKey::new(endorser.into(), endorsee.into(), skill.into());
        if key.endorser == key.endorsee {
            return Err(LedgerError::SelfEndorsement {
                principal: key.endorser,
            });
        }

        let mut state = self.write()?;
        let count = state.counts.entry(key.skill_key()).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;
        debug!(
            endorser = %key.endorser,
            endorsee = %key.endorsee,
            skill = %key.skill,
            count,
            "endorsement recorded"
        );
        state.marks.insert(key);
        Ok(count)
    }

    /// Withdraw an endorsement. Always succeeds.
    ///
    /// The count drops by one if it is above zero; the mark is cleared either
    /// way. Returns the new count.
    pub fn revoke(
        &self,
        endorser: impl Into<Principal>,
        endorsee: impl Into<Principal>,
        skill: impl Into<Skill>,
    ) -> Result<u64> {
        let key = EndorsementKey::new(endorser.into(), endorsee.into(), skill.into());
        let skill_key = key.skill_key();
        let mut state = self.write()?;

        let current = state.counts.get(&skill_key).copied().unwrap_or(0);
        let remaining = current.saturating_sub(1);
        if remaining == 0 {
            state.counts.remove(&skill_key);
        } else {
            state.counts.insert(skill_key, remaining);
        }
        state.marks.remove(&key);
        debug!(
            endorser = %key.endorser,
            endorsee = %key.endorsee,
            skill = %key.skill,
            count = remaining,
            "endorsement revoked"
        );
        Ok(remaining)
    }

    /// Number of endorsements `endorsee` holds for `skill`; zero if none.
    pub fn skill_endorsements(
        &self,
        endorsee: impl Into<Principal>,
        skill: impl Into<Skill>,
    ) -> Result<u64> {
        let key = SkillKey::new(endorsee.into(), skill.into());
        Ok(self.read()?.counts.get(&key).copied().unwrap_or(0))
    }

    pub fn has_endorsed(
        &self,
        endorser: impl Into<Principal>,
        endorsee: impl Into<Principal>,
        skill: impl Into<Skill>,
    ) -> Result<bool> {
        let key = EndorsementKey::new(endorser.into(), endorsee.into(), skill.into());
        Ok(self.read()?.marks.contains(&key))
    }

    /// Skills of `endorsee` with a non-zero count, sorted by skill.
    pub fn endorsed_skills(&self, endorsee: impl Into<Principal>) -> Result<Vec<(Skill, u64)>> {
        let endorsee = endorsee.into();
        let state = self.read()?;
        let mut skills: Vec<(Skill, u64)> = state
            .counts
            .iter()
            .filter(|(key, count)| key.endorsee == endorsee && **count > 0)
            .map(|(key, count)| (key.skill.clone(), *count))
            .collect();
        skills.sort();
        Ok(skills)
    }

    /// Distinct (endorsee, skill) pairs with a non-zero count.
    pub fn endorsed_pair_count(&self) -> Result<usize> {
        Ok(self.read()?.counts.values().filter(|c| **c > 0).count())
    }
}
