//! Issued certificates and their validity.
//!
//! Revocation erases the record outright. Validity is never stored: it is
//! recomputed against the ledger clock on every query.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use edcred_types::{CertificateId, Clock, CourseId, IdAllocator, Principal, SystemClock, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LedgerError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub recipient: Principal,
    pub course: CourseId,
    pub issued_at: Timestamp,
    /// `None` means the certificate never expires.
    pub expires_at: Option<Timestamp>,
}

impl Certificate {
    /// A certificate expiring exactly at `now` is already invalid.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => now < expires_at,
        }
    }
}

pub struct CertificateLedger {
    clock: Arc<dyn Clock>,
    inner: RwLock<CertificateState>,
}

#[derive(Default)]
struct CertificateState {
    ids: IdAllocator<CertificateId>,
    certificates: HashMap<CertificateId, Certificate>,
}

impl CertificateLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(CertificateState::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CertificateState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned("certificate ledger".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CertificateState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::LockPoisoned("certificate ledger".into()))
    }

    /// Issue a certificate stamped with the current time. Always succeeds.
    pub fn issue(
        &self,
        recipient: impl Into<Principal>,
        course: CourseId,
        expires_at: Option<Timestamp>,
    ) -> Result<CertificateId> {
        let mut state = self.write()?;
        let id = state.ids.allocate();
        let certificate = Certificate {
            id,
            recipient: recipient.into(),
            course,
            issued_at: self.clock.now(),
            expires_at,
        };
        debug!(certificate = %id, recipient = %certificate.recipient, %course, ?expires_at, "certificate issued");
        state.certificates.insert(id, certificate);
        Ok(id)
    }

    /// Permanently erase a certificate. Its id is never handed out again.
    pub fn revoke(&self, certificate: CertificateId) -> Result<()> {
        let mut state = self.write()?;
        state
            .certificates
            .remove(&certificate)
            .ok_or_else(|| LedgerError::not_found(certificate))?;
        debug!(%certificate, "certificate revoked");
        Ok(())
    }

    pub fn certificate_info(&self, certificate: CertificateId) -> Result<Option<Certificate>> {
        Ok(self.read()?.certificates.get(&certificate).cloned())
    }

    /// Revoked and never-issued certificates are both simply invalid.
    pub fn is_valid(&self, certificate: CertificateId) -> Result<bool> {
        let now = self.clock.now();
        Ok(self
            .read()?
            .certificates
            .get(&certificate)
            .is_some_and(|c| c.is_valid_at(now)))
    }

    /// Live certificates held by `recipient`, ordered by id.
    pub fn certificates_for(&self, recipient: impl Into<Principal>) -> Result<Vec<Certificate>> {
        let recipient = recipient.into();
        let state = self.read()?;
        let mut held: Vec<Certificate> = state
            .certificates
            .values()
            .filter(|c| c.recipient == recipient)
            .cloned()
            .collect();
        held.sort_by_key(|c| c.id);
        Ok(held)
    }

    pub fn live_count(&self) -> Result<usize> {
        Ok(self.read()?.certificates.len())
    }
}

impl Default for CertificateLedger {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for CertificateLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateLedger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edcred_types::ManualClock;

    const YEAR_MS: u64 = 365 * 24 * 60 * 60 * 1000;

    fn ledger_at(ms: u64) -> (CertificateLedger, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(ms)));
        (CertificateLedger::new(clock.clone()), clock)
    }

    #[test]
    fn issue_certificate() {
        let (ledger, _) = ledger_at(10_000);
        let id = ledger.issue("student1", CourseId::from_raw(1), None).unwrap();

        assert_eq!(id, CertificateId::from_raw(1));
        let cert = ledger.certificate_info(id).unwrap().unwrap();
        assert_eq!(cert.recipient, Principal::from("student1"));
        assert_eq!(cert.course, CourseId::from_raw(1));
        assert_eq!(cert.issued_at, Timestamp::from_millis(10_000));
        assert!(cert.expires_at.is_none());
    }

    #[test]
    fn issue_with_expiration() {
        let (ledger, clock) = ledger_at(10_000);
        let expires = clock.now().saturating_add_ms(YEAR_MS);
        let id = ledger.issue("student1", CourseId::from_raw(1), Some(expires)).unwrap();

        let cert = ledger.certificate_info(id).unwrap().unwrap();
        assert_eq!(cert.expires_at, Some(expires));
        assert!(ledger.is_valid(id).unwrap());
    }

    #[test]
    fn revoke_erases_record() {
        let ledger = CertificateLedger::default();
        let id = ledger.issue("student1", CourseId::from_raw(1), None).unwrap();

        ledger.revoke(id).unwrap();

        assert!(ledger.certificate_info(id).unwrap().is_none());
        assert!(!ledger.is_valid(id).unwrap());
        assert_eq!(
            ledger.revoke(id).unwrap_err(),
            LedgerError::NotFound(id.into())
        );
    }

    #[test]
    fn revoked_ids_are_not_reused() {
        let ledger = CertificateLedger::default();
        let first = ledger.issue("a", CourseId::from_raw(1), None).unwrap();
        ledger.revoke(first).unwrap();
        let second = ledger.issue("b", CourseId::from_raw(1), None).unwrap();

        assert_eq!(second, CertificateId::from_raw(2));
        assert!(ledger.certificate_info(first).unwrap().is_none());
    }

    #[test]
    fn revoke_unknown_is_not_found() {
        let ledger = CertificateLedger::default();
        let missing = CertificateId::from_raw(999);
        assert_eq!(
            ledger.revoke(missing).unwrap_err(),
            LedgerError::NotFound(missing.into())
        );
    }

    #[test]
    fn validity_tracks_expiry() {
        let (ledger, clock) = ledger_at(1_000_000);
        let forever = ledger.issue("student1", CourseId::from_raw(1), None).unwrap();
        let expired = ledger
            .issue(
                "student2",
                CourseId::from_raw(2),
                Some(clock.now().saturating_sub_ms(1_000)),
            )
            .unwrap();

        assert!(ledger.is_valid(forever).unwrap());
        assert!(!ledger.is_valid(expired).unwrap());

        clock.advance_ms(100 * YEAR_MS);
        assert!(ledger.is_valid(forever).unwrap());
    }

    #[test]
    fn expiring_exactly_now_is_invalid() {
        let (ledger, clock) = ledger_at(5_000);
        let id = ledger
            .issue("student1", CourseId::from_raw(1), Some(Timestamp::from_millis(5_001)))
            .unwrap();

        assert!(ledger.is_valid(id).unwrap());
        clock.advance_ms(1);
        assert!(!ledger.is_valid(id).unwrap());
    }

    #[test]
    fn unknown_certificate_is_invalid() {
        let ledger = CertificateLedger::default();
        assert!(!ledger.is_valid(CertificateId::from_raw(999)).unwrap());
    }

    #[test]
    fn certificates_for_recipient() {
        let ledger = CertificateLedger::default();
        let a = ledger.issue("student1", CourseId::from_raw(1), None).unwrap();
        ledger.issue("student2", CourseId::from_raw(1), None).unwrap();
        let c = ledger.issue("student1", CourseId::from_raw(2), None).unwrap();
        let d = ledger.issue("student1", CourseId::from_raw(3), None).unwrap();
        ledger.revoke(c).unwrap();

        let held: Vec<_> = ledger
            .certificates_for("student1")
            .unwrap()
            .into_iter()
            .map(|cert| cert.id)
            .collect();
        assert_eq!(held, vec![a, d]);
        assert_eq!(ledger.live_count().unwrap(), 3);
    }
}
