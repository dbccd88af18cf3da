use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create from a raw value. Ledgers allocate ids through
            /// [`IdAllocator`]; this is for lookups by caller-supplied ids.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The underlying integer.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            /// Accepts `7` or `course#7` (with the matching prefix). Zero is
            /// never allocated and is rejected.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s
                    .strip_prefix(concat!($prefix, "#"))
                    .unwrap_or(s);
                match digits.parse::<u64>() {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(TypeError::InvalidId {
                        kind: $prefix,
                        input: s.to_string(),
                    }),
                }
            }
        }
    };
}

record_id!(
    /// Identifier of a course definition.
    CourseId,
    "course"
);

record_id!(
    /// Identifier of an assessment definition.
    AssessmentId,
    "assessment"
);

record_id!(
    /// Identifier of an issued certificate. Never reassigned after revocation.
    CertificateId,
    "certificate"
);

/// Any surrogate-keyed record, used to report which lookup failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordId {
    Course(CourseId),
    Assessment(AssessmentId),
    Certificate(CertificateId),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Course(id) => write!(f, "{id}"),
            Self::Assessment(id) => write!(f, "{id}"),
            Self::Certificate(id) => write!(f, "{id}"),
        }
    }
}

impl RecordId {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Course(_) => "course",
            Self::Assessment(_) => "assessment",
            Self::Certificate(_) => "certificate",
        }
    }

    pub fn get(&self) -> u64 {
        match self {
            Self::Course(id) => id.get(),
            Self::Assessment(id) => id.get(),
            Self::Certificate(id) => id.get(),
        }
    }

    /// Zero is never allocated, so it cannot name a record.
    pub fn check_allocatable(&self) -> Result<(), TypeError> {
        if self.get() == 0 {
            return Err(TypeError::InvalidId {
                kind: self.kind(),
                input: self.to_string(),
            });
        }
        Ok(())
    }
}

impl From<CourseId> for RecordId {
    fn from(id: CourseId) -> Self {
        Self::Course(id)
    }
}

impl From<AssessmentId> for RecordId {
    fn from(id: AssessmentId) -> Self {
        Self::Assessment(id)
    }
}

impl From<CertificateId> for RecordId {
    fn from(id: CertificateId) -> Self {
        Self::Certificate(id)
    }
}

/// Monotonic id counter scoped to one ledger instance.
///
/// Starts at 1 and never hands out the same value twice, even if the record
/// that received it is later deleted.
pub struct IdAllocator<T> {
    next: u64,
    _kind: PhantomData<fn() -> T>,
}

impl<T: From<u64>> IdAllocator<T> {
    pub fn new() -> Self {
        Self {
            next: 1,
            _kind: PhantomData,
        }
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> T {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        T::from(id)
    }

    /// The id the next call to [`IdAllocator::allocate`] will return.
    pub fn peek(&self) -> T {
        T::from(self.next)
    }
}

impl<T: From<u64>> Default for IdAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IdAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdAllocator(next={})", self.next)
    }
}
