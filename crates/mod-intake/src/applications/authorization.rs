use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ReviewConfig;

/// Capability deciding whether an applicant key may use the review endpoints.
///
/// Reviewer management is optional: the default methods describe a fixed policy with no
/// owners, so plain closures can still act as policies.
pub trait ReviewerPolicy: Send + Sync {
    fn is_reviewer(&self, applicant_key: &str) -> bool;

    /// Owners may grant and revoke reviewer access.
    fn is_owner(&self, _applicant_key: &str) -> bool {
        false
    }

    /// Returns `true` when the key was not a reviewer before.
    fn grant(&self, _applicant_key: &str) -> Result<bool, ReviewerError> {
        Err(ReviewerError::ReadOnly)
    }

    fn revoke(&self, _applicant_key: &str) -> Result<(), ReviewerError> {
        Err(ReviewerError::ReadOnly)
    }

    fn reviewers(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<F> ReviewerPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_reviewer(&self, applicant_key: &str) -> bool {
        self(applicant_key)
    }
}

/// Error raised when changing the reviewer list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewerError {
    #[error("reviewer key must not be empty")]
    EmptyKey,
    #[error("{0} is not a reviewer")]
    NotAReviewer(String),
    #[error("{0} is the last owner and cannot be removed")]
    LastOwner(String),
    #[error("reviewer list is fixed")]
    ReadOnly,
}

#[derive(Debug, Default)]
struct Roster {
    owners: BTreeSet<String>,
    reviewers: BTreeSet<String>,
}

/// Reviewer keys compared case-insensitively. Owners are always reviewers and can extend
/// the list at runtime.
#[derive(Debug, Default)]
pub struct ReviewerAllowlist {
    roster: RwLock<Roster>,
}

fn normalize(applicant_key: &str) -> Option<String> {
    let key = applicant_key.trim().to_lowercase();
    (!key.is_empty()).then_some(key)
}

fn normalize_all<I, S>(keys: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .filter_map(|key| normalize(key.as_ref()))
        .collect()
}

impl ReviewerAllowlist {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roster: RwLock::new(Roster {
                owners: BTreeSet::new(),
                reviewers: normalize_all(keys),
            }),
        }
    }

    pub fn with_owners<I, S>(self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roster = self.roster.into_inner().unwrap_or_else(PoisonError::into_inner);
        let owners = normalize_all(owners);
        roster.reviewers.extend(owners.iter().cloned());
        roster.owners.extend(owners);
        Self {
            roster: RwLock::new(roster),
        }
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(&config.reviewers).with_owners(&config.owners)
    }

    // The roster is rebuilt whole on each change, so a poisoned lock holds consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Roster> {
        self.roster.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Roster> {
        self.roster.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().reviewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().reviewers.is_empty()
    }

    pub fn owner_count(&self) -> usize {
        self.read().owners.len()
    }
}

impl ReviewerPolicy for ReviewerAllowlist {
    fn is_reviewer(&self, applicant_key: &str) -> bool {
        normalize(applicant_key).is_some_and(|key| self.read().reviewers.contains(&key))
    }

    fn is_owner(&self, applicant_key: &str) -> bool {
        normalize(applicant_key).is_some_and(|key| self.read().owners.contains(&key))
    }

    fn grant(&self, applicant_key: &str) -> Result<bool, ReviewerError> {
        let key = normalize(applicant_key).ok_or(ReviewerError::EmptyKey)?;
        Ok(self.write().reviewers.insert(key))
    }

    /// Revoking an owner also drops its owner rights, unless it is the last one.
    fn revoke(&self, applicant_key: &str) -> Result<(), ReviewerError> {
        let key = normalize(applicant_key).ok_or(ReviewerError::EmptyKey)?;
        let mut roster = self.write();

        if roster.owners.contains(&key) && roster.owners.len() == 1 {
            return Err(ReviewerError::LastOwner(key));
        }
        if !roster.reviewers.remove(&key) {
            return Err(ReviewerError::NotAReviewer(key));
        }
        roster.owners.remove(&key);
        Ok(())
    }

    fn reviewers(&self) -> Vec<String> {
        self.read().reviewers.iter().cloned().collect()
    }
}
