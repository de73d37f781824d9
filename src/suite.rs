//! Ranked container shared by the ground-model and dispersion suites.
//!
//! Rank is explicit: every member carries the identifier the engine gave it
//! and its misfit (when known). The position in the suite is the rank, and
//! the container never reorders members behind the caller's back.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked<T> {
    pub identifier: u64,
    pub misfit: Option<f64>,
    pub item: T,
}

impl<T> Ranked<T> {
    pub fn new(identifier: u64, misfit: Option<f64>, item: T) -> Self {
        Self {
            identifier,
            misfit,
            item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite<T> {
    members: Vec<Ranked<T>>,
}

impl<T> Default for Suite<T> {
    fn default() -> Self {
        Self { members: Vec::new() }
    }
}

impl<T> Suite<T> {
    pub fn new(members: Vec<Ranked<T>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Ranked<T>] {
        &self.members
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.members.iter().map(|m| &m.item)
    }

    pub fn get(&self, rank: usize) -> Option<&Ranked<T>> {
        self.members.get(rank)
    }

    pub fn push(&mut self, member: Ranked<T>) {
        self.members.push(member);
    }

    /// Insert keeping members in ascending misfit order.
    ///
    /// Members without a misfit sort after every member that has one.
    pub fn push_sorted(&mut self, member: Ranked<T>) {
        let key = member.misfit.unwrap_or(f64::INFINITY);
        let pos = self
            .members
            .partition_point(|m| m.misfit.unwrap_or(f64::INFINITY) <= key);
        self.members.insert(pos, member);
    }

    pub fn identifiers(&self) -> Vec<u64> {
        self.members.iter().map(|m| m.identifier).collect()
    }

    pub fn misfits(&self) -> Vec<Option<f64>> {
        self.members.iter().map(|m| m.misfit).collect()
    }

    /// Number of leading members to use when `nbest` are requested.
    pub(crate) fn clamp_nbest(&self, nbest: Option<usize>) -> usize {
        match nbest {
            None => self.members.len(),
            Some(n) if n > self.members.len() => {
                warn!(
                    requested = n,
                    available = self.members.len(),
                    "nbest exceeds suite size, using all members"
                );
                self.members.len()
            }
            Some(n) => n,
        }
    }

    /// Smallest and largest misfit over the `nbest` leading members.
    pub fn misfit_range(&self, nbest: Option<usize>) -> Result<(f64, f64)> {
        let n = self.clamp_nbest(nbest);
        let known: Vec<f64> = self.members[..n].iter().filter_map(|m| m.misfit).collect();
        if known.is_empty() {
            return Err(AppError::Statistics("no misfit values in suite".into()));
        }
        let min = known.iter().copied().fold(f64::INFINITY, f64::min);
        let max = known.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok((min, max))
    }

    /// `[min-max]` misfit label with two decimals.
    pub fn misfit_repr(&self, nbest: Option<usize>) -> Result<String> {
        let (min, max) = self.misfit_range(nbest)?;
        Ok(format!("[{min:.2}-{max:.2}]"))
    }
}

impl<T: Clone> Suite<T> {
    /// New suite holding the `nbest` leading members; `nbest` must be at least 1.
    pub fn nbest(&self, nbest: usize) -> Result<Self> {
        if nbest == 0 {
            return Err(AppError::input("nbest must be at least 1"));
        }
        let n = self.clamp_nbest(Some(nbest));
        Ok(Self {
            members: self.members[..n].to_vec(),
        })
    }
}
