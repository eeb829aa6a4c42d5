//!
//! Persistent registry of training chains
//!
//! Maps each `JobId` to its append-only chain of `IterationRecord`s. The
//! registry is the unit of persistence between runs: schedulers classify
//! every stored chain (skip, requeue or reopen) on resume, so no partially
//! trained chain is ever silently dropped.
//!
use super::{IterationRecord, JobId};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

///
/// Append-only store of training-iteration chains keyed by `JobId`.
///
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobRegistry {
    chains: FnvHashMap<JobId, Vec<IterationRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        JobRegistry {
            chains: FnvHashMap::default(),
        }
    }
    ///
    /// Open an empty chain for a new job. Panics if the job already exists;
    /// existing chains are resumed, never re-registered.
    ///
    pub fn register(&mut self, job_id: &JobId) {
        let old = self.chains.insert(job_id.clone(), Vec::new());
        assert!(old.is_none(), "job {} registered twice", job_id);
    }
    ///
    /// Append a finished iteration to the job's chain.
    ///
    /// Iteration numbers must be strictly increasing within a chain.
    ///
    pub fn append(&mut self, job_id: &JobId, record: IterationRecord) {
        let chain = self
            .chains
            .get_mut(job_id)
            .unwrap_or_else(|| panic!("job {} is not registered", job_id));
        if let Some(last) = chain.last() {
            assert!(
                record.iteration > last.iteration,
                "job {} iteration {} after {}",
                job_id,
                record.iteration,
                last.iteration
            );
        }
        chain.push(record);
    }
    pub fn contains(&self, job_id: &JobId) -> bool {
        self.chains.contains_key(job_id)
    }
    ///
    /// Full chain of a job, oldest first.
    ///
    pub fn chain(&self, job_id: &JobId) -> Option<&[IterationRecord]> {
        self.chains.get(job_id).map(|chain| chain.as_slice())
    }
    ///
    /// Last record of a job's chain. `None` for unknown jobs and for
    /// registered chains with no completed iteration yet.
    ///
    pub fn last(&self, job_id: &JobId) -> Option<&IterationRecord> {
        self.chains.get(job_id).and_then(|chain| chain.last())
    }
    pub fn job_ids(&self) -> impl Iterator<Item = &JobId> {
        self.chains.keys()
    }
    ///
    /// Clear the converged flag of the job's last record so the chain
    /// becomes eligible for further iteration. The chain history itself is
    /// untouched.
    ///
    pub fn reopen_last(&mut self, job_id: &JobId) {
        let record = self
            .chains
            .get_mut(job_id)
            .and_then(|chain| chain.last_mut())
            .unwrap_or_else(|| panic!("job {} has no record to reopen", job_id));
        record.converged = false;
    }
    ///
    /// Drop every chain whose job does not satisfy the predicate. Used to
    /// prune losing survey configurations before global-search planning.
    ///
    pub fn retain<F: FnMut(&JobId) -> bool>(&mut self, mut keep: F) {
        self.chains.retain(|job_id, _| keep(job_id));
    }
    pub fn len(&self) -> usize {
        self.chains.len()
    }
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
    //
    // persistence
    //
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        serde_json::to_writer(&mut file, self)?;
        Ok(())
    }
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let registry = serde_json::from_reader(file)?;
        Ok(registry)
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PartitionLabel;
    use crate::hmm::HmmModel;

    fn job(replicate: usize) -> JobId {
        JobId::new(PartitionLabel::new("exonic"), 2, 0, replicate)
    }
    fn record(iteration: usize, converged: bool) -> IterationRecord {
        IterationRecord::new(iteration, HmmModel::uniform(2, 4), -10.0, 0.5, converged)
    }

    #[test]
    fn register_append_last() {
        let mut registry = JobRegistry::new();
        let id = job(0);
        assert!(!registry.contains(&id));
        registry.register(&id);
        assert!(registry.contains(&id));
        assert!(registry.last(&id).is_none());

        registry.append(&id, record(1, false));
        registry.append(&id, record(2, true));
        let chain = registry.chain(&id).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(registry.last(&id).unwrap().iteration, 2);
        assert!(registry.last(&id).unwrap().converged);
    }
    #[test]
    #[should_panic]
    fn register_twice_panics() {
        let mut registry = JobRegistry::new();
        registry.register(&job(0));
        registry.register(&job(0));
    }
    #[test]
    #[should_panic]
    fn append_out_of_order_panics() {
        let mut registry = JobRegistry::new();
        let id = job(0);
        registry.register(&id);
        registry.append(&id, record(2, false));
        registry.append(&id, record(2, false));
    }
    #[test]
    fn reopen_clears_converged_flag_only() {
        let mut registry = JobRegistry::new();
        let id = job(1);
        registry.register(&id);
        registry.append(&id, record(1, false));
        registry.append(&id, record(2, true));
        registry.reopen_last(&id);
        let chain = registry.chain(&id).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(!chain[1].converged);
        assert_eq!(chain[1].iteration, 2);
    }
    #[test]
    fn retain_prunes_chains() {
        let mut registry = JobRegistry::new();
        for replicate in 0..4 {
            registry.register(&job(replicate));
        }
        registry.retain(|job_id| job_id.replicate < 2);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&job(0)));
        assert!(!registry.contains(&job(3)));
    }
    #[test]
    fn json_roundtrip() {
        let mut registry = JobRegistry::new();
        for replicate in 0..3 {
            let id = job(replicate);
            registry.register(&id);
            registry.append(&id, record(1, replicate == 0));
        }
        let json = registry.to_json();
        let back = JobRegistry::from_json(&json).unwrap();
        assert_eq!(back.len(), 3);
        assert!(back.last(&job(0)).unwrap().converged);
        assert!(!back.last(&job(1)).unwrap().converged);
    }
    #[test]
    fn file_roundtrip() {
        let mut registry = JobRegistry::new();
        let id = job(0);
        registry.register(&id);
        registry.append(&id, record(1, false));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        registry.to_json_file(&path).unwrap();
        let back = JobRegistry::from_json_file(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.last(&id).unwrap().iteration, 1);
    }
}
