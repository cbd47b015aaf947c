//! Recipe selection among several candidates producing the same output.

use bomgraph_catalog::RankerPolicy;
use bomgraph_core::{CoProcess, Process};

use crate::error::EngineError;

/// Orders candidate recipes. The build engine only ever asks for the top
/// pick; the full ranking is there for reporting.
pub trait Ranker {
    fn rank_processes(&self, candidates: Vec<Process>) -> Vec<Process>;

    fn rank_co_processes(&self, candidates: Vec<CoProcess>) -> Vec<CoProcess>;

    fn top_process(&self, candidates: Vec<Process>) -> Result<Process, EngineError> {
        self.rank_processes(candidates)
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound("no candidate process".to_string()))
    }

    fn top_co_process(&self, candidates: Vec<CoProcess>) -> Result<CoProcess, EngineError> {
        self.rank_co_processes(candidates)
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound("no candidate co-process".to_string()))
    }
}

/// First recorded recipe wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstDeclared;

impl Ranker for FirstDeclared {
    fn rank_processes(&self, candidates: Vec<Process>) -> Vec<Process> {
        candidates
    }

    fn rank_co_processes(&self, candidates: Vec<CoProcess>) -> Vec<CoProcess> {
        candidates
    }
}

/// Shortest cycle time wins. Ties keep recorded order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestCycleTime;

impl Ranker for ShortestCycleTime {
    fn rank_processes(&self, mut candidates: Vec<Process>) -> Vec<Process> {
        candidates.sort_by(|a, b| a.cycle_time.total_cmp(&b.cycle_time));
        candidates
    }

    fn rank_co_processes(&self, candidates: Vec<CoProcess>) -> Vec<CoProcess> {
        candidates
    }
}

pub fn ranker_for(policy: RankerPolicy) -> Box<dyn Ranker> {
    match policy {
        RankerPolicy::First => Box::new(FirstDeclared),
        RankerPolicy::CycleTime => Box::new(ShortestCycleTime),
    }
}
