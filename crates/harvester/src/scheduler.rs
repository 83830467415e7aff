use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use hrv_storage::{count_blocks, missing_block_ranges};

use crate::accumulate::Harvester;
use crate::error::HarvesterError;
use crate::metrics::CHAIN_HEAD;


/// Parent-chain budget per job execution. Longer stretches continue in
/// a re-enqueued job so one deep walk cannot starve the others.
const MAX_BLOCKS_PER_RUN: usize = 10;

/// Blocks examined per author backfill round.
const BACKFILL_BATCH: u32 = 256;


/// Unit of scheduled work. Jobs fan out follow-up jobs through the
/// queue instead of recursing.
#[derive(Debug, Clone)]
pub enum Job {
    /// Poll the finalized head and plan accumulation work.
    HarvestHead { check_gaps: bool },
    /// Walk parent links starting at `block_hash`, adding every block
    /// until `end_hash`, known ground or genesis.
    AccumulateChain {
        block_hash: String,
        end_hash: Option<String>,
    },
    /// Advance the sequencer over the next stretch of blocks.
    SequenceChain,
    /// Fill in block author indices from stored pre-runtime digests.
    BackfillAuthorIndex,
}


/// What a finished job accomplished, logged once by the dispatcher.
#[derive(Debug, Default)]
pub struct JobOutcome {
    /// Blocks or rows the job handled.
    pub count: usize,
    /// Last block hash the job touched, for chain walks.
    pub last_hash: Option<String>,
}

impl JobOutcome {
    fn counted(count: usize) -> Self {
        JobOutcome {
            count,
            last_hash: None,
        }
    }
}


pub struct Scheduler {
    harvester: Arc<Harvester>,
    workers: usize,
}

impl Scheduler {
    pub fn new(harvester: Arc<Harvester>, workers: usize) -> Self {
        Scheduler {
            harvester,
            workers: workers.max(1),
        }
    }

    /// Runs the dispatch loop forever.
    ///
    /// A ticker enqueues a head poll every `poll_interval`; jobs run on
    /// a bounded set of workers and push their follow-ups back into the
    /// queue. Job failures are logged, never fatal.
    pub async fn run(&self, poll_interval: Duration, check_gaps: bool) {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut running: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = jobs.send(Job::HarvestHead { check_gaps });
                }
                Some(job) = queue.recv() => {
                    while running.len() >= self.workers {
                        running.join_next().await;
                    }
                    let harvester = self.harvester.clone();
                    let jobs = jobs.clone();
                    running.spawn(async move {
                        execute(&harvester, job, &jobs).await;
                    });
                }
                Some(_) = running.join_next(), if !running.is_empty() => {}
            }
        }
    }
}


async fn execute(harvester: &Harvester, job: Job, jobs: &UnboundedSender<Job>) {
    let label = match &job {
        Job::HarvestHead { .. } => "harvest_head",
        Job::AccumulateChain { .. } => "accumulate_chain",
        Job::SequenceChain => "sequence_chain",
        Job::BackfillAuthorIndex => "backfill_author_index",
    };
    let result = match job {
        Job::HarvestHead { check_gaps } => harvest_head(harvester, check_gaps, jobs).await,
        Job::AccumulateChain {
            block_hash,
            end_hash,
        } => accumulate_chain(harvester, block_hash, end_hash, jobs).await,
        Job::SequenceChain => sequence_chain(harvester, jobs).await,
        Job::BackfillAuthorIndex => backfill_author_index(harvester).await,
    };
    match result {
        Ok(outcome) => {
            debug!(
                job = label,
                count = outcome.count,
                last_hash = outcome.last_hash.as_deref().unwrap_or(""),
                "job finished"
            );
        }
        Err(HarvesterError::UpstreamUnavailable(e)) => {
            warn!(job = label, error = %e, "node unavailable, job postponed until the next poll");
        }
        Err(e) => {
            error!(job = label, error = %e, "job failed");
        }
    }
}


/// Plans one harvest cycle against the current finalized head.
///
/// An empty store on a long chain is split into a few concurrent entry
/// points so the initial catch-up walks more than one chain segment.
async fn harvest_head(
    harvester: &Harvester,
    check_gaps: bool,
    jobs: &UnboundedSender<Job>,
) -> Result<JobOutcome, HarvesterError> {
    let head_hash = harvester.gateway().chain_head().await?;
    let head_number = harvester.gateway().block_number(&head_hash).await?;
    CHAIN_HEAD.set(head_number as i64);
    let mut planned = 0usize;

    let block_count = {
        let mut conn = harvester.db().pool().acquire().await?;
        count_blocks(&mut conn).await?
    };

    if check_gaps && block_count > 0 {
        let ranges = {
            let mut conn = harvester.db().pool().acquire().await?;
            missing_block_ranges(&mut conn).await?
        };
        for (gap_start, gap_end) in ranges {
            let Some(walk_from) = harvester.gateway().block_hash(gap_end).await? else {
                continue;
            };
            let walk_until = harvester.gateway().block_hash(gap_start).await?;
            debug!(gap_start, gap_end, "filling block gap");
            let _ = jobs.send(Job::AccumulateChain {
                block_hash: walk_from,
                end_hash: walk_until,
            });
            planned += 1;
        }
    }

    let _ = jobs.send(Job::SequenceChain);

    if block_count == 0 && head_number > 100 {
        let step = head_number / 4;
        for point in [step, 2 * step, 3 * step] {
            if let Some(hash) = harvester.gateway().block_hash(point).await? {
                let _ = jobs.send(Job::AccumulateChain {
                    block_hash: hash,
                    end_hash: None,
                });
                planned += 1;
            }
        }
    }

    let _ = jobs.send(Job::AccumulateChain {
        block_hash: head_hash.clone(),
        end_hash: None,
    });
    planned += 1;
    let _ = jobs.send(Job::BackfillAuthorIndex);

    info!(head = head_number, blocks = block_count, "harvest cycle planned");
    Ok(JobOutcome {
        count: planned,
        last_hash: Some(head_hash),
    })
}


/// Walks parent links from `block_hash`, accumulating as it goes.
///
/// Stops at `end_hash`, at genesis or at the first block that is
/// already in the store; hitting known ground means the chain below is
/// complete, so sequencing is kicked instead.
async fn accumulate_chain(
    harvester: &Harvester,
    block_hash: String,
    end_hash: Option<String>,
    jobs: &UnboundedSender<Job>,
) -> Result<JobOutcome, HarvesterError> {
    let mut current = block_hash;
    let mut added = 0usize;
    let mut last_added = None;

    for _ in 0..MAX_BLOCKS_PER_RUN {
        match harvester.add_block(&current).await {
            Ok(block) => {
                added += 1;
                last_added = Some(current.clone());
                if end_hash.as_deref() == Some(current.as_str()) || block.id == 0 {
                    debug!(added, block = block.id, "chain walk reached its target");
                    return Ok(JobOutcome {
                        count: added,
                        last_hash: last_added,
                    });
                }
                current = block.parent_hash;
            }
            Err(HarvesterError::AlreadyAdded(hash)) => {
                debug!(block_hash = %hash, added, "chain walk hit known ground");
                let _ = jobs.send(Job::SequenceChain);
                return Ok(JobOutcome {
                    count: added,
                    last_hash: last_added,
                });
            }
            Err(e) => return Err(e),
        }
    }

    let _ = jobs.send(Job::AccumulateChain {
        block_hash: current,
        end_hash,
    });
    Ok(JobOutcome {
        count: added,
        last_hash: last_added,
    })
}


/// Sequences up to one budget's worth of blocks, re-enqueueing itself
/// while more are ready.
async fn sequence_chain(
    harvester: &Harvester,
    jobs: &UnboundedSender<Job>,
) -> Result<JobOutcome, HarvesterError> {
    let mut sequenced = 0usize;
    for _ in 0..MAX_BLOCKS_PER_RUN {
        match harvester.sequence_next().await {
            Ok(Some(_)) => sequenced += 1,
            Ok(None) => {
                debug!(sequenced, "sequencer caught up");
                return Ok(JobOutcome::counted(sequenced));
            }
            Err(HarvesterError::AlreadySequenced(id)) => {
                debug!(block = id, "another worker holds the sequencer");
                return Ok(JobOutcome::counted(sequenced));
            }
            Err(HarvesterError::ChainNotAtGenesis(lowest)) => {
                debug!(lowest, "sequencer waits for accumulation to reach genesis");
                return Ok(JobOutcome::counted(sequenced));
            }
            Err(e) => return Err(e),
        }
    }
    let _ = jobs.send(Job::SequenceChain);
    Ok(JobOutcome::counted(sequenced))
}


/// Sets `account_index` on blocks that still lack it, reading the BABE
/// pre-runtime digest stored with the block.
async fn backfill_author_index(harvester: &Harvester) -> Result<JobOutcome, HarvesterError> {
    let updated = harvester.backfill_author_indices(BACKFILL_BATCH).await?;
    if updated > 0 {
        info!(updated, "block author indices backfilled");
    }
    Ok(JobOutcome::counted(updated))
}
