//! Fixed-size worker pool driven by a single scheduler loop.
//!
//! The scheduler owns the pending queue, reads each chunk's bytes and hands
//! them to an idle worker over that worker's own channel. Workers only see
//! their chunk buffer and shared read-only state; their candidate lists come
//! back as completion messages and are folded into the [`ResultMerger`] on the
//! scheduler thread.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::{self, Receiver, Sender};

use pcd_core::error::{Error, Result};
use pcd_core::matching::{MatchCandidate, RunStats};
use pcd_core::pointcloud::chunk::ChunkDescriptor;
use pcd_parser::reader::las::ChunkDecoder;
use pcd_parser::reader::ChunkReader;

use crate::matcher::NearestNeighborMatcher;
use crate::merger::ResultMerger;

/// A chunk's bytes, owned by exactly one worker while it is processed.
#[derive(Debug)]
pub struct ChunkJob {
    pub chunk: ChunkDescriptor,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutput {
    pub chunk_index: usize,
    pub points: u32,
    pub ground_points: usize,
    pub candidates: Vec<MatchCandidate>,
}

/// Decode-and-match step run by the workers. Holds no per-chunk state.
#[derive(Debug, Clone, Copy)]
pub struct ChunkProcessor<'a> {
    decoder: ChunkDecoder,
    matcher: NearestNeighborMatcher<'a>,
}

impl<'a> ChunkProcessor<'a> {
    pub fn new(decoder: ChunkDecoder, matcher: NearestNeighborMatcher<'a>) -> Self {
        Self { decoder, matcher }
    }

    pub fn process(&self, job: ChunkJob) -> Result<ChunkOutput> {
        let ChunkJob { chunk, bytes } = job;
        let ground = self.decoder.decode(&bytes, &chunk)?;
        drop(bytes);

        let candidates = self.matcher.match_points(&ground);
        Ok(ChunkOutput {
            chunk_index: chunk.index,
            points: chunk.point_count,
            ground_points: ground.len(),
            candidates,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy { chunk: usize },
}

struct WorkerMessage {
    worker: usize,
    output: Result<ChunkOutput>,
}

fn worker_loop(
    worker: usize,
    jobs: Receiver<ChunkJob>,
    done: Sender<WorkerMessage>,
    processor: &ChunkProcessor<'_>,
) {
    for job in jobs.iter() {
        let chunk_index = job.chunk.index;
        let output = panic::catch_unwind(AssertUnwindSafe(|| processor.process(job)))
            .unwrap_or_else(|_| {
                Err(Error::WorkerPanicked(format!(
                    "worker {} panicked on chunk {}",
                    worker, chunk_index
                )))
            });
        if done.send(WorkerMessage { worker, output }).is_err() {
            // the scheduler gave up on the run
            break;
        }
    }
}

pub struct Scheduler<R> {
    pending: VecDeque<ChunkDescriptor>,
    workers: Vec<WorkerState>,
    in_flight: usize,
    total_chunks: usize,
    reader: R,
    merger: ResultMerger,
    stats: RunStats,
}

impl<R: ChunkReader> Scheduler<R> {
    pub fn new(
        chunks: Vec<ChunkDescriptor>,
        worker_count: usize,
        reader: R,
        merger: ResultMerger,
    ) -> Self {
        Self {
            total_chunks: chunks.len(),
            pending: chunks.into(),
            workers: vec![WorkerState::Idle; worker_count.max(1)],
            in_flight: 0,
            reader,
            merger,
            stats: RunStats::default(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn worker_states(&self) -> &[WorkerState] {
        &self.workers
    }

    fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }

    fn idle_worker(&self) -> Option<usize> {
        self.workers.iter().position(|w| *w == WorkerState::Idle)
    }

    /// Hands pending chunks to idle workers until one of the two runs out.
    fn dispatch(&mut self, job_senders: &[Sender<ChunkJob>]) -> Result<()> {
        while let Some(worker) = self.idle_worker() {
            let Some(chunk) = self.pending.pop_front() else {
                break;
            };
            let bytes = self.reader.read_chunk(&chunk)?;
            job_senders[worker]
                .send(ChunkJob { chunk, bytes })
                .map_err(|_| {
                    Error::WorkerPanicked(format!("worker {} stopped accepting chunks", worker))
                })?;

            log::debug!(
                "dispatched chunk {} (points {}..{}) to worker {}",
                chunk.index,
                chunk.first_point,
                chunk.first_point + chunk.point_count as u64,
                worker
            );
            self.workers[worker] = WorkerState::Busy { chunk: chunk.index };
            self.in_flight += 1;
        }
        Ok(())
    }

    fn complete(&mut self, message: WorkerMessage) -> Result<()> {
        self.in_flight -= 1;
        self.workers[message.worker] = WorkerState::Idle;

        let output = message.output?;
        self.merger.merge(&output.candidates);

        self.stats.chunks += 1;
        self.stats.points += output.points as u64;
        self.stats.ground_points += output.ground_points as u64;
        self.stats.candidates += output.candidates.len() as u64;

        log::debug!(
            "chunk {} done on worker {}: {} ground points, {} candidates",
            output.chunk_index,
            message.worker,
            output.ground_points,
            output.candidates.len()
        );
        let step = (self.total_chunks / 10).max(1);
        if self.stats.chunks % step == 0 || self.stats.chunks == self.total_chunks {
            log::info!(
                "processed {}/{} chunks ({} points)",
                self.stats.chunks,
                self.total_chunks,
                self.stats.points
            );
        }
        Ok(())
    }

    /// Runs every chunk to completion. The first failing chunk aborts the run
    /// and no partial table is returned.
    pub fn run(mut self, processor: &ChunkProcessor<'_>) -> Result<(ResultMerger, RunStats)> {
        let worker_count = self.workers.len();

        let scope_result = crossbeam::scope(|s| -> Result<()> {
            let (done_tx, done_rx) = channel::unbounded::<WorkerMessage>();
            let mut job_senders = Vec::with_capacity(worker_count);

            for worker in 0..worker_count {
                let (job_tx, job_rx) = channel::bounded::<ChunkJob>(1);
                let done_tx = done_tx.clone();
                s.builder()
                    .name(format!("chunk-worker-{}", worker))
                    .spawn(move |_| worker_loop(worker, job_rx, done_tx, processor))?;
                job_senders.push(job_tx);
            }
            drop(done_tx);

            loop {
                self.dispatch(&job_senders)?;
                if self.is_complete() {
                    return Ok(());
                }
                let message = done_rx.recv().map_err(|_| {
                    Error::WorkerPanicked("all workers exited with chunks in flight".to_string())
                })?;
                self.complete(message)?;
            }
        });

        match scope_result {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::WorkerPanicked(
                    "a worker thread panicked outside chunk processing".to_string(),
                ))
            }
        }

        Ok((self.merger, self.stats))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pcd_core::error::DecodeError;
    use pcd_core::pointcloud::header::PointCloudHeader;
    use pcd_core::pointcloud::point::CloudPoint;
    use pcd_core::survey::SurveyPoint;
    use pcd_parser::reader::las::{plan_chunks, read_header, LasBuilder, LasChunkReader, RecordLayout};

    use super::*;
    use crate::index::QueryIndex;

    struct Fixture {
        header: PointCloudHeader,
        bytes: Vec<u8>,
        index: QueryIndex,
        survey_len: usize,
    }

    fn fixture() -> Fixture {
        let cloud: Vec<CloudPoint> = (0..200)
            .map(|i| CloudPoint {
                index: i,
                x: (i % 20) as f64,
                y: (i / 20) as f64,
                z: i as f64 * 0.25,
                classification: if i % 3 == 0 { 1 } else { 2 },
            })
            .collect();
        let bytes = LasBuilder::new([0.01; 3], [0.0; 3]).build(&cloud).unwrap();
        let header = read_header(&mut Cursor::new(&bytes)).unwrap();

        let survey: Vec<SurveyPoint> = (0..40)
            .map(|id| SurveyPoint {
                id,
                x: (id % 10) as f64 * 2.0 + 0.3,
                y: (id / 10) as f64 * 2.0 + 0.4,
                z: 1.0,
            })
            .collect();
        let index = QueryIndex::build(&survey).unwrap();

        Fixture {
            header,
            bytes,
            index,
            survey_len: survey.len(),
        }
    }

    fn run(
        fixture: &Fixture,
        reader: impl ChunkReader,
        workers: usize,
        chunk_points: u32,
    ) -> Result<(ResultMerger, RunStats)> {
        let decoder = ChunkDecoder::new(RecordLayout::from(&fixture.header), Some(2));
        let matcher = NearestNeighborMatcher::new(&fixture.index, 1.0);
        let processor = ChunkProcessor::new(decoder, matcher);
        let chunks = plan_chunks(&fixture.header, chunk_points).unwrap();
        Scheduler::new(chunks, workers, reader, ResultMerger::new(fixture.survey_len))
            .run(&processor)
    }

    /// Serves chunks from memory, cutting one chunk short.
    struct TruncatingReader {
        inner: LasChunkReader<Cursor<Vec<u8>>>,
        truncate_chunk: usize,
    }

    impl ChunkReader for TruncatingReader {
        fn read_chunk(&mut self, chunk: &ChunkDescriptor) -> Result<Vec<u8>> {
            let mut bytes = self.inner.read_chunk(chunk)?;
            if chunk.index == self.truncate_chunk {
                bytes.pop();
            }
            Ok(bytes)
        }
    }

    struct FailingReader;

    impl ChunkReader for FailingReader {
        fn read_chunk(&mut self, _chunk: &ChunkDescriptor) -> Result<Vec<u8>> {
            Err(std::io::Error::other("disk went away").into())
        }
    }

    #[test]
    fn processes_every_chunk() {
        let fixture = fixture();
        let reader = LasChunkReader::new(Cursor::new(fixture.bytes.clone()));
        let (merger, stats) = run(&fixture, reader, 4, 7).unwrap();

        assert_eq!(stats.chunks, 29);
        assert_eq!(stats.points, 200);
        assert_eq!(stats.ground_points, 200 - 67);
        assert!(stats.candidates > 0);
        assert_eq!(merger.merged_count(), stats.candidates);
        assert!(merger.found_count() > 0);
    }

    #[test]
    fn worker_count_does_not_change_results() {
        let fixture = fixture();
        let (single, single_stats) = run(
            &fixture,
            LasChunkReader::new(Cursor::new(fixture.bytes.clone())),
            1,
            200,
        )
        .unwrap();

        for (workers, chunk_points) in [(2, 1), (3, 9), (8, 16), (16, 50)] {
            let (pooled, pooled_stats) = run(
                &fixture,
                LasChunkReader::new(Cursor::new(fixture.bytes.clone())),
                workers,
                chunk_points,
            )
            .unwrap();
            assert_eq!(pooled.results(), single.results());
            assert_eq!(pooled_stats.ground_points, single_stats.ground_points);
            assert_eq!(pooled_stats.candidates, single_stats.candidates);
        }
    }

    #[test]
    fn corrupt_chunk_aborts_the_run() {
        let fixture = fixture();
        let reader = TruncatingReader {
            inner: LasChunkReader::new(Cursor::new(fixture.bytes.clone())),
            truncate_chunk: 5,
        };
        match run(&fixture, reader, 4, 10) {
            Err(Error::Decode(DecodeError {
                chunk,
                expected,
                actual,
                ..
            })) => {
                assert_eq!(chunk, 5);
                assert_eq!(expected, 200);
                assert_eq!(actual, 199);
            }
            other => panic!("expected decode error, got {:?}", other.map(|(_, s)| s)),
        }
    }

    #[test]
    fn read_failure_aborts_the_run() {
        let fixture = fixture();
        assert!(matches!(
            run(&fixture, FailingReader, 2, 10),
            Err(Error::Io(_))
        ));
    }

    /// Hands out zeroed buffers of the planned length.
    struct ZeroReader;

    impl ChunkReader for ZeroReader {
        fn read_chunk(&mut self, chunk: &ChunkDescriptor) -> Result<Vec<u8>> {
            Ok(vec![0u8; chunk.byte_length as usize])
        }
    }

    #[test]
    fn panicking_chunk_aborts_the_run() {
        let fixture = fixture();
        // records too short to hold three coordinates make the decoder panic
        let layout = RecordLayout {
            record_length: 10,
            scale: [1.0; 3],
            offset: [0.0; 3],
        };
        let processor = ChunkProcessor::new(
            ChunkDecoder::new(layout, Some(2)),
            NearestNeighborMatcher::new(&fixture.index, 1.0),
        );
        let chunks = vec![ChunkDescriptor {
            index: 0,
            first_point: 0,
            byte_start: 227,
            byte_length: 20,
            point_count: 2,
        }];
        let scheduler = Scheduler::new(chunks, 1, ZeroReader, ResultMerger::new(fixture.survey_len));

        match scheduler.run(&processor) {
            Err(Error::WorkerPanicked(message)) => {
                assert!(message.contains("worker 0"), "{}", message);
                assert!(message.contains("chunk 0"), "{}", message);
            }
            other => panic!("expected worker panic, got {:?}", other.map(|(_, s)| s)),
        }
    }

    #[test]
    fn empty_plan_completes_immediately() {
        let fixture = fixture();
        let decoder = ChunkDecoder::new(RecordLayout::from(&fixture.header), Some(2));
        let processor = ChunkProcessor::new(decoder, NearestNeighborMatcher::new(&fixture.index, 1.0));
        let scheduler = Scheduler::new(
            Vec::new(),
            3,
            FailingReader,
            ResultMerger::new(fixture.survey_len),
        );
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.in_flight(), 0);
        assert!(scheduler
            .worker_states()
            .iter()
            .all(|w| *w == WorkerState::Idle));

        let (merger, stats) = scheduler.run(&processor).unwrap();
        assert_eq!(stats, RunStats::default());
        assert_eq!(merger.found_count(), 0);
    }
}
