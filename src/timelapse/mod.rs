//! Timelapse conversion by frame decimation.
//!
//! A finished raw recording is streamed frame-by-frame into a new file,
//! keeping exactly one frame out of every `speed_factor`. Order is
//! preserved and the output plays at the source frame rate, so the speed-up
//! comes purely from the omitted frames.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::video::encoder::{discard_output, TimelapseSink};
use crate::video::{FrameSink, FrameSource, VideoFileSource};

/// Counters reported by a decimation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecimationStats {
    pub frames_read: u64,
    pub frames_written: u64,
}

/// The index filter at the heart of the conversion: forwards frames at
/// zero-based indices `0, N, 2N, ...` from `source` to `sink`, in order,
/// holding at most one frame in memory at a time.
pub fn decimate<S, K>(source: &mut S, sink: &mut K, speed_factor: u32) -> Result<DecimationStats>
where
    S: FrameSource,
    K: FrameSink<Frame = S::Frame>,
{
    debug_assert!(speed_factor >= 1);
    let mut stats = DecimationStats::default();

    while let Some(frame) = source.next_frame()? {
        if stats.frames_read % u64::from(speed_factor) == 0 {
            sink.write_frame(frame)?;
            stats.frames_written += 1;
        }
        stats.frames_read += 1;
    }

    Ok(stats)
}

/// One-shot timelapse conversion job.
pub struct Decimator {
    speed_factor: u32,
}

impl Decimator {
    /// `speed_factor` N >= 1; N = 1 produces a full re-encoded copy.
    pub fn new(speed_factor: u32) -> Result<Self> {
        if speed_factor == 0 {
            return Err(Error::InvalidArgument("speed_factor must be at least 1".into()));
        }
        Ok(Self { speed_factor })
    }

    pub fn speed_factor(&self) -> u32 {
        self.speed_factor
    }

    /// Convert `input` into a sped-up `output`.
    ///
    /// Fails with [`Error::NotFound`] before anything is opened when the
    /// input does not exist, and with [`Error::EmptyInput`] when the input
    /// decodes to zero frames. On every failure path the partially written
    /// output is removed; decoder and encoder handles are released by drop
    /// on all paths.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        if !input.exists() {
            return Err(Error::NotFound(input.to_path_buf()));
        }

        log::info!(
            "converting {} -> {} at speed factor {}",
            input.display(),
            output.display(),
            self.speed_factor
        );

        let mut source = VideoFileSource::open(input)?;
        let mut sink = TimelapseSink::open(
            output,
            source.pixel_format(),
            source.width(),
            source.height(),
            source.time_base(),
            self.speed_factor,
        )?;

        let outcome = decimate(&mut source, &mut sink, self.speed_factor);
        let stats = seal(sink, outcome, input, output)?;

        log::info!(
            "timelapse complete: kept {} of {} frames",
            stats.frames_written,
            stats.frames_read
        );
        Ok(output.to_path_buf())
    }
}

/// Close out a conversion. A streaming error or a source that yielded zero
/// frames drops the sink and removes the partial output; otherwise the
/// container is finalized. Returns the stats of a successful pass.
fn seal<K: FrameSink>(
    mut sink: K,
    outcome: Result<DecimationStats>,
    input: &Path,
    output: &Path,
) -> Result<DecimationStats> {
    let stats = match outcome {
        Ok(stats) => stats,
        Err(e) => {
            drop(sink);
            discard_output(output);
            return Err(e);
        }
    };

    if stats.frames_read == 0 {
        drop(sink);
        discard_output(output);
        return Err(Error::EmptyInput(input.to_path_buf()));
    }

    if let Err(e) = sink.finish() {
        discard_output(output);
        return Err(e);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::{FrameSink, FrameSource};

    struct VecSource {
        frames: Vec<u32>,
        cursor: usize,
    }

    impl VecSource {
        fn new(count: u32) -> Self {
            Self {
                frames: (0..count).collect(),
                cursor: 0,
            }
        }
    }

    impl FrameSource for VecSource {
        type Frame = u32;

        fn next_frame(&mut self) -> Result<Option<u32>> {
            let frame = self.frames.get(self.cursor).copied();
            self.cursor += 1;
            Ok(frame)
        }
    }

    #[derive(Default)]
    struct VecSink {
        frames: Vec<u32>,
        finished: std::sync::Arc<std::sync::Mutex<bool>>,
    }

    impl FrameSink for VecSink {
        type Frame = u32;

        fn write_frame(&mut self, frame: u32) -> Result<()> {
            self.frames.push(frame);
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            *self.finished.lock().unwrap() = true;
            Ok(())
        }
    }

    #[test]
    fn test_keeps_every_nth_frame_in_order() {
        let mut source = VecSource::new(10);
        let mut sink = VecSink::default();
        let stats = decimate(&mut source, &mut sink, 3).unwrap();

        assert_eq!(stats.frames_read, 10);
        assert_eq!(stats.frames_written, 4);
        assert_eq!(sink.frames, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_output_count_is_ceil_of_source_over_n() {
        for count in [1u32, 2, 9, 10, 11, 30, 31] {
            for n in [1u32, 2, 3, 10] {
                let mut source = VecSource::new(count);
                let mut sink = VecSink::default();
                let stats = decimate(&mut source, &mut sink, n).unwrap();
                let expected = (u64::from(count)).div_ceil(u64::from(n));
                assert_eq!(stats.frames_written, expected, "count={count} n={n}");
                assert_eq!(sink.frames.len() as u64, expected);
            }
        }
    }

    #[test]
    fn test_speed_factor_one_is_identity() {
        let mut source = VecSource::new(7);
        let mut sink = VecSink::default();
        let stats = decimate(&mut source, &mut sink, 1).unwrap();
        assert_eq!(stats.frames_written, 7);
        assert_eq!(sink.frames, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_first_frame_always_kept() {
        let mut source = VecSource::new(5);
        let mut sink = VecSink::default();
        decimate(&mut source, &mut sink, 100).unwrap();
        assert_eq!(sink.frames, vec![0]);
    }

    #[test]
    fn test_empty_source_writes_nothing() {
        let mut source = VecSource::new(0);
        let mut sink = VecSink::default();
        let stats = decimate(&mut source, &mut sink, 10).unwrap();
        assert_eq!(stats, DecimationStats::default());
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn test_example_scenario_thirty_frames_at_ten_x() {
        // 3 s of capture at 10 fps, converted with speed_factor 10
        let mut source = VecSource::new(30);
        let mut sink = VecSink::default();
        let stats = decimate(&mut source, &mut sink, 10).unwrap();
        assert_eq!(stats.frames_written, 3);
        assert_eq!(sink.frames, vec![0, 10, 20]);
    }

    #[test]
    fn test_zero_speed_factor_rejected() {
        assert!(matches!(Decimator::new(0), Err(Error::InvalidArgument(_))));
        assert!(Decimator::new(1).is_ok());
    }

    #[test]
    fn test_zero_frame_source_raises_empty_input_and_discards_output() {
        let output = std::env::temp_dir().join("lapsify_test_seal_empty.mp4");
        std::fs::write(&output, b"partial").unwrap();
        let input = Path::new("drained.mp4");

        let result = seal(VecSink::default(), Ok(DecimationStats::default()), input, &output);
        match result {
            Err(Error::EmptyInput(path)) => assert_eq!(path, input),
            other => panic!("expected EmptyInput, got {other:?}"),
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_streaming_failure_discards_output() {
        let output = std::env::temp_dir().join("lapsify_test_seal_failed.mp4");
        std::fs::write(&output, b"partial").unwrap();

        let outcome = Err(Error::Capture("decode stalled".into()));
        let result = seal(VecSink::default(), outcome, Path::new("in.mp4"), &output);
        assert!(matches!(result, Err(Error::Capture(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_successful_conversion_finalizes_sink_and_keeps_output() {
        let output = std::env::temp_dir().join("lapsify_test_seal_ok.mp4");
        std::fs::write(&output, b"frames").unwrap();

        let sink = VecSink::default();
        let finished = std::sync::Arc::clone(&sink.finished);
        let stats = DecimationStats {
            frames_read: 30,
            frames_written: 3,
        };
        assert_eq!(seal(sink, Ok(stats), Path::new("in.mp4"), &output).unwrap(), stats);
        assert!(*finished.lock().unwrap());
        assert!(output.exists());
        let _ = std::fs::remove_file(&output);
    }

    #[test]
    fn test_missing_input_fails_without_creating_output() {
        let dir = std::env::temp_dir();
        let input = dir.join("lapsify_test_missing_input.mp4");
        let output = dir.join("lapsify_test_missing_output.mp4");
        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&output);

        let decimator = Decimator::new(10).unwrap();
        match decimator.convert(&input, &output) {
            Err(Error::NotFound(path)) => assert_eq!(path, input),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
        assert!(!output.exists());
    }
}
