//! The live recording session and its capture loop.
//!
//! A [`RecordingSession`] owns exactly one worker thread that grabs the
//! configured region, composites the cursor, and writes frames to the video
//! sink at a paced rate. The session is a value: starting hands it to the
//! controller, stopping consumes it, joins the worker and guarantees the
//! sink is flushed and closed before returning. "One session at a time" is
//! therefore an ownership fact, not a global flag.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::capture::cursor::{PointerSource, composite_cursor};
use crate::capture::frame::{CaptureRegion, Frame};
use crate::capture::grabber::ScreenGrabber;
use crate::capture::pacing::{Clock, FramePacer, SystemClock};
use crate::error::{Error, Result};
use crate::video::encoder::RecordingSink;
use crate::video::FrameSink;

/// Everything a session needs to run, fixed for its whole lifetime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub output_file: PathBuf,
    pub target_fps: u32,
    pub region: CaptureRegion,
}

/// Error-channel callback for the capture loop. Transient per-frame
/// failures are delivered here instead of aborting the recording, and each
/// composited frame passes through `on_frame` before being written, which
/// is how a shell renders a live preview. Implementations must be cheap;
/// they run on the capture thread inside the frame budget.
pub trait CaptureObserver: Send + 'static {
    fn on_frame_error(&self, error: &Error);

    fn on_frame(&self, _frame: &Frame) {}
}

/// Default observer: routes transient errors to the log and drops preview
/// frames.
#[derive(Debug, Default)]
pub struct LogObserver;

impl CaptureObserver for LogObserver {
    fn on_frame_error(&self, error: &Error) {
        log::warn!("recording continues after frame error: {error}");
    }
}

/// A live recording: one worker thread writing to one output file.
pub struct RecordingSession {
    config: SessionConfig,
    recording: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl RecordingSession {
    /// Open the sink and spawn the capture worker. A sink that cannot be
    /// opened fails here, before any thread exists.
    pub fn start<G, P, O>(
        config: SessionConfig,
        grabber: G,
        pointer: P,
        observer: O,
    ) -> Result<Self>
    where
        G: ScreenGrabber + 'static,
        P: PointerSource + 'static,
        O: CaptureObserver,
    {
        let sink = RecordingSink::open(
            &config.output_file,
            config.region.width,
            config.region.height,
            config.target_fps,
        )?;
        log::info!(
            "recording {}x{} at {} fps ({}) to {}",
            config.region.width,
            config.region.height,
            config.target_fps,
            sink.codec_name(),
            config.output_file.display()
        );
        Self::start_with_sink(config, sink, grabber, pointer, SystemClock, observer)
    }

    /// Spawn the worker around an already-open sink. Split out so tests can
    /// drive the loop with an in-memory sink and a mock clock.
    pub(crate) fn start_with_sink<S, G, P, C, O>(
        config: SessionConfig,
        sink: S,
        grabber: G,
        pointer: P,
        clock: C,
        observer: O,
    ) -> Result<Self>
    where
        S: FrameSink<Frame = Frame> + Send + 'static,
        G: ScreenGrabber + 'static,
        P: PointerSource + 'static,
        C: Clock + 'static,
        O: CaptureObserver,
    {
        let recording = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&recording);
        let loop_config = config.clone();

        let worker = std::thread::Builder::new()
            .name("capture-loop".into())
            .spawn(move || capture_loop(loop_config, sink, grabber, pointer, clock, observer, flag))
            .map_err(Error::Io)?;

        Ok(Self {
            config,
            recording,
            worker: Some(worker),
        })
    }

    pub fn output_file(&self) -> &Path {
        &self.config.output_file
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Signal the worker and block until it has exited and the sink is
    /// closed. After this returns the output file is safe to read. Consumes
    /// the session, so a second stop cannot exist.
    pub fn stop(mut self) -> PathBuf {
        self.shutdown();
        self.config.output_file.clone()
    }

    fn shutdown(&mut self) {
        self.recording.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("capture worker panicked");
            }
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn capture_loop<S, G, P, C, O>(
    config: SessionConfig,
    mut sink: S,
    mut grabber: G,
    pointer: P,
    clock: C,
    observer: O,
    recording: Arc<AtomicBool>,
) where
    S: FrameSink<Frame = Frame>,
    G: ScreenGrabber,
    P: PointerSource,
    C: Clock,
    O: CaptureObserver,
{
    let region = config.region;
    let mut pacer = FramePacer::new(clock, config.target_fps);

    while recording.load(Ordering::Acquire) {
        match grabber.grab(&region) {
            Ok(frame) => {
                let frame = match pointer.position() {
                    Ok(position) => composite_cursor(frame, &region, position),
                    Err(e) => {
                        // frame still gets written, just without the overlay
                        observer.on_frame_error(&e);
                        frame
                    }
                };
                // platform may hand back a different extent than asked for
                let frame = frame.resize_to(region.width, region.height);
                observer.on_frame(&frame);
                if let Err(e) = sink.write_frame(frame) {
                    observer.on_frame_error(&e);
                }
            }
            Err(e) => observer.on_frame_error(&e),
        }
        pacer.pace();
    }

    if let Err(e) = sink.finish() {
        log::error!("failed to finalize recording sink: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::pacing::testing::MockClock;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;
    use std::time::Duration;

    fn test_config() -> SessionConfig {
        SessionConfig {
            output_file: PathBuf::from("unused.mp4"),
            target_fps: 10,
            region: CaptureRegion::new(0, 0, 16, 16).unwrap(),
        }
    }

    /// Grabber producing solid frames; every grab whose index is contained
    /// in `fail_on` errors instead.
    struct FakeGrabber {
        grabs: Arc<Mutex<u64>>,
        fail_on: fn(u64) -> bool,
    }

    impl FakeGrabber {
        fn new() -> (Self, Arc<Mutex<u64>>) {
            let grabs = Arc::new(Mutex::new(0));
            (
                Self {
                    grabs: Arc::clone(&grabs),
                    fail_on: |_| false,
                },
                grabs,
            )
        }
    }

    impl ScreenGrabber for FakeGrabber {
        fn grab(&mut self, region: &CaptureRegion) -> Result<Frame> {
            let mut grabs = self.grabs.lock().unwrap();
            let index = *grabs;
            *grabs += 1;
            if (self.fail_on)(index) {
                return Err(Error::Capture(format!("grab {index} failed")));
            }
            let mut image = RgbaImage::new(region.width, region.height);
            for pixel in image.pixels_mut() {
                *pixel = Rgba([index as u8, 0, 0, 255]);
            }
            Ok(Frame::new(image))
        }
    }

    struct FakePointer {
        result: Result<(i32, i32)>,
    }

    impl PointerSource for FakePointer {
        fn position(&self) -> Result<(i32, i32)> {
            match &self.result {
                Ok(pos) => Ok(*pos),
                Err(_) => Err(Error::PointerQuery("no pointer".into())),
            }
        }
    }

    #[derive(Clone, Default)]
    struct SharedSink {
        frames: Arc<Mutex<Vec<Frame>>>,
        finished: Arc<Mutex<bool>>,
    }

    impl FrameSink for SharedSink {
        type Frame = Frame;

        fn write_frame(&mut self, frame: Frame) -> Result<()> {
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            *self.finished.lock().unwrap() = true;
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CountingObserver {
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl CaptureObserver for CountingObserver {
        fn on_frame_error(&self, error: &Error) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    fn wait_for_frames(sink: &SharedSink, count: usize) {
        for _ in 0..500 {
            if sink.frames.lock().unwrap().len() >= count {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("capture loop never produced {count} frames");
    }

    #[test]
    fn test_stop_blocks_until_sink_is_finalized() {
        let (grabber, _) = FakeGrabber::new();
        let sink = SharedSink::default();
        let clock = MockClock::new();

        let session = RecordingSession::start_with_sink(
            test_config(),
            sink.clone(),
            grabber,
            FakePointer { result: Ok((4, 4)) },
            clock,
            CountingObserver::default(),
        )
        .unwrap();

        wait_for_frames(&sink, 5);
        let output = session.stop();

        assert_eq!(output, PathBuf::from("unused.mp4"));
        assert!(*sink.finished.lock().unwrap());
        // nothing may be written after stop() has returned
        let count = sink.frames.lock().unwrap().len();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sink.frames.lock().unwrap().len(), count);
    }

    #[test]
    fn test_mock_clock_spacing_matches_frame_count() {
        let (grabber, _) = FakeGrabber::new();
        let sink = SharedSink::default();
        let clock = MockClock::new();

        let session = RecordingSession::start_with_sink(
            test_config(), // 10 fps -> 100 ms slots
            sink.clone(),
            grabber,
            FakePointer { result: Ok((4, 4)) },
            clock.clone(),
            CountingObserver::default(),
        )
        .unwrap();

        wait_for_frames(&sink, 30);
        session.stop();

        // every iteration was under budget, so virtual time advanced by
        // exactly one 100 ms slot per written frame: ~30 frames in ~3 s
        let frames = sink.frames.lock().unwrap().len() as u32;
        assert!(frames >= 30);
        assert_eq!(clock.elapsed(), Duration::from_millis(100) * frames);
    }

    #[test]
    fn test_single_grab_failure_does_not_end_recording() {
        let (mut grabber, _) = FakeGrabber::new();
        grabber.fail_on = |index| index % 2 == 1;
        let sink = SharedSink::default();
        let observer = CountingObserver::default();

        let session = RecordingSession::start_with_sink(
            test_config(),
            sink.clone(),
            grabber,
            FakePointer { result: Ok((4, 4)) },
            MockClock::new(),
            observer.clone(),
        )
        .unwrap();

        wait_for_frames(&sink, 10);
        session.stop();

        assert!(sink.frames.lock().unwrap().len() >= 10);
        assert!(!observer.errors.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pointer_failure_still_writes_uncomposited_frame() {
        let (grabber, _) = FakeGrabber::new();
        let sink = SharedSink::default();
        let observer = CountingObserver::default();

        let session = RecordingSession::start_with_sink(
            test_config(),
            sink.clone(),
            grabber,
            FakePointer {
                result: Err(Error::PointerQuery("down".into())),
            },
            MockClock::new(),
            observer.clone(),
        )
        .unwrap();

        wait_for_frames(&sink, 3);
        session.stop();

        assert!(sink.frames.lock().unwrap().len() >= 3);
        let errors = observer.errors.lock().unwrap();
        assert!(errors.iter().all(|e| e.contains("pointer")));
        // frames carry no cursor overlay: first frame is still solid
        let frames = sink.frames.lock().unwrap();
        let first = &frames[0];
        let corner = *first.image().get_pixel(4, 4);
        assert_eq!(corner, *first.image().get_pixel(15, 15));
    }

    #[test]
    fn test_cursor_composited_when_pointer_inside_region() {
        let (grabber, _) = FakeGrabber::new();
        let sink = SharedSink::default();

        let session = RecordingSession::start_with_sink(
            test_config(),
            sink.clone(),
            grabber,
            FakePointer { result: Ok((4, 4)) },
            MockClock::new(),
            CountingObserver::default(),
        )
        .unwrap();

        wait_for_frames(&sink, 1);
        session.stop();

        let frames = sink.frames.lock().unwrap();
        let first = &frames[0];
        // glyph footprint differs from the untouched corner
        assert_ne!(*first.image().get_pixel(4, 4), *first.image().get_pixel(15, 15));
    }
}
