//! Live screen capture: grabbing, cursor compositing, pacing and the
//! recording session that ties them together.

pub mod cursor;
pub mod frame;
pub mod grabber;
pub mod pacing;
pub mod recorder;
pub mod session;

pub use cursor::{DeviceQueryPointer, PointerSource, composite_cursor};
pub use frame::{CaptureRegion, Frame};
pub use grabber::{ScreenGrabber, XcapGrabber};
pub use pacing::{Clock, FramePacer, SystemClock};
pub use recorder::Recorder;
pub use session::{CaptureObserver, LogObserver, RecordingSession, SessionConfig};
