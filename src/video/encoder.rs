//! FFmpeg-backed frame sinks: MP4 files written through an encoder chain.
//!
//! Encoder fallback chain: prefer `libx264`, fall back to the FFmpeg-native
//! `mpeg4` encoder which is always compiled in. Both land in an MP4
//! container guessed from the output file name.

use std::fs::File;
use std::path::{Path, PathBuf};

use ac_ffmpeg::codec::video::{self, VideoEncoder, VideoFrame, VideoFrameMut};
use ac_ffmpeg::codec::Encoder;
use ac_ffmpeg::format::io::IO;
use ac_ffmpeg::format::muxer::{Muxer, OutputFormat};
use ac_ffmpeg::time::{TimeBase, Timestamp};

use crate::capture::frame::Frame;
use crate::error::{Error, Result};
use crate::video::{convert, FrameSink};

const ENCODER_CHAIN: &[(&str, &[(&str, &str)])] = &[
    (
        "libx264",
        &[("preset", "ultrafast"), ("crf", "23"), ("threads", "0")],
    ),
    ("mpeg4", &[("b", "4000000"), ("g", "60")]),
];

/// Shared encoder + muxer plumbing for both sinks.
struct VideoWriter {
    encoder: VideoEncoder,
    muxer: Muxer<File>,
    codec_name: String,
}

impl VideoWriter {
    fn open(
        path: &Path,
        pixel_format: video::frame::PixelFormat,
        width: usize,
        height: usize,
        time_base: TimeBase,
    ) -> Result<Self> {
        let sink_open = |reason: String| Error::SinkOpen {
            path: path.to_path_buf(),
            reason,
        };

        let output_format = OutputFormat::guess_from_file_name(&path.to_string_lossy())
            .ok_or_else(|| sink_open("unable to guess container format".into()))?;

        let output = File::create(path).map_err(|e| sink_open(e.to_string()))?;
        let io = IO::from_seekable_write_stream(output);

        let (encoder, codec_name) =
            Self::build_encoder(pixel_format, width, height, time_base)
                .ok_or_else(|| sink_open("no usable video encoder".into()))?;

        let codec_parameters = encoder.codec_parameters().into();

        let mut muxer_builder = Muxer::builder();
        muxer_builder.add_stream(&codec_parameters)?;
        let muxer = muxer_builder
            .build(io, output_format)
            .map_err(|e| sink_open(e.to_string()))?;

        log::info!("opened sink {} with encoder {}", path.display(), codec_name);

        Ok(Self {
            encoder,
            muxer,
            codec_name,
        })
    }

    fn build_encoder(
        pixel_format: video::frame::PixelFormat,
        width: usize,
        height: usize,
        time_base: TimeBase,
    ) -> Option<(VideoEncoder, String)> {
        for (codec, options) in ENCODER_CHAIN {
            let mut builder = match VideoEncoder::builder(codec) {
                Ok(b) => b,
                Err(e) => {
                    log::debug!("encoder {} not available, skipping: {}", codec, e);
                    continue;
                }
            };
            builder = builder
                .pixel_format(pixel_format)
                .width(width)
                .height(height)
                .time_base(time_base);
            for (k, v) in *options {
                builder = builder.set_option(k, v);
            }
            match builder.build() {
                Ok(enc) => return Some((enc, codec.to_string())),
                Err(e) => {
                    log::debug!("encoder {} failed to initialize: {}", codec, e);
                    continue;
                }
            }
        }
        None
    }

    fn push(&mut self, frame: VideoFrame) -> Result<()> {
        self.encoder.push(frame)?;
        while let Some(packet) = self.encoder.take()? {
            self.muxer.push(packet.with_stream_index(0))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.encoder.flush()?;
        while let Some(packet) = self.encoder.take()? {
            self.muxer.push(packet.with_stream_index(0))?;
        }
        self.muxer.flush()?;
        Ok(())
    }
}

/// Sink of the live capture pipeline. Accepts RGBA [`Frame`]s at a fixed
/// resolution, converts them to yuv420p and writes them at `target_fps`.
pub struct RecordingSink {
    writer: VideoWriter,
    // the previously pushed frame, recycled once the encoder releases it
    spare: Option<VideoFrame>,
    time_base: TimeBase,
    pixel_format: video::frame::PixelFormat,
    frame_index: i64,
    width: usize,
    height: usize,
}

impl RecordingSink {
    /// Opens the output file. Dimensions are rounded up to even values for
    /// chroma subsampling; the padded row/column stays black.
    pub fn open(path: &Path, width: u32, height: u32, target_fps: u32) -> Result<Self> {
        let width = (width + width % 2) as usize;
        let height = (height + height % 2) as usize;
        let time_base = TimeBase::new(1, target_fps as i32);
        let pixel_format = video::frame::get_pixel_format("yuv420p");

        let writer = VideoWriter::open(path, pixel_format, width, height, time_base)?;

        Ok(Self {
            writer,
            spare: None,
            time_base,
            pixel_format,
            frame_index: 0,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn codec_name(&self) -> &str {
        &self.writer.codec_name
    }

    /// A writable frame buffer: the recycled spare when the encoder has let
    /// go of it, otherwise a fresh allocation.
    fn blank_frame(&mut self) -> VideoFrameMut {
        if let Some(frame) = self.spare.take() {
            // fails while the encoder still references the frame
            if let Ok(frame) = frame.try_into_mut() {
                return frame;
            }
        }
        VideoFrameMut::black(self.pixel_format, self.width, self.height)
            .with_time_base(self.time_base)
    }
}

impl FrameSink for RecordingSink {
    type Frame = Frame;

    fn write_frame(&mut self, frame: Frame) -> Result<()> {
        let planes = convert::rgba_to_yuv420(frame.image(), self.width, self.height);

        let mut vframe = self
            .blank_frame()
            .with_pts(Timestamp::new(self.frame_index, self.time_base));

        {
            let mut frame_planes = vframe.planes_mut();
            convert::copy_plane(&planes.y, self.width, self.height, frame_planes[0].data_mut());
        }
        {
            let mut frame_planes = vframe.planes_mut();
            let (cw, ch) = (self.width / 2, self.height / 2);
            convert::copy_plane(&planes.u, cw, ch, frame_planes[1].data_mut());
            convert::copy_plane(&planes.v, cw, ch, frame_planes[2].data_mut());
        }

        let vframe = vframe.freeze();
        self.writer.push(vframe.clone())?;
        self.spare = Some(vframe);
        self.frame_index += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.finish()
    }
}

/// Sink of the conversion pipeline. Accepts already-decoded FFmpeg frames
/// and restamps them sequentially at the source frame interval, so speed-up
/// falls out of the frames the decimator never sends.
pub struct TimelapseSink {
    writer: VideoWriter,
    time_base: TimeBase,
    speed_factor: i64,
    written: i64,
    base_ticks: i64,
    interval_ticks: i64,
}

impl TimelapseSink {
    pub fn open(
        path: &Path,
        pixel_format: video::frame::PixelFormat,
        width: usize,
        height: usize,
        time_base: TimeBase,
        speed_factor: u32,
    ) -> Result<Self> {
        let writer = VideoWriter::open(path, pixel_format, width, height, time_base)?;
        Ok(Self {
            writer,
            time_base,
            speed_factor: i64::from(speed_factor),
            written: 0,
            base_ticks: 0,
            interval_ticks: 0,
        })
    }
}

impl FrameSink for TimelapseSink {
    type Frame = VideoFrame;

    fn write_frame(&mut self, frame: VideoFrame) -> Result<()> {
        let src_ticks = frame.pts().timestamp();

        let out_ticks = if self.written == 0 {
            self.base_ticks = src_ticks;
            src_ticks
        } else {
            if self.written == 1 {
                // kept frames are speed_factor source frames apart, so the
                // per-frame interval is the kept-frame gap divided back down
                self.interval_ticks = (src_ticks - self.base_ticks) / self.speed_factor;
            }
            self.base_ticks + self.written * self.interval_ticks
        };

        let frame = frame.with_pts(Timestamp::new(out_ticks, self.time_base));
        self.writer.push(frame)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.finish()
    }
}

/// Remove a partially written output file. Used on the failure paths of
/// both pipelines so a broken run leaves nothing behind.
pub fn discard_output(path: &Path) -> Option<PathBuf> {
    match std::fs::remove_file(path) {
        Ok(()) => Some(path.to_path_buf()),
        Err(e) => {
            log::debug!("could not remove partial output {}: {}", path.display(), e);
            None
        }
    }
}
