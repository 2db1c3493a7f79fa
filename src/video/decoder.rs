//! FFmpeg-backed frame source: sequential decode of one video file.

use std::fs::File;
use std::path::Path;

use ac_ffmpeg::codec::video::{self, VideoDecoder, VideoFrame};
use ac_ffmpeg::codec::Decoder;
use ac_ffmpeg::format::demuxer::{Demuxer, DemuxerWithStreamInfo};
use ac_ffmpeg::format::io::IO;
use ac_ffmpeg::time::TimeBase;

use crate::error::Result;
use crate::video::FrameSource;

/// Streams decoded frames out of a container file, in presentation order,
/// one at a time. Only the first video stream is read.
pub struct VideoFileSource {
    demuxer: DemuxerWithStreamInfo<File>,
    decoder: VideoDecoder,
    stream_index: usize,
    time_base: TimeBase,
    width: usize,
    height: usize,
    pixel_format: video::frame::PixelFormat,
    flushed: bool,
}

impl VideoFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let input = File::open(path)?;
        let io = IO::from_seekable_read_stream(input);

        let demuxer = Demuxer::builder()
            .build(io)?
            .find_stream_info(None)
            .map_err(|(_, err)| err)?;

        let (stream_index, decoder, time_base, params) = {
            let (stream_index, stream) = demuxer
                .streams()
                .iter()
                .enumerate()
                .find(|(_, stream)| stream.codec_parameters().is_video_codec())
                .ok_or_else(|| ac_ffmpeg::Error::new("no video stream in input"))?;

            let decoder = VideoDecoder::from_stream(stream)?.build()?;
            let params = stream
                .codec_parameters()
                .into_video_codec_parameters()
                .ok_or_else(|| ac_ffmpeg::Error::new("stream has no video parameters"))?;

            (stream_index, decoder, stream.time_base(), params)
        };

        Ok(Self {
            demuxer,
            decoder,
            stream_index,
            time_base,
            width: params.width(),
            height: params.height(),
            pixel_format: params.pixel_format(),
            flushed: false,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_format(&self) -> video::frame::PixelFormat {
        self.pixel_format
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }
}

impl FrameSource for VideoFileSource {
    type Frame = VideoFrame;

    fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        loop {
            if let Some(frame) = self.decoder.take()? {
                return Ok(Some(frame));
            }
            if self.flushed {
                return Ok(None);
            }
            match self.demuxer.take()? {
                Some(packet) => {
                    if packet.stream_index() == self.stream_index {
                        self.decoder.push(packet)?;
                    }
                }
                None => {
                    self.decoder.flush()?;
                    self.flushed = true;
                }
            }
        }
    }
}
