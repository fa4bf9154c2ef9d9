use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::{SourceError, VideoSource};

/// Camera, file or network stream decoded via ffmpeg-next.
///
/// Device inputs (e.g. `/dev/video0` through libavdevice's v4l2 demuxer)
/// and ordinary media files share one code path. Every decoded frame is
/// converted to RGB24.
pub struct FfmpegSource {
    location: String,
    state: Option<OpenState>,
    next_index: usize,
}

struct OpenState {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    flushing: bool,
}

// Safety: FfmpegSource is only driven from one thread at a time. The raw
// pointers inside the ffmpeg types are never shared.
unsafe impl Send for FfmpegSource {}

impl FfmpegSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            state: None,
            next_index: 0,
        }
    }

    fn open_err(&self, reason: impl ToString) -> SourceError {
        SourceError::Open {
            location: self.location.clone(),
            reason: reason.to_string(),
        }
    }
}

impl VideoSource for FfmpegSource {
    fn open(&mut self) -> Result<VideoMetadata, SourceError> {
        self.release();
        ffmpeg_next::init().map_err(|e| self.open_err(e))?;
        ffmpeg_next::device::register_all();

        let input =
            ffmpeg_next::format::input(&Path::new(&self.location)).map_err(|e| self.open_err(e))?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| self.open_err("no video stream found"))?;

        let stream_index = stream.index();
        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| self.open_err(e))?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| self.open_err(e))?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            location: self.location.clone(),
        };
        log::info!(
            "Opened {} ({}x{} @ {:.1} fps, {})",
            metadata.location,
            width,
            height,
            fps,
            metadata.codec
        );

        self.state = Some(OpenState {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            flushing: false,
        });
        self.next_index = 0;
        Ok(metadata)
    }

    fn read(&mut self) -> Result<Frame, SourceError> {
        let state = self.state.as_mut().ok_or(SourceError::NotOpen)?;
        let pixels = state.next_rgb()?;
        let frame = Frame::new(pixels, state.width, state.height, 3, self.next_index);
        self.next_index += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Released {}", self.location);
        }
    }
}

impl OpenState {
    /// Decodes until one frame is available, feeding packets as needed.
    fn next_rgb(&mut self) -> Result<Vec<u8>, SourceError> {
        loop {
            if let Some(pixels) = self.try_receive()? {
                return Ok(pixels);
            }
            if self.flushing {
                return Err(SourceError::Exhausted);
            }

            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb)
            .map_err(|e| SourceError::Read(e.to_string()))?;
        Ok(Some(extract_rgb_pixels(&rgb, self.width, self.height)))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping the per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
