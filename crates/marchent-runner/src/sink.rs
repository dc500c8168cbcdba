//! Frame output for snapshot streams.

use marchent_core::{Error, Result};
use marchent_world::Snapshot;
use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::{self, FilterType};
use image::{Delay, DynamicImage, Frame, ImageError, ImageFormat, Rgb, RgbImage, RgbaImage};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Destination for the snapshots of a run. `index` is the 1-based step the
/// snapshot was taken after.
pub trait FrameSink {
    fn write_frame(&mut self, index: usize, snapshot: &Snapshot) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn write_frame(&mut self, _index: usize, snapshot: &Snapshot) -> Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Bincode frames, each preceded by its byte length as a little-endian u64
pub struct BincodeSink<W: Write> {
    writer: W,
}

impl BincodeSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> BincodeSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for BincodeSink<W> {
    fn write_frame(&mut self, _index: usize, snapshot: &Snapshot) -> Result<()> {
        let bytes = bincode::serialize(snapshot)
            .map_err(|e| Error::Serialization(format!("Failed to serialize frame: {}", e)))?;
        self.writer.write_all(&(bytes.len() as u64).to_le_bytes())?;
        self.writer.write_all(&bytes)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Frame delay of the animated output
pub const GIF_FRAME_DELAY_MS: u32 = 50;

/// Extra copies of the final frame, so the finished picture lingers
pub const GIF_HOLD_FRAMES: usize = 50;

fn image_error(err: ImageError) -> Error {
    match err {
        ImageError::IoError(e) => Error::Io(e),
        other => Error::Serialization(format!("Image encoding failed: {}", other)),
    }
}

fn check_upsample(upsample: u32) -> Result<()> {
    if upsample == 0 {
        return Err(Error::Validation("Upsample factor must be at least 1".to_string()));
    }
    Ok(())
}

/// The snapshot as an RGB image, each cell scaled to an
/// `upsample x upsample` block
pub fn render(snapshot: &Snapshot, upsample: u32) -> RgbImage {
    let width = snapshot.width as u32;
    let height = snapshot.height as u32;
    let image = RgbImage::from_fn(width, height, |x, y| {
        let color = snapshot.get(x as i32, y as i32).unwrap_or_default();
        Rgb(color.channels())
    });

    if upsample <= 1 {
        image
    } else {
        imageops::resize(
            &image,
            width * upsample,
            height * upsample,
            FilterType::Nearest,
        )
    }
}

/// One PPM image per frame
pub struct PpmSink {
    dir: PathBuf,
    prefix: String,
    upsample: u32,
    written: usize,
}

impl PpmSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, upsample: u32) -> Result<Self> {
        check_upsample(upsample)?;
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            upsample,
            written: 0,
        })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{:06}.ppm", self.prefix, index))
    }
}

impl FrameSink for PpmSink {
    fn write_frame(&mut self, index: usize, snapshot: &Snapshot) -> Result<()> {
        let path = self.frame_path(index);
        render(snapshot, self.upsample)
            .save_with_format(&path, ImageFormat::Pnm)
            .map_err(image_error)?;
        self.written += 1;
        debug!("Wrote frame {:?}", path);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!("Wrote {} PPM frames to {:?}", self.written, self.dir);
        Ok(())
    }
}

/// A single looping GIF animation. The last frame is repeated
/// [`GIF_HOLD_FRAMES`] more times when the sink finishes.
pub struct GifSink<W: Write> {
    encoder: Option<GifEncoder<W>>,
    upsample: u32,
    last: Option<RgbaImage>,
    written: usize,
}

impl GifSink<BufWriter<File>> {
    pub fn create(path: &Path, upsample: u32) -> Result<Self> {
        check_upsample(upsample)?;
        Self::new(BufWriter::new(File::create(path)?), upsample)
    }
}

impl<W: Write> GifSink<W> {
    pub fn new(writer: W, upsample: u32) -> Result<Self> {
        check_upsample(upsample)?;
        let mut encoder = GifEncoder::new(writer);
        encoder.set_repeat(Repeat::Infinite).map_err(image_error)?;
        Ok(Self {
            encoder: Some(encoder),
            upsample,
            last: None,
            written: 0,
        })
    }

    fn encode(&mut self, image: RgbaImage) -> Result<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| Error::Validation("GIF sink already finished".to_string()))?;
        let delay = Delay::from_numer_denom_ms(GIF_FRAME_DELAY_MS, 1);
        encoder
            .encode_frame(Frame::from_parts(image, 0, 0, delay))
            .map_err(image_error)?;
        self.written += 1;
        Ok(())
    }
}

impl<W: Write> FrameSink for GifSink<W> {
    fn write_frame(&mut self, _index: usize, snapshot: &Snapshot) -> Result<()> {
        let image = DynamicImage::ImageRgb8(render(snapshot, self.upsample)).into_rgba8();
        self.encode(image.clone())?;
        self.last = Some(image);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(last) = self.last.take() {
            for _ in 0..GIF_HOLD_FRAMES {
                self.encode(last.clone())?;
            }
        }
        // dropping the encoder writes the GIF trailer
        self.encoder.take();
        info!("Wrote {} GIF frames", self.written);
        Ok(())
    }
}

/// Passes every `every`-th frame through to `inner`, plus the final frame
pub struct EveryNth<S> {
    inner: S,
    every: usize,
    pending: Option<(usize, Snapshot)>,
}

impl<S: FrameSink> EveryNth<S> {
    pub fn new(inner: S, every: usize) -> Result<Self> {
        if every == 0 {
            return Err(Error::Validation("Frame interval must be at least 1".to_string()));
        }
        Ok(Self {
            inner,
            every,
            pending: None,
        })
    }

    #[cfg(test)]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSink> FrameSink for EveryNth<S> {
    fn write_frame(&mut self, index: usize, snapshot: &Snapshot) -> Result<()> {
        if index % self.every == 0 {
            self.pending = None;
            self.inner.write_frame(index, snapshot)
        } else {
            self.pending = Some((index, snapshot.clone()));
            Ok(())
        }
    }

    fn finish(&mut self) -> Result<()> {
        if let Some((index, snapshot)) = self.pending.take() {
            self.inner.write_frame(index, &snapshot)?;
        }
        self.inner.finish()
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn write_frame(&mut self, index: usize, snapshot: &Snapshot) -> Result<()> {
        (**self).write_frame(index, snapshot)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
