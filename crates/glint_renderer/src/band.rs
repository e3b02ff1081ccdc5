//! Scanline bands: the unit of parallel work.
//!
//! The image is cut into horizontal bands of a fixed number of scanlines
//! (the last band absorbs the remainder). The accumulation buffer is stored
//! band by band so each band can be moved into exactly one render task per
//! frame and handed back when the task is done. Tasks therefore never share
//! pixels.
//!
//! Scanlines are counted from the bottom of the image (line 0 = bottom);
//! pixel storage is row-major from the top, matching the presentation buffer.

use std::sync::Arc;

use rand::RngCore;
use rayon::prelude::*;

use crate::tracer::{color_to_rgba, render_pixel, SampleOffsets, TraceSettings};
use crate::{Color, Scene, ViewPlane, Viewport};

/// Split `height` scanlines into `[min, max)` ranges of `lines_per_band`.
///
/// Ranges are returned bottom-up. The last range absorbs the remainder.
pub fn generate_bands(height: u32, lines_per_band: u32) -> Vec<(u32, u32)> {
    let lines_per_band = lines_per_band.max(1);
    let count = height.div_ceil(lines_per_band).max(1);

    (0..count)
        .map(|t| {
            let min = t * lines_per_band;
            let max = if t + 1 == count {
                height
            } else {
                (t + 1) * lines_per_band
            };
            (min, max)
        })
        .collect()
}

/// Accumulated colors of one scanline range.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    min_line: u32,
    max_line: u32,
    width: u32,
    /// Row-major, first row is `max_line - 1`
    pixels: Vec<Color>,
}

impl Band {
    /// Create a zeroed band covering `[min_line, max_line)`.
    pub fn new(min_line: u32, max_line: u32, width: u32) -> Self {
        let rows = max_line.saturating_sub(min_line) as usize;
        Self {
            min_line,
            max_line,
            width,
            pixels: vec![Color::ZERO; rows * width as usize],
        }
    }

    pub fn min_line(&self) -> u32 {
        self.min_line
    }

    pub fn max_line(&self) -> u32 {
        self.max_line
    }

    /// Number of scanlines in the band.
    pub fn rows(&self) -> u32 {
        self.max_line - self.min_line
    }

    /// Accumulated color of scanline `line`, column `x`, if the band covers it.
    pub fn get(&self, x: u32, line: u32) -> Option<Color> {
        if x >= self.width || !(self.min_line..self.max_line).contains(&line) {
            return None;
        }
        Some(self.pixels[self.index(x, line)])
    }

    /// Add `color` into the cell at scanline `line`, column `x`.
    pub fn add(&mut self, x: u32, line: u32, color: Color) {
        let index = self.index(x, line);
        self.pixels[index] += color;
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn clear(&mut self) {
        self.pixels.fill(Color::ZERO);
    }

    fn index(&self, x: u32, line: u32) -> usize {
        debug_assert!(line >= self.min_line && line < self.max_line);
        debug_assert!(x < self.width);
        (self.max_line - 1 - line) as usize * self.width as usize + x as usize
    }
}

/// Running sum of every refinement iteration since the last clear.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationBuffer {
    width: u32,
    height: u32,
    lines_per_band: u32,
    /// Sorted by `min_line`; empty while the bands are out with the workers
    bands: Vec<Band>,
}

impl AccumulationBuffer {
    /// Allocate a zeroed buffer for `viewport`.
    pub fn new(viewport: &Viewport, lines_per_band: u32) -> Self {
        let lines_per_band = lines_per_band.max(1);
        let bands = generate_bands(viewport.height(), lines_per_band)
            .into_iter()
            .map(|(min, max)| Band::new(min, max, viewport.width()))
            .collect();

        Self {
            width: viewport.width(),
            height: viewport.height(),
            lines_per_band,
            bands,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bands (and therefore render tasks per frame).
    pub fn band_count(&self) -> usize {
        self.height.div_ceil(self.lines_per_band).max(1) as usize
    }

    /// The `[min, max)` scanline range of every band, bottom-up.
    pub fn ranges(&self) -> Vec<(u32, u32)> {
        generate_bands(self.height, self.lines_per_band)
    }

    /// Zero every cell.
    pub fn clear(&mut self) {
        self.bands.iter_mut().for_each(Band::clear);
    }

    /// Accumulated color at column `x`, output row `row` (0 = top).
    ///
    /// `None` outside the image or while the bands are out with the workers.
    pub fn get(&self, x: u32, row: u32) -> Option<Color> {
        if x >= self.width || row >= self.height || self.bands.is_empty() {
            return None;
        }
        let line = self.height - 1 - row;
        self.band_for_line(line).get(x, line)
    }

    /// Move every band out so it can be handed to a task.
    pub fn take_bands(&mut self) -> Vec<Band> {
        std::mem::take(&mut self.bands)
    }

    /// Put bands back after a frame. The full set must be returned.
    pub fn restore(&mut self, mut bands: Vec<Band>) {
        debug_assert_eq!(bands.len(), self.band_count());
        bands.sort_by_key(Band::min_line);
        self.bands = bands;
    }

    /// Write the time-averaged image into `pixels` as packed RGBA.
    ///
    /// With no iterations yet every pixel is opaque black.
    pub fn resolve_into(&self, iterations: u32, pixels: &mut [u32]) {
        let width = self.width as usize;
        debug_assert_eq!(pixels.len(), width * self.height as usize);
        if iterations == 0 || self.bands.is_empty() {
            pixels.par_iter_mut().for_each(|pixel| *pixel = color_to_rgba(Color::ZERO));
            return;
        }

        let inv_iterations = 1.0 / iterations as f32;
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out)| {
                let line = self.height - 1 - row as u32;
                let band = self.band_for_line(line);
                let start = band.index(0, line);
                let colors = &band.pixels[start..start + width];
                for (pixel, color) in out.iter_mut().zip(colors) {
                    *pixel = color_to_rgba(*color * inv_iterations);
                }
            });
    }

    fn band_for_line(&self, line: u32) -> &Band {
        let last = self.bands.len().saturating_sub(1) as u32;
        let index = (line / self.lines_per_band).min(last);
        &self.bands[index as usize]
    }
}

/// One unit of work: add one refinement iteration into a band.
pub struct RenderTask {
    pub scene: Arc<Scene>,
    pub plane: ViewPlane,
    pub viewport: Viewport,
    pub samples: SampleOffsets,
    pub settings: TraceSettings,
    pub band: Band,
}

impl RenderTask {
    /// Trace every pixel of the band and return it with the new samples added.
    pub fn run(mut self, rng: &mut dyn RngCore) -> Band {
        let (min, max) = (self.band.min_line(), self.band.max_line());

        for j in (min..max).rev() {
            for i in 0..self.viewport.width() {
                let color = render_pixel(
                    i,
                    j,
                    &self.plane,
                    &self.viewport,
                    &self.samples,
                    &self.scene,
                    &self.settings,
                    rng,
                );
                self.band.add(i, j, color);
            }
        }

        log::trace!("Rendered lines {}..{}", min, max);
        self.band
    }
}
