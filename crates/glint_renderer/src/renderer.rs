//! Progressive renderer.
//!
//! Each call to [`Renderer::render`] adds one refinement iteration to the
//! accumulation buffer (until `max_iterations` is reached) and writes the
//! running average into the caller's pixel buffer. Any camera change
//! restarts the accumulation.

use std::sync::Arc;

use crossbeam_channel::unbounded;

use crate::band::{AccumulationBuffer, Band, RenderTask};
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::thread_pool::ThreadPool;
use crate::tracer::{SampleOffsets, TraceSettings};
use crate::{CameraCommand, Scene, Trackball, ViewPlane, Viewport};

/// Owns the worker pool, the camera and the accumulation buffer.
pub struct Renderer {
    config: RenderConfig,
    viewport: Viewport,
    trackball: Trackball,
    pool: ThreadPool,
    samples: SampleOffsets,
    accumulation: AccumulationBuffer,
    iteration: u32,
}

impl Renderer {
    /// Start the worker pool and allocate a zeroed buffer for `viewport`.
    pub fn new(viewport: Viewport, config: RenderConfig) -> RenderResult<Self> {
        let config = config.validate();
        let pool = match config.threads {
            Some(threads) => ThreadPool::new(threads)?,
            None => ThreadPool::with_default_size()?,
        };
        let samples = SampleOffsets::for_count(config.samples_per_pixel, &mut rand::thread_rng());
        let accumulation = AccumulationBuffer::new(&viewport, config.lines_per_task);
        let trackball = Trackball::default().with_pole_epsilon(config.pole_epsilon);

        log::info!(
            "Renderer {}x{}: {} tasks of {} lines, {} samples per pixel",
            viewport.width(),
            viewport.height(),
            accumulation.band_count(),
            config.lines_per_task,
            samples.len()
        );

        Ok(Self {
            config,
            viewport,
            trackball,
            pool,
            samples,
            accumulation,
            iteration: 0,
        })
    }

    /// Discard every accumulated sample.
    pub fn clear_framebuffer(&mut self) {
        self.accumulation.clear();
        self.iteration = 0;
    }

    /// Move the camera and restart accumulation.
    pub fn apply(&mut self, command: CameraCommand) {
        self.trackball.apply(command);
        self.clear_framebuffer();
    }

    pub fn trackball(&self) -> &Trackball {
        &self.trackball
    }

    /// Direct trackball access. Call [`Renderer::clear_framebuffer`] after
    /// moving the camera this way.
    pub fn trackball_mut(&mut self) -> &mut Trackball {
        &mut self.trackball
    }

    /// Replace the trackball and restart accumulation.
    pub fn set_trackball(&mut self, trackball: Trackball) {
        self.trackball = trackball;
        self.clear_framebuffer();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Number of iterations accumulated since the last clear.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn accumulation(&self) -> &AccumulationBuffer {
        &self.accumulation
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn num_threads(&self) -> usize {
        self.pool.num_threads()
    }

    /// Refine the image once and write the current average into `pixels`.
    ///
    /// `pixels` must hold exactly `width * height` packed RGBA values, top
    /// row first. Once `max_iterations` is reached the buffer is only
    /// resolved again.
    pub fn render(&mut self, scene: &Arc<Scene>, pixels: &mut [u32]) -> RenderResult<()> {
        let expected = self.viewport.pixel_count();
        if pixels.len() != expected {
            return Err(RenderError::OutputSize {
                expected,
                actual: pixels.len(),
            });
        }

        if self.iteration < self.config.max_iterations {
            self.refine(scene)?;
        }

        self.accumulation.resolve_into(self.iteration, pixels);
        Ok(())
    }

    fn refine(&mut self, scene: &Arc<Scene>) -> RenderResult<()> {
        let plane = ViewPlane::new(self.trackball.camera(), &self.viewport);
        let settings = TraceSettings::from(&self.config);
        let bands = self.accumulation.take_bands();
        let (sender, receiver) = unbounded();

        self.pool.set_task_counter(bands.len());
        for band in bands {
            let task = RenderTask {
                scene: Arc::clone(scene),
                plane,
                viewport: self.viewport,
                samples: self.samples.clone(),
                settings,
                band,
            };
            let sender = sender.clone();
            self.pool.add_task(move || {
                let band = task.run(&mut rand::thread_rng());
                // The receiver lives until every task has completed
                let _ = sender.send(band);
            });
        }
        drop(sender);
        self.pool.wait_for_tasks();

        let returned: Vec<Band> = receiver.try_iter().collect();
        if returned.len() != self.accumulation.band_count() {
            return Err(self.recover_lost_bands(&returned));
        }

        self.accumulation.restore(returned);
        self.iteration += 1;
        log::debug!("Iteration {} complete", self.iteration);
        Ok(())
    }

    /// Rebuild a zeroed buffer after a task died with its band.
    fn recover_lost_bands(&mut self, returned: &[Band]) -> RenderError {
        let (min_line, max_line) = self
            .accumulation
            .ranges()
            .into_iter()
            .find(|&(min, max)| {
                !returned
                    .iter()
                    .any(|band| band.min_line() == min && band.max_line() == max)
            })
            .unwrap_or((0, self.viewport.height()));

        log::error!(
            "Lines {}..{} were lost, restarting accumulation",
            min_line,
            max_line
        );
        self.accumulation = AccumulationBuffer::new(&self.viewport, self.config.lines_per_task);
        self.iteration = 0;
        RenderError::TaskFailed { min_line, max_line }
    }
}
