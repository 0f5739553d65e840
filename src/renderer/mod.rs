use std::time::Duration;

use glam::Mat4;

use crate::animation::{Advance, AnimationClock};
use crate::asset::AssetLoader;
use crate::atlas::FrameAtlas;
use crate::backend::{GraphicsBackend, ProgramHandle, ShaderStage, TextureHandle};
use crate::camera::{Camera, ModelTransform};
use crate::config::{ShaderFailurePolicy, ShaderSources, SpriteConfig};
use crate::error::SpriteError;

pub(crate) mod geometry;
mod gpu;

pub use gpu::WgpuBackend;

/// Lifecycle of an initialized renderer.
///
/// There is no `Uninitialized` variant: until [`Renderer::init`] succeeds
/// there is no renderer to hold one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererState {
    Ready,
    Running,
    Stopped,
}

/// What a single [`Renderer::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not enough time has passed for the next frame.
    Idle,
    /// Advanced to this frame and drew it.
    Drew(usize),
    /// Advanced to this frame but nothing reached the screen.
    Advanced(usize),
    /// The time delta was invalid; nothing changed.
    Rejected,
    Stopped,
}

/// Owns the animation state and every GPU handle for one sprite.
///
/// Each tick feeds elapsed time to the clock; when it triggers the new
/// frame is drawn with MVP = camera.combined * model.
pub struct Renderer<B> {
    backend: B,
    clock: AnimationClock,
    atlas: FrameAtlas,
    camera: Camera,
    model: ModelTransform,
    mvp: Mat4,
    clear_color: [f32; 4],

    program: Option<ProgramHandle>,
    texture: TextureHandle,

    state: RendererState,
    warned_no_program: bool,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Upload geometry, build the shader program, await the sprite sheet and
    /// set the MVP uniform. Any failure leaves no renderer behind.
    pub async fn init<L: AssetLoader>(
        config: &SpriteConfig,
        mut backend: B,
        loader: &L,
    ) -> Result<Self, SpriteError> {
        config.validate()?;

        let clock = AnimationClock::new(config.frame_count, config.period())?
            .with_overflow(config.overflow);
        let atlas = FrameAtlas::build(config.frame_count, config.quad_half_extent)?;
        let camera = config.camera()?;
        let model = config.model_transform();

        backend.upload_vertices(atlas.vertices())?;

        let sources = config.shader_sources()?;
        let program = build_program(&mut backend, &sources, config.shader_failure)?;

        let image = loader.load_image(&config.atlas_image_path).await?;
        let texture = backend.create_texture(&image)?;
        backend.bind_texture(texture);

        let mvp = camera.combined() * model.matrix();
        backend.set_uniform_matrix4(mvp);

        log::info!(
            "Renderer ready: {} frames every {} ms from {}",
            config.frame_count,
            config.period_ms,
            config.atlas_image_path.display()
        );

        Ok(Self {
            backend,
            clock,
            atlas,
            camera,
            model,
            mvp,
            clear_color: config.clear_color,
            program,
            texture,
            state: RendererState::Ready,
            warned_no_program: false,
        })
    }

    /// Advance the animation by `dt` seconds, drawing if a new frame is due.
    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        match self.state {
            RendererState::Stopped => return TickOutcome::Stopped,
            RendererState::Ready => {
                log::debug!("Animation loop started");
                self.state = RendererState::Running;
            }
            RendererState::Running => {}
        }

        let frame = match self.clock.advance(dt) {
            Ok(Advance::NoTrigger) => return TickOutcome::Idle,
            Ok(Advance::Triggered(frame)) => frame,
            Err(e) => {
                log::warn!("Ignoring tick: {e}");
                return TickOutcome::Rejected;
            }
        };

        log::debug!("Advancing to frame {frame}");
        if self.draw_frame(frame) {
            TickOutcome::Drew(frame)
        } else {
            TickOutcome::Advanced(frame)
        }
    }

    pub fn tick_duration(&mut self, dt: Duration) -> TickOutcome {
        self.tick(dt.as_secs_f64())
    }

    /// Draw the current frame again without touching the clock,
    /// e.g. after the surface was resized or exposed.
    ///
    /// Only a running renderer redraws: nothing is on screen before the first
    /// tick, and a stopped one keeps its last image.
    pub fn redraw(&mut self) -> bool {
        if self.state != RendererState::Running {
            return false;
        }
        self.draw_frame(self.clock.current_frame())
    }

    /// Stop the loop; later ticks are no-ops.
    pub fn stop(&mut self) {
        if self.state != RendererState::Stopped {
            log::info!("Renderer stopped on frame {}", self.clock.current_frame());
            self.state = RendererState::Stopped;
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
    }

    fn draw_frame(&mut self, frame: usize) -> bool {
        if self.program.is_none() {
            if !self.warned_no_program {
                log::warn!("No shader program; frames will not be drawn");
                self.warned_no_program = true;
            }
            return false;
        }

        let span = match self.atlas.frame(frame) {
            Ok(span) => span,
            Err(e) => {
                debug_assert!(false, "clock produced an invalid frame: {e}");
                log::error!("Skipping draw: {e}");
                return false;
            }
        };

        self.backend.clear(self.clear_color);
        self.backend.set_uniform_matrix4(self.mvp);
        self.backend
            .draw_triangle_strip(span.vertex_offset, span.vertex_count);

        if let Err(e) = self.backend.submit() {
            log::warn!("Frame {frame} was not presented: {e}");
            return false;
        }
        true
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn current_frame(&self) -> usize {
        self.clock.current_frame()
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn atlas(&self) -> &FrameAtlas {
        &self.atlas
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn model(&self) -> &ModelTransform {
        &self.model
    }

    pub fn mvp(&self) -> Mat4 {
        self.mvp
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

fn build_program<B: GraphicsBackend>(
    backend: &mut B,
    sources: &ShaderSources,
    policy: ShaderFailurePolicy,
) -> Result<Option<ProgramHandle>, SpriteError> {
    let vertex = backend.compile_shader(ShaderStage::Vertex, &sources.vertex);
    let fragment = backend.compile_shader(ShaderStage::Fragment, &sources.fragment);

    let linked = match (vertex, fragment) {
        (Ok(vs), Ok(fs)) => backend
            .link_program(vs, fs)
            .map_err(SpriteError::ShaderLink),
        (Err(diagnostics), _) => Err(SpriteError::ShaderCompile {
            stage: ShaderStage::Vertex,
            diagnostics,
        }),
        (_, Err(diagnostics)) => Err(SpriteError::ShaderCompile {
            stage: ShaderStage::Fragment,
            diagnostics,
        }),
    };

    match (linked, policy) {
        (Ok(program), _) => {
            backend.use_program(program);
            Ok(Some(program))
        }
        (Err(e), ShaderFailurePolicy::FailFast) => Err(e),
        (Err(e), ShaderFailurePolicy::Degraded) => {
            log::error!("{e}; continuing without a shader program");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MemoryAssetLoader, blank_sheet_png};
    use crate::backend::recording::{BackendCall, RecordingBackend};

    fn loader(config: &SpriteConfig) -> MemoryAssetLoader {
        MemoryAssetLoader::new().with_file(
            config.atlas_image_path.clone(),
            blank_sheet_png(16, 4).unwrap(),
        )
    }

    fn ready(config: &SpriteConfig, backend: RecordingBackend) -> Renderer<RecordingBackend> {
        pollster::block_on(Renderer::init(config, backend, &loader(config))).unwrap()
    }

    #[test]
    fn init_sequence_uploads_links_and_binds() {
        let config = SpriteConfig::default();
        let renderer = ready(&config, RecordingBackend::new());
        let calls = &renderer.backend().calls;

        assert_eq!(calls[0], BackendCall::UploadVertices(16));
        assert_eq!(calls[1], BackendCall::CompileShader(ShaderStage::Vertex));
        assert_eq!(calls[2], BackendCall::CompileShader(ShaderStage::Fragment));
        assert!(matches!(calls[3], BackendCall::LinkProgram(..)));
        assert!(matches!(calls[4], BackendCall::UseProgram(_)));
        assert_eq!(
            calls[5],
            BackendCall::CreateTexture {
                width: 16,
                height: 4
            }
        );
        assert!(matches!(calls[6], BackendCall::BindTexture(_)));
        assert_eq!(calls[7], BackendCall::SetUniformMatrix4(renderer.mvp()));

        assert_eq!(renderer.state(), RendererState::Ready);
        assert_eq!(
            renderer.mvp(),
            renderer.camera().combined() * renderer.model().matrix()
        );
    }

    #[test]
    fn missing_sheet_fails_init() {
        let config = SpriteConfig::default();
        let result = pollster::block_on(Renderer::init(
            &config,
            RecordingBackend::new(),
            &MemoryAssetLoader::new(),
        ));
        assert!(matches!(result, Err(SpriteError::AssetLoad { .. })));
    }

    #[test]
    fn degenerate_camera_fails_init() {
        let mut config = SpriteConfig::default();
        config.camera.up = [0.0, 0.0, 1.0];
        let result = pollster::block_on(Renderer::init(
            &config,
            RecordingBackend::new(),
            &loader(&config),
        ));
        assert!(matches!(result, Err(SpriteError::InvalidCameraConfig(_))));
    }

    #[test]
    fn draws_only_when_clock_triggers() {
        let config = SpriteConfig::default();
        let mut renderer = ready(&config, RecordingBackend::new());
        renderer.backend_mut().clear_calls();

        assert_eq!(renderer.tick(0.1), TickOutcome::Idle);
        assert_eq!(renderer.state(), RendererState::Running);
        assert_eq!(renderer.tick(0.1), TickOutcome::Idle);
        assert!(renderer.backend().calls.is_empty());

        assert_eq!(renderer.tick(0.1), TickOutcome::Drew(1));
        let mvp = renderer.mvp();
        assert_eq!(
            renderer.backend().calls,
            vec![
                BackendCall::Clear(config.clear_color),
                BackendCall::SetUniformMatrix4(mvp),
                BackendCall::DrawTriangleStrip {
                    vertex_offset: 4,
                    vertex_count: 4
                },
                BackendCall::Submit,
            ]
        );
    }

    #[test]
    fn cycles_through_every_frame() {
        let config = SpriteConfig::default();
        let mut renderer = ready(&config, RecordingBackend::new());
        for _ in 0..4 {
            renderer.tick(0.25);
        }
        assert_eq!(
            renderer.backend().draws(),
            vec![(4, 4), (8, 4), (12, 4), (0, 4)]
        );
        assert_eq!(renderer.current_frame(), 0);
    }

    #[test]
    fn negative_delta_is_a_no_op() {
        let config = SpriteConfig::default();
        let mut renderer = ready(&config, RecordingBackend::new());
        renderer.tick(0.2);

        assert_eq!(renderer.tick(-0.005), TickOutcome::Rejected);
        assert_eq!(renderer.clock().accumulator(), 0.2);
        assert_eq!(renderer.tick(0.05), TickOutcome::Drew(1));
    }

    #[test]
    fn stopped_renderer_ignores_ticks() {
        let config = SpriteConfig::default();
        let mut renderer = ready(&config, RecordingBackend::new());
        renderer.tick(0.0);
        renderer.stop();
        renderer.stop();
        renderer.backend_mut().clear_calls();

        assert_eq!(renderer.tick(1.0), TickOutcome::Stopped);
        assert!(!renderer.redraw());
        assert!(renderer.backend().calls.is_empty());
        assert_eq!(renderer.state(), RendererState::Stopped);
    }

    #[test]
    fn fail_fast_rejects_bad_shader() {
        let config = SpriteConfig::default();
        let result = pollster::block_on(Renderer::init(
            &config,
            RecordingBackend::new().failing_compile(ShaderStage::Fragment),
            &loader(&config),
        ));
        match result {
            Err(SpriteError::ShaderCompile { stage, .. }) => {
                assert_eq!(stage, ShaderStage::Fragment)
            }
            Err(e) => panic!("expected ShaderCompile, got {e:?}"),
            Ok(_) => panic!("expected ShaderCompile, got a renderer"),
        }

        let result = pollster::block_on(Renderer::init(
            &config,
            RecordingBackend::new().failing_link(),
            &loader(&config),
        ));
        assert!(matches!(result, Err(SpriteError::ShaderLink(_))));
    }

    #[test]
    fn degraded_shader_keeps_clock_running_without_draws() {
        let mut config = SpriteConfig::default();
        config.shader_failure = ShaderFailurePolicy::Degraded;
        let mut renderer = ready(&config, RecordingBackend::new().failing_link());

        assert!(!renderer.has_program());
        assert_eq!(renderer.tick(0.25), TickOutcome::Advanced(1));
        assert_eq!(renderer.tick(0.25), TickOutcome::Advanced(2));
        assert!(renderer.backend().draws().is_empty());
    }

    #[test]
    fn submit_failure_does_not_stop_the_loop() {
        let config = SpriteConfig::default();
        let mut renderer = ready(&config, RecordingBackend::new());

        renderer.backend_mut().set_fail_submit(true);
        assert_eq!(renderer.tick(0.25), TickOutcome::Advanced(1));

        renderer.backend_mut().set_fail_submit(false);
        assert_eq!(renderer.tick(0.25), TickOutcome::Drew(2));
        assert_eq!(renderer.state(), RendererState::Running);
    }

    #[test]
    fn redraw_repeats_current_frame() {
        let config = SpriteConfig::default();
        let mut renderer = ready(&config, RecordingBackend::new());
        renderer.tick(0.25);
        renderer.backend_mut().clear_calls();

        assert!(renderer.redraw());
        assert_eq!(renderer.backend().draws(), vec![(4, 4)]);
        assert_eq!(renderer.current_frame(), 1);
    }

    #[test]
    fn redraw_before_first_tick_draws_nothing() {
        let config = SpriteConfig::default();
        let mut renderer = ready(&config, RecordingBackend::new());
        renderer.backend_mut().clear_calls();

        assert!(!renderer.redraw());
        assert!(renderer.backend().calls.is_empty());
        assert_eq!(renderer.state(), RendererState::Ready);
    }

    #[test]
    fn sheet_larger_than_device_limit_fails_init() {
        let config = SpriteConfig::default();
        let backend = RecordingBackend::new().with_max_texture_dimension(8);
        let result = pollster::block_on(Renderer::init(&config, backend, &loader(&config)));
        assert!(matches!(result, Err(SpriteError::InvalidInput(_))));
    }

    #[test]
    fn default_recording_limit_accepts_stock_sheet() {
        let config = SpriteConfig::default();
        let renderer = ready(&config, RecordingBackend::new());
        assert!(
            renderer
                .backend()
                .calls
                .contains(&BackendCall::CreateTexture { width: 16, height: 4 })
        );
    }

    #[test]
    fn resize_reaches_backend() {
        let config = SpriteConfig::default();
        let mut renderer = ready(&config, RecordingBackend::new());
        renderer.resize(1024, 768);
        assert_eq!(
            renderer.backend().calls.last(),
            Some(&BackendCall::Resize(1024, 768))
        );
    }
}
