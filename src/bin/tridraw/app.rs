use std::ffi::CString;
use std::num::NonZeroU32;

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasRawWindowHandle;
use thiserror::Error;
use winit::dpi::{PhysicalSize, Size};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use gl_wrapper::device::GlDevice;

use tridraw::{draw_once, PipelineError, Scene, SceneError, ShaderLibrary};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not create a GL display: {0}")]
    Display(String),
    #[error("display was created without a window")]
    NoWindow,
    #[error("window has a zero-sized surface")]
    ZeroSize,
    #[error(transparent)]
    Gl(#[from] glutin::error::Error),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub struct App {
    event_loop: EventLoop<()>,
    gl_context: PossiblyCurrentContext,
    gl_window: GlWindow,
    device: GlDevice,
    scene: Scene,
    library: ShaderLibrary,
}

impl App {
    pub fn new(scene: Scene, library: ShaderLibrary) -> Result<Self, AppError> {
        let event_loop = EventLoop::new();
        let window_builder = WindowBuilder::new()
            .with_inner_size(Size::Physical(PhysicalSize::new(
                scene.surface.width,
                scene.surface.height,
            )))
            .with_resizable(false)
            .with_title("tridraw");
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let template = ConfigTemplateBuilder::new().with_depth_size(24);

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |mut configs| {
                configs.next().expect("display offered no GL configs")
            })
            .map_err(|e| AppError::Display(e.to_string()))?;

        let window = window.ok_or(AppError::NoWindow)?;
        let handle = window.raw_window_handle();
        let gl_display = gl_config.display();

        let context_attr = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(handle));

        let gl_window = GlWindow::new(window, &gl_config)?;

        let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attr)? }
            .make_current(&gl_window.surface)?;

        let device = unsafe {
            GlDevice::load(|s| match CString::new(s) {
                Ok(name) => gl_display.get_proc_address(name.as_c_str()).cast(),
                Err(_) => std::ptr::null(),
            })
        };

        tracing::info!(
            width = scene.surface.width,
            height = scene.surface.height,
            "GL context ready"
        );

        Ok(Self {
            event_loop,
            gl_context,
            gl_window,
            device,
            scene,
            library,
        })
    }

    /// Draws the scene once, on the first redraw, then idles until closed.
    pub fn run(self) -> ! {
        let Self {
            event_loop,
            gl_context,
            gl_window,
            mut device,
            scene,
            library,
        } = self;

        let mut drawn = false;
        gl_window.window.request_redraw();

        event_loop.run(move |event, _window_target, control_flow| {
            *control_flow = ControlFlow::Wait;
            match event {
                Event::RedrawRequested(_) if !drawn => {
                    drawn = true;

                    match draw_once(&mut device, &scene, &library) {
                        Ok(report) => {
                            tracing::info!(vertices = report.vertices, "frame drawn");
                        }
                        Err(e) => {
                            tracing::error!("{e}");
                            control_flow.set_exit_with_code(1);
                            return;
                        }
                    }

                    if let Err(e) = gl_window.surface.swap_buffers(&gl_context) {
                        tracing::error!("could not present frame: {e}");
                        control_flow.set_exit_with_code(1);
                    }
                }
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => control_flow.set_exit(),
                _ => (),
            }
        })
    }
}

pub struct GlWindow {
    // XXX the surface must be dropped before the window.
    pub surface: Surface<WindowSurface>,
    pub window: Window,
}

impl GlWindow {
    pub fn new(window: Window, config: &Config) -> Result<Self, AppError> {
        let (width, height): (u32, u32) = window.inner_size().into();
        let raw_window_handle = window.raw_window_handle();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            NonZeroU32::new(width).ok_or(AppError::ZeroSize)?,
            NonZeroU32::new(height).ok_or(AppError::ZeroSize)?,
        );

        let surface = unsafe { config.display().create_window_surface(config, &attrs)? };

        Ok(Self { window, surface })
    }
}
