//! The viewer window and its event loop

use crate::blit::{Blitter, DisplayFrame};
use crate::fps::FpsCounter;
use crate::manipulator::{DragButton, Fly, InspectCenter, Manipulator};
use crate::viewport::ViewPort;
use msgview_core::{BoundingBox, Error, Result};
use std::sync::Arc;
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, Event, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

/// Factor applied to the motion speed by the `+` and `-` keys
const SPEED_STEP: f32 = 1.5;

/// Produces the frames shown in the window
pub trait FrameSource {
    /// The window was resized to `size` pixels
    fn reshape(&mut self, size: (u32, u32), viewport: &ViewPort);

    /// Render the current view. Implementations consume `viewport.modified`.
    /// Returning `None` leaves the window contents unchanged.
    fn display(&mut self, viewport: &mut ViewPort) -> Option<DisplayFrame<'_>>;
}

/// Window configuration
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Prepended to the frame rate shown in the title bar
    pub title_prefix: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "MSG Viewer".to_string(),
            width: 1024,
            height: 768,
            title_prefix: "MSG Viewer: ".to_string(),
        }
    }
}

/// Input state shared by all events, kept apart from the window so key and
/// mouse handling can be exercised without one
struct Controls {
    viewport: ViewPort,
    initial: ViewPort,
    manipulator: Box<dyn Manipulator>,
    button: Option<DragButton>,
    cursor: Option<PhysicalPosition<f64>>,
}

#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Handled,
    Ignored,
}

impl Controls {
    fn new(viewport: ViewPort) -> Self {
        Self {
            initial: viewport.clone(),
            viewport,
            manipulator: Box::new(InspectCenter),
            button: None,
            cursor: None,
        }
    }

    fn key(&mut self, key: &str) -> KeyAction {
        let mut chars = key.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return KeyAction::Ignored;
        };

        match c {
            'q' | 'Q' => return KeyAction::Quit,
            'i' | 'I' => {
                self.manipulator = Box::new(InspectCenter);
                log::info!("switched to inspect mode");
            }
            'f' | 'F' => {
                self.manipulator = Box::new(Fly);
                log::info!("switched to fly mode");
            }
            'r' | 'R' => {
                // the window may have been resized since the initial view
                let aspect = self.viewport.aspect;
                self.viewport = self.initial.clone();
                self.viewport.aspect = aspect;
                self.viewport.modified = true;
            }
            'c' | 'C' => log::info!("camera: {}", self.viewport),
            '+' | '=' => {
                self.viewport.motion_speed *= SPEED_STEP;
                log::info!("motion speed {}", self.viewport.motion_speed);
            }
            '-' => {
                self.viewport.motion_speed /= SPEED_STEP;
                log::info!("motion speed {}", self.viewport.motion_speed);
            }
            _ => {
                if !self.manipulator.key(&mut self.viewport, c) {
                    return KeyAction::Ignored;
                }
            }
        }
        KeyAction::Handled
    }

    fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let button = match button {
            MouseButton::Left => DragButton::Left,
            MouseButton::Middle => DragButton::Middle,
            MouseButton::Right => DragButton::Right,
            _ => return,
        };
        match state {
            ElementState::Pressed => self.button = Some(button),
            ElementState::Released if self.button == Some(button) => self.button = None,
            ElementState::Released => {}
        }
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        if let (Some(button), Some(last)) = (self.button, self.cursor) {
            let dx = (position.x - last.x) as f32;
            let dy = (position.y - last.y) as f32;
            self.manipulator.drag(&mut self.viewport, button, dx, dy);
        }
        self.cursor = Some(position);
    }
}

pub struct ViewerWindow {
    config: ViewerConfig,
    viewport: ViewPort,
}

impl ViewerWindow {
    pub fn new(config: ViewerConfig) -> Self {
        let mut viewport = ViewPort::default();
        viewport.aspect = config.width as f32 / config.height.max(1) as f32;
        Self { config, viewport }
    }

    pub fn viewport(&self) -> &ViewPort {
        &self.viewport
    }

    /// Frame the given world box; `R` returns to this view
    pub fn set_world_bounds(&mut self, bounds: &BoundingBox) {
        self.viewport.set_world_bounds(bounds);
    }

    /// Open the window and run until it is closed
    pub fn run<S: FrameSource + 'static>(self, mut source: S) -> Result<()> {
        let event_loop = EventLoop::new()
            .map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(&self.config.title)
                .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
                .build(&event_loop)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let mut blitter = pollster::block_on(Blitter::new(window.clone()))?;
        let mut controls = Controls::new(self.viewport);
        let mut fps = FpsCounter::new();
        let title_prefix = self.config.title_prefix;

        let size = window.inner_size();
        controls.viewport.set_aspect(size.width as f32 / size.height.max(1) as f32);
        source.reshape((size.width, size.height), &controls.viewport);

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::Poll);

                match event {
                    Event::WindowEvent { event, .. } => match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::Resized(new_size) => {
                            if new_size.width > 0 && new_size.height > 0 {
                                blitter.resize(new_size.width, new_size.height);
                                controls
                                    .viewport
                                    .set_aspect(new_size.width as f32 / new_size.height as f32);
                                source.reshape((new_size.width, new_size.height), &controls.viewport);
                            }
                        }
                        WindowEvent::MouseInput { state, button, .. } => controls.mouse_button(button, state),
                        WindowEvent::CursorMoved { position, .. } => controls.cursor_moved(position),
                        WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                            let action = match &event.logical_key {
                                Key::Named(NamedKey::Escape) => KeyAction::Quit,
                                Key::Character(c) => controls.key(c.as_str()),
                                _ => KeyAction::Ignored,
                            };
                            if action == KeyAction::Quit {
                                target.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            fps.frame();
                            if let Some(frame) = source.display(&mut controls.viewport) {
                                if let Err(e) = blitter.draw(&frame) {
                                    log::error!("{}", e);
                                }
                            }
                            window.set_title(&format!("{}{:.2} fps", title_prefix, fps.fps()));
                        }
                        _ => {}
                    },
                    Event::AboutToWait => window.request_redraw(),
                    _ => {}
                }
            })
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))?;

        Ok(())
    }
}
