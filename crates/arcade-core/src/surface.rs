//! Render surface manager and the per-frame drawing context.
//!
//! The hub owns exactly one [`RenderSurface`], wrapping whatever the host
//! provides (a canvas in the browser, a [`RecordingSurface`] natively). Games
//! never see the backend directly: they draw through a [`Frame`] that borrows
//! the surface for the duration of one `render` call.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS color string, as accepted by canvas `fillStyle`.
    pub fn to_css(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                f32::from(self.a) / 255.0
            )
        }
    }
}

/// Logical surface dimensions handed to games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
}

/// A point in surface-local logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// A single primitive drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Fill {
        color: Rgba,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
    },
    StrokeRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        line_width: f32,
        color: Rgba,
    },
    FillCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Rgba,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        line_width: f32,
        color: Rgba,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        align: TextAlign,
        color: Rgba,
    },
}

/// The host-side drawable. Implemented over a 2D canvas by the client and
/// by [`RecordingSurface`] for headless runs.
pub trait SurfaceBackend {
    fn size(&self) -> SurfaceInfo;

    /// May discard the current picture.
    fn set_size(&mut self, width: u32, height: u32);

    /// Wipe all pixels and any retained drawing state.
    fn clear(&mut self, background: Rgba);

    fn draw(&mut self, command: &DrawCommand);
}

/// Backend that keeps the draw commands issued since the last clear.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: SurfaceInfo,
    commands: Vec<DrawCommand>,
    clear_count: usize,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: SurfaceInfo { width, height },
            commands: Vec::new(),
            clear_count: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear_count(&self) -> usize {
        self.clear_count
    }
}

impl SurfaceBackend for RecordingSurface {
    fn size(&self) -> SurfaceInfo {
        self.size
    }

    /// Like a canvas, a size change drops whatever was drawn.
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = SurfaceInfo { width, height };
        self.commands.clear();
    }

    fn clear(&mut self, _background: Rgba) {
        self.commands.clear();
        self.clear_count += 1;
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(command.clone());
    }
}

/// Shared handle, so a host can inspect a backend the hub owns.
impl<T: SurfaceBackend> SurfaceBackend for Rc<RefCell<T>> {
    fn size(&self) -> SurfaceInfo {
        self.borrow().size()
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.borrow_mut().set_size(width, height);
    }

    fn clear(&mut self, background: Rgba) {
        self.borrow_mut().clear(background);
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.borrow_mut().draw(command);
    }
}

/// Maps displayed (CSS pixel) coordinates onto the logical surface, taking
/// scaling and letterboxing into account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub logical: SurfaceInfo,
    pub display_width: f32,
    pub display_height: f32,
}

impl Viewport {
    pub fn new(logical: SurfaceInfo, display_width: f32, display_height: f32) -> Self {
        Self {
            logical,
            display_width,
            display_height,
        }
    }

    /// Uniform scale factor from logical to displayed pixels.
    pub fn scale(&self) -> f32 {
        if self.logical.width == 0 || self.logical.height == 0 {
            return 1.0;
        }
        let sx = self.display_width / self.logical.width as f32;
        let sy = self.display_height / self.logical.height as f32;
        let s = sx.min(sy);
        if s.is_finite() && s > 0.0 { s } else { 1.0 }
    }

    /// Offset of the letterboxed content inside the displayed element.
    pub fn offset(&self) -> (f32, f32) {
        let s = self.scale();
        let content_w = self.logical.width as f32 * s;
        let content_h = self.logical.height as f32 * s;
        (
            ((self.display_width - content_w) / 2.0).max(0.0),
            ((self.display_height - content_h) / 2.0).max(0.0),
        )
    }

    /// Convert element-relative coordinates to surface coordinates. Points in
    /// the letterbox bars are clamped to the nearest surface edge.
    pub fn to_surface(&self, element_x: f32, element_y: f32) -> SurfacePoint {
        let s = self.scale();
        let (ox, oy) = self.offset();
        let x = (element_x - ox) / s;
        let y = (element_y - oy) / s;
        SurfacePoint {
            x: x.clamp(0.0, self.logical.width as f32),
            y: y.clamp(0.0, self.logical.height as f32),
        }
    }
}

/// Owns the drawable surface on behalf of the hub.
pub struct RenderSurface {
    backend: Box<dyn SurfaceBackend>,
    display: (f32, f32),
    frames_begun: u64,
    /// Commands of the most recent frame, replayed when a resize wipes a
    /// frozen picture.
    last_frame: Vec<DrawCommand>,
}

impl RenderSurface {
    /// Every frame and every clear starts from this color.
    pub const BACKGROUND: Rgba = Rgba::BLACK;

    pub fn new(backend: Box<dyn SurfaceBackend>) -> Self {
        let size = backend.size();
        Self {
            backend,
            display: (size.width as f32, size.height as f32),
            frames_begun: 0,
            last_frame: Vec::new(),
        }
    }

    pub fn info(&self) -> SurfaceInfo {
        self.backend.size()
    }

    pub fn frames_begun(&self) -> u64 {
        self.frames_begun
    }

    /// Acquire the drawing context for one frame. The surface is wiped to the
    /// background color first.
    pub fn begin_frame(&mut self) -> Frame<'_> {
        self.frames_begun += 1;
        self.backend.clear(Self::BACKGROUND);
        self.last_frame.clear();
        Frame {
            size: self.backend.size(),
            backend: self.backend.as_mut(),
            retained: &mut self.last_frame,
        }
    }

    /// Reset the surface between games so nothing from the previous game
    /// remains visible.
    pub fn clear(&mut self) {
        self.last_frame.clear();
        self.backend.clear(Self::BACKGROUND);
    }

    /// Draw the most recent frame again without involving the game.
    pub fn redraw_last(&mut self) {
        self.backend.clear(Self::BACKGROUND);
        for command in &self.last_frame {
            self.backend.draw(command);
        }
    }

    /// Set the logical size. Returns `true` if the size actually changed.
    ///
    /// Backends may wipe their pixels on a size change.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let current = self.backend.size();
        if current.width == width && current.height == height {
            return false;
        }
        self.backend.set_size(width, height);
        tracing::debug!(width, height, "surface resized");
        true
    }

    /// Record the on-screen size of the surface element (CSS pixels).
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        self.display = (width, height);
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.backend.size(), self.display.0, self.display.1)
    }

    /// Direct backend access for hosts (e.g. to read a recording).
    pub fn backend(&self) -> &dyn SurfaceBackend {
        self.backend.as_ref()
    }
}

/// Drawing context valid for a single `render` call.
pub struct Frame<'a> {
    backend: &'a mut dyn SurfaceBackend,
    size: SurfaceInfo,
    retained: &'a mut Vec<DrawCommand>,
}

impl Frame<'_> {
    pub fn size(&self) -> SurfaceInfo {
        self.size
    }

    /// Number of commands issued through this frame so far.
    pub fn command_count(&self) -> usize {
        self.retained.len()
    }

    fn issue(&mut self, command: DrawCommand) {
        self.backend.draw(&command);
        self.retained.push(command);
    }

    /// Paint the whole surface.
    pub fn fill(&mut self, color: Rgba) {
        self.issue(DrawCommand::Fill { color });
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.issue(DrawCommand::FillRect { x, y, w, h, color });
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, line_width: f32, color: Rgba) {
        self.issue(DrawCommand::StrokeRect {
            x,
            y,
            w,
            h,
            line_width,
            color,
        });
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        self.issue(DrawCommand::FillCircle {
            cx,
            cy,
            radius,
            color,
        });
    }

    pub fn line(&mut self, from: SurfacePoint, to: SurfacePoint, line_width: f32, color: Rgba) {
        self.issue(DrawCommand::Line {
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
            line_width,
            color,
        });
    }

    pub fn text(
        &mut self,
        x: f32,
        y: f32,
        text: impl Into<String>,
        size: f32,
        align: TextAlign,
        color: Rgba,
    ) {
        self.issue(DrawCommand::Text {
            x,
            y,
            text: text.into(),
            size,
            align,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(w: u32, h: u32) -> RenderSurface {
        RenderSurface::new(Box::new(RecordingSurface::new(w, h)))
    }

    #[test]
    fn css_colors() {
        assert_eq!(Rgba::rgb(255, 0, 16).to_css(), "#ff0010");
        assert_eq!(Rgba::rgba(0, 0, 0, 0).to_css(), "rgba(0, 0, 0, 0.000)");
    }

    #[test]
    fn frame_draws_reach_backend() {
        let mut s = surface(100, 50);
        {
            let mut frame = s.begin_frame();
            assert_eq!(frame.size(), SurfaceInfo { width: 100, height: 50 });
            frame.fill_rect(0.0, 0.0, 10.0, 10.0, Rgba::WHITE);
            frame.fill_circle(5.0, 5.0, 2.0, Rgba::BLACK);
            assert_eq!(frame.command_count(), 2);
        }
        assert_eq!(s.frames_begun(), 1);
    }

    #[test]
    fn resize_is_idempotent() {
        let mut s = surface(100, 50);
        assert!(!s.resize(100, 50));
        assert!(s.resize(200, 100));
        assert!(!s.resize(200, 100));
        assert_eq!(s.info(), SurfaceInfo { width: 200, height: 100 });
    }

    #[test]
    fn redraw_replays_last_frame() {
        let recording = Rc::new(RefCell::new(RecordingSurface::new(100, 50)));
        let mut s = RenderSurface::new(Box::new(Rc::clone(&recording)));
        {
            let mut frame = s.begin_frame();
            frame.fill(Rgba::WHITE);
            frame.text(50.0, 25.0, "Paused", 12.0, TextAlign::Center, Rgba::BLACK);
        }
        let drawn = recording.borrow().commands().to_vec();

        assert!(s.resize(200, 100));
        assert!(recording.borrow().commands().is_empty());
        s.redraw_last();
        assert_eq!(recording.borrow().commands(), drawn.as_slice());
    }

    #[test]
    fn clear_forgets_last_frame() {
        let recording = Rc::new(RefCell::new(RecordingSurface::new(10, 10)));
        let mut s = RenderSurface::new(Box::new(Rc::clone(&recording)));
        s.begin_frame().fill(Rgba::WHITE);
        s.clear();
        s.redraw_last();
        assert!(recording.borrow().commands().is_empty());
    }

    #[test]
    fn recording_surface_drops_commands_on_clear() {
        let mut rec = RecordingSurface::new(10, 10);
        rec.draw(&DrawCommand::Fill { color: Rgba::WHITE });
        assert_eq!(rec.commands().len(), 1);
        rec.clear(Rgba::BLACK);
        assert!(rec.commands().is_empty());
        assert_eq!(rec.clear_count(), 1);
    }

    #[test]
    fn viewport_identity_mapping() {
        let vp = Viewport::new(SurfaceInfo { width: 400, height: 300 }, 400.0, 300.0);
        assert_eq!(vp.scale(), 1.0);
        assert_eq!(vp.to_surface(120.0, 80.0), SurfacePoint { x: 120.0, y: 80.0 });
    }

    #[test]
    fn viewport_pillarbox_mapping() {
        // 400x300 logical shown in an 800x300 element: scale 1, 200px bars left/right.
        let vp = Viewport::new(SurfaceInfo { width: 400, height: 300 }, 800.0, 300.0);
        assert_eq!(vp.scale(), 1.0);
        assert_eq!(vp.offset(), (200.0, 0.0));
        assert_eq!(vp.to_surface(200.0, 0.0), SurfacePoint { x: 0.0, y: 0.0 });
        assert_eq!(vp.to_surface(400.0, 150.0), SurfacePoint { x: 200.0, y: 150.0 });
    }

    #[test]
    fn viewport_scaled_letterbox_mapping() {
        // 400x300 logical in an 800x800 element: scale 2, 100px bars top/bottom.
        let vp = Viewport::new(SurfaceInfo { width: 400, height: 300 }, 800.0, 800.0);
        assert_eq!(vp.scale(), 2.0);
        assert_eq!(vp.offset(), (0.0, 100.0));
        assert_eq!(vp.to_surface(400.0, 400.0), SurfacePoint { x: 200.0, y: 150.0 });
    }

    #[test]
    fn viewport_clamps_letterbox_bars() {
        let vp = Viewport::new(SurfaceInfo { width: 400, height: 300 }, 800.0, 800.0);
        assert_eq!(vp.to_surface(10.0, 5.0), SurfacePoint { x: 5.0, y: 0.0 });
        assert_eq!(vp.to_surface(790.0, 795.0), SurfacePoint { x: 395.0, y: 300.0 });
    }

    #[test]
    fn draw_commands_serialize_with_op_tag() {
        let cmd = DrawCommand::Fill { color: Rgba::WHITE };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["op"], "fill");
    }
}
