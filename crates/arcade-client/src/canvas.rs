//! `SurfaceBackend` over a 2D canvas context.

use arcade_core::surface::TextAlign;

#[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
pub(crate) fn font_css(size: f32) -> String {
    format!("{}px sans-serif", size.max(1.0).round())
}

#[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
pub(crate) fn align_css(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "left",
        TextAlign::Center => "center",
        TextAlign::Right => "right",
    }
}

#[cfg(target_family = "wasm")]
pub use web::CanvasSurface;

#[cfg(target_family = "wasm")]
mod web {
    use std::f64::consts::TAU;

    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

    use arcade_core::surface::{DrawCommand, Rgba, SurfaceBackend, SurfaceInfo};

    use super::{align_css, font_css};

    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasSurface {
        pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
            let ctx = canvas
                .get_context("2d")?
                .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
                .dyn_into::<CanvasRenderingContext2d>()?;
            Ok(Self { canvas, ctx })
        }

        fn width(&self) -> f64 {
            f64::from(self.canvas.width())
        }

        fn height(&self) -> f64 {
            f64::from(self.canvas.height())
        }

        fn try_draw(&self, command: &DrawCommand) -> Result<(), JsValue> {
            let ctx = &self.ctx;
            match command {
                DrawCommand::Fill { color } => {
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.fill_rect(0.0, 0.0, self.width(), self.height());
                },
                DrawCommand::FillRect { x, y, w, h, color } => {
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.fill_rect(f64::from(*x), f64::from(*y), f64::from(*w), f64::from(*h));
                },
                DrawCommand::StrokeRect {
                    x,
                    y,
                    w,
                    h,
                    line_width,
                    color,
                } => {
                    ctx.set_stroke_style_str(&color.to_css());
                    ctx.set_line_width(f64::from(*line_width));
                    ctx.stroke_rect(f64::from(*x), f64::from(*y), f64::from(*w), f64::from(*h));
                },
                DrawCommand::FillCircle {
                    cx,
                    cy,
                    radius,
                    color,
                } => {
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.begin_path();
                    ctx.arc(f64::from(*cx), f64::from(*cy), f64::from(*radius), 0.0, TAU)?;
                    ctx.fill();
                },
                DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    line_width,
                    color,
                } => {
                    ctx.set_stroke_style_str(&color.to_css());
                    ctx.set_line_width(f64::from(*line_width));
                    ctx.begin_path();
                    ctx.move_to(f64::from(*x1), f64::from(*y1));
                    ctx.line_to(f64::from(*x2), f64::from(*y2));
                    ctx.stroke();
                },
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    size,
                    align,
                    color,
                } => {
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.set_font(&font_css(*size));
                    ctx.set_text_align(align_css(*align));
                    ctx.set_text_baseline("middle");
                    ctx.fill_text(text, f64::from(*x), f64::from(*y))?;
                },
            }
            Ok(())
        }
    }

    impl SurfaceBackend for CanvasSurface {
        fn size(&self) -> SurfaceInfo {
            SurfaceInfo {
                width: self.canvas.width(),
                height: self.canvas.height(),
            }
        }

        fn set_size(&mut self, width: u32, height: u32) {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }

        fn clear(&mut self, background: Rgba) {
            // A previous game may have left a transform or alpha behind.
            if let Err(e) = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0) {
                crate::diag::console_warn!("canvas transform reset failed: {e:?}");
            }
            self.ctx.set_global_alpha(1.0);
            self.ctx.clear_rect(0.0, 0.0, self.width(), self.height());
            self.ctx.set_fill_style_str(&background.to_css());
            self.ctx.fill_rect(0.0, 0.0, self.width(), self.height());
        }

        fn draw(&mut self, command: &DrawCommand) {
            if let Err(e) = self.try_draw(command) {
                crate::diag::console_warn!("canvas draw failed: {e:?}");
            }
        }
    }
}
