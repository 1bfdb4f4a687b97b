//! # Thumbnail 模块
//!
//! 把 [`Frame`] 光栅化成存档缩略图。
//!
//! 只画能从画面描述里还原的部分：背景、图片、立绘和对话框底板。
//! 文字不画，缩略图尺寸下也看不清。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgba as Pixel, RgbaImage};
use tracing::debug;

use novel_runtime::frame::{BackdropView, SpriteView};
use novel_runtime::layout::dialog_box_rect;
use novel_runtime::{Frame, Rect, Rgba};

/// 缩略图宽度
pub const THUMBNAIL_WIDTH: u32 = 280;
/// 缩略图高度
pub const THUMBNAIL_HEIGHT: u32 = 157;

/// 默认渐变背景在顶部和底部的颜色
const GRADIENT_TOP: [f32; 3] = [30.0, 30.0, 50.0];
const GRADIENT_BOTTOM: [f32; 3] = [50.0, 60.0, 90.0];

/// 缩略图光栅化器
///
/// 同一次运行中重复用到的图片只解码一次。
#[derive(Default)]
pub struct ThumbnailRenderer {
    decoded: HashMap<PathBuf, Option<RgbaImage>>,
}

impl ThumbnailRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成缩略图
    pub fn render(&mut self, frame: &Frame) -> RgbaImage {
        let mut canvas = RgbaImage::new(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT);
        let sx = THUMBNAIL_WIDTH as f32 / frame.screen.width.max(1) as f32;
        let sy = THUMBNAIL_HEIGHT as f32 / frame.screen.height.max(1) as f32;

        self.draw_backdrop(&mut canvas, &frame.background);
        for sprite in frame.images.iter().chain(frame.actors.iter()) {
            if let Some(rect) = sprite.rect(frame.screen) {
                self.draw_sprite(&mut canvas, sprite, scale_rect(rect, sx, sy));
            }
        }
        if let Some(dialog) = &frame.dialog {
            let rect = scale_rect(dialog_box_rect(frame.screen), sx, sy);
            fill_rect(&mut canvas, rect, dialog.theme.background);
        }
        canvas
    }

    fn draw_backdrop(&mut self, canvas: &mut RgbaImage, backdrop: &BackdropView) {
        match backdrop {
            BackdropView::Image { path, .. } => match self.decode(path) {
                Some(image) => {
                    let scaled =
                        imageops::resize(image, canvas.width(), canvas.height(), FilterType::Triangle);
                    imageops::replace(canvas, &scaled, 0, 0);
                }
                None => fill_gradient(canvas),
            },
            BackdropView::Color { color } => {
                let pixel = Pixel([color.r, color.g, color.b, 255]);
                for p in canvas.pixels_mut() {
                    *p = pixel;
                }
            }
            BackdropView::Gradient => fill_gradient(canvas),
        }
    }

    fn draw_sprite(&mut self, canvas: &mut RgbaImage, sprite: &SpriteView, rect: Rect) {
        let Some(path) = &sprite.path else {
            return;
        };
        let (w, h) = (rect.w.round() as u32, rect.h.round() as u32);
        if w == 0 || h == 0 || sprite.alpha <= 0.0 {
            return;
        }
        let Some(image) = self.decode(path) else {
            return;
        };
        let mut scaled = imageops::resize(image, w, h, FilterType::Triangle);
        if sprite.transform.flip_x {
            imageops::flip_horizontal_in_place(&mut scaled);
        }
        if sprite.transform.flip_y {
            imageops::flip_vertical_in_place(&mut scaled);
        }
        if sprite.alpha < 1.0 {
            for p in scaled.pixels_mut() {
                p.0[3] = (f32::from(p.0[3]) * sprite.alpha).round() as u8;
            }
        }
        imageops::overlay(
            canvas,
            &scaled,
            rect.x.round() as i64,
            rect.y.round() as i64,
        );
    }

    fn decode(&mut self, path: &Path) -> Option<&RgbaImage> {
        self.decoded
            .entry(path.to_path_buf())
            .or_insert_with(|| match image::open(path) {
                Ok(image) => Some(image.to_rgba8()),
                Err(e) => {
                    debug!(path = ?path, error = %e, "缩略图跳过无法解码的图片");
                    None
                }
            })
            .as_ref()
    }
}

fn scale_rect(rect: Rect, sx: f32, sy: f32) -> Rect {
    Rect::new(rect.x * sx, rect.y * sy, rect.w * sx, rect.h * sy)
}

fn fill_gradient(canvas: &mut RgbaImage) {
    let height = canvas.height().max(1) as f32;
    for (_, y, p) in canvas.enumerate_pixels_mut() {
        let t = y as f32 / height;
        let channel = |i: usize| (GRADIENT_TOP[i] + (GRADIENT_BOTTOM[i] - GRADIENT_TOP[i]) * t) as u8;
        *p = Pixel([channel(0), channel(1), channel(2), 255]);
    }
}

/// 按颜色的 alpha 混合填充矩形
fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba) {
    let x0 = rect.x.max(0.0) as u32;
    let y0 = rect.y.max(0.0) as u32;
    let x1 = ((rect.x + rect.w).max(0.0) as u32).min(canvas.width());
    let y1 = ((rect.y + rect.h).max(0.0) as u32).min(canvas.height());
    let alpha = f32::from(color.a) / 255.0;
    let src = [color.r, color.g, color.b];
    for y in y0..y1 {
        for x in x0..x1 {
            let p = canvas.get_pixel_mut(x, y);
            for i in 0..3 {
                let blended = f32::from(src[i]) * alpha + f32::from(p.0[i]) * (1.0 - alpha);
                p.0[i] = blended.round() as u8;
            }
        }
    }
}
