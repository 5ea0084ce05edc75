// 该文件是 Uncommon （罕物） 项目的一部分。
// src/output/draw.rs - 检测框与标签叠加层
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{config::OverlayStyle, geometry::PixelRect};

// 标签基线：框顶部上方 5 像素，贴近画布顶部时固定在 10 像素
const LABEL_BASELINE_OFFSET: i32 = 5;
const LABEL_MIN_BASELINE: i32 = 10;

// 内置默认字体（DejaVu Sans），可通过 `with_font` 替换
static DEFAULT_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 检测框和 `label (NN%)` 标签
#[derive(Clone)]
pub struct Overlay {
  style: OverlayStyle,
  font: FontArc,
}

impl Default for Overlay {
  fn default() -> Self {
    Self::new(OverlayStyle::default())
  }
}

impl std::fmt::Debug for Overlay {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Overlay")
      .field("style", &self.style)
      .finish_non_exhaustive()
  }
}

impl Overlay {
  pub fn new(style: OverlayStyle) -> Self {
    let font = FontArc::try_from_slice(DEFAULT_FONT).expect("无法加载嵌入的字体文件");
    Self { style, font }
  }

  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = font;
    self
  }

  pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc, DrawError> {
    let path = path.as_ref();
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    Ok(FontArc::try_from_vec(data)?)
  }

  /// `rect` 为画布坐标，`ratio` 决定线宽和字号
  pub fn draw(&self, image: &mut RgbaImage, rect: PixelRect, caption: &str, ratio: f64) {
    let color = Rgba(self.style.color);
    self.draw_outline(image, rect, color, ratio);

    let font = &self.font;
    let scale = PxScale::from(self.style.font_size(ratio));
    let baseline = if rect.y > LABEL_MIN_BASELINE {
      rect.y - LABEL_BASELINE_OFFSET
    } else {
      LABEL_MIN_BASELINE
    };
    // draw_text_mut 的 y 是文字顶部
    let ascent = font.as_scaled(scale).ascent();
    let top = (baseline as f32 - ascent).round() as i32;
    debug!("绘制标签 {} 于 ({}, {})", caption, rect.x, top);

    draw_text_mut(image, color, rect.x, top, scale, font, caption);
  }

  // 线宽以矩形路径为中心向两侧展开
  fn draw_outline(&self, image: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>, ratio: f64) {
    let line_width = self.style.line_width(ratio) as i32;
    let half = line_width / 2;

    for thickness in 0..line_width {
      let inset = thickness - half;
      let width = rect.width as i32 - 2 * inset;
      let height = rect.height as i32 - 2 * inset;
      if width <= 0 || height <= 0 {
        continue;
      }
      let outline = Rect::at(rect.x + inset, rect.y + inset).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, outline, color);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const BACKGROUND: Rgba<u8> = Rgba([10, 20, 30, 255]);

  #[test]
  fn outline_drawn_around_rect() {
    let mut image = RgbaImage::from_pixel(60, 60, BACKGROUND);
    let overlay = Overlay::default();
    overlay.draw(&mut image, PixelRect::new(10, 10, 30, 20), "cat (80%)", 0.75);

    let red = Rgba([255, 0, 0, 255]);
    // 线宽 3：路径两侧各 1 像素
    for offset in [-1, 0, 1] {
      let edge = (10 + offset) as u32;
      assert_eq!(*image.get_pixel(25, edge), red);
      assert_eq!(*image.get_pixel(edge, 20), red);
    }
    assert_eq!(*image.get_pixel(8, 20), BACKGROUND);
    assert_eq!(*image.get_pixel(25, 20), BACKGROUND);
  }

  #[test]
  fn outline_partly_off_canvas_is_safe() {
    let mut image = RgbaImage::from_pixel(20, 20, BACKGROUND);
    let overlay = Overlay::default();
    overlay.draw(&mut image, PixelRect::new(-5, 15, 40, 40), "x (1%)", 1.0);
    assert_eq!(*image.get_pixel(10, 15), Rgba([255, 0, 0, 255]));
    assert_eq!(*image.get_pixel(10, 19), BACKGROUND);
  }

  fn marked_rows(image: &RgbaImage, columns: std::ops::Range<u32>) -> Vec<u32> {
    (0..image.height())
      .filter(|&y| columns.clone().any(|x| *image.get_pixel(x, y) != BACKGROUND))
      .collect()
  }

  #[test]
  fn label_sits_above_box() {
    let mut image = RgbaImage::from_pixel(200, 200, BACKGROUND);
    let overlay = Overlay::default();
    overlay.draw(&mut image, PixelRect::new(40, 100, 120, 80), "cat (80%)", 1.0);

    // 框上边线占 99..=101 行；基线在 95，字号 20
    let above = marked_rows(&image, 42..158)
      .into_iter()
      .filter(|&y| y < 99)
      .collect::<Vec<_>>();
    assert!(!above.is_empty());
    assert!(above.iter().all(|&y| y >= 70));
    assert!(above.iter().any(|&y| y < 90));

    // 框内部没有文字
    let inside = marked_rows(&image, 42..158)
      .into_iter()
      .filter(|&y| (102..178).contains(&y))
      .count();
    assert_eq!(inside, 0);
    // 文字从框左边开始
    assert!((0..38).all(|x| (70..99).all(|y| *image.get_pixel(x, y) == BACKGROUND)));
  }

  #[test]
  fn label_clamped_near_top_edge() {
    let mut image = RgbaImage::from_pixel(200, 100, BACKGROUND);
    let overlay = Overlay::default();
    overlay.draw(&mut image, PixelRect::new(40, 4, 120, 80), "cat (80%)", 1.0);

    // 上边线占 3..=5 行，基线固定在 10，字形落在边线下方
    let below_edge = marked_rows(&image, 42..158)
      .into_iter()
      .filter(|&y| (6..=10).contains(&y))
      .count();
    assert!(below_edge > 0);
    // 下伸部分之外不再有文字
    assert!(
      marked_rows(&image, 42..158)
        .into_iter()
        .all(|y| y <= 16 || y >= 82)
    );
  }

  #[test]
  fn custom_font_replaces_default() {
    let font = FontArc::try_from_slice(DEFAULT_FONT).unwrap();
    let mut with_default = RgbaImage::from_pixel(120, 60, BACKGROUND);
    let mut with_custom = with_default.clone();
    let rect = PixelRect::new(10, 30, 80, 20);
    Overlay::default().draw(&mut with_default, rect, "cup (99%)", 1.0);
    Overlay::default()
      .with_font(font)
      .draw(&mut with_custom, rect, "cup (99%)", 1.0);
    assert_eq!(with_default.as_raw(), with_custom.as_raw());
  }

  #[test]
  fn missing_font_file_is_reported() {
    assert!(matches!(
      Overlay::load_font("/nonexistent/uncommon/font.ttf"),
      Err(DrawError::IoError(_))
    ));
    let path = std::env::temp_dir().join("uncommon-not-a-font.ttf");
    std::fs::write(&path, b"nope").unwrap();
    assert!(matches!(
      Overlay::load_font(&path),
      Err(DrawError::InvalidFont(_))
    ));
  }
}
