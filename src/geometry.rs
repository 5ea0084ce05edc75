// 该文件是 Uncommon （罕物） 项目的一部分。
// src/geometry.rs - 坐标缩放
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

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
  #[error("源图像尺寸无效: {0}x{1}")]
  EmptySource(u32, u32),
  #[error("视口尺寸无效: {0}x{1}")]
  EmptyViewport(u32, u32),
}

/// 源图像坐标系下的检测框 [x, y, width, height]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl BoundingBox {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }
}

impl From<[f32; 4]> for BoundingBox {
  fn from([x, y, width, height]: [f32; 4]) -> Self {
    Self::new(x, y, width, height)
  }
}

/// 显示坐标系下的整数矩形，允许部分或全部落在画布之外
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
  pub x: i32,
  pub y: i32,
  pub width: u32,
  pub height: u32,
}

impl PixelRect {
  pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 裁剪到 `[0, bound_w) x [0, bound_h)`，没有交集时返回 `None`
  pub fn clip(&self, bound_w: u32, bound_h: u32) -> Option<Region> {
    let x0 = (self.x as i64).max(0);
    let y0 = (self.y as i64).max(0);
    let x1 = (self.x as i64 + self.width as i64).min(bound_w as i64);
    let y1 = (self.y as i64 + self.height as i64).min(bound_h as i64);

    if x0 >= x1 || y0 >= y1 {
      return None;
    }

    Some(Region {
      x: x0 as u32,
      y: y0 as u32,
      width: (x1 - x0) as u32,
      height: (y1 - y0) as u32,
    })
  }
}

/// 已裁剪到缓冲区内部的矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl Region {
  pub fn right(&self) -> u32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> u32 {
    self.y + self.height
  }

  pub fn area(&self) -> u64 {
    self.width as u64 * self.height as u64
  }

  pub fn intersect(&self, other: &Region) -> Option<Region> {
    let x0 = self.x.max(other.x);
    let y0 = self.y.max(other.y);
    let x1 = self.right().min(other.right());
    let y1 = self.bottom().min(other.bottom());
    if x0 >= x1 || y0 >= y1 {
      return None;
    }
    Some(Region {
      x: x0,
      y: y0,
      width: x1 - x0,
      height: y1 - y0,
    })
  }
}

/// 源图像到显示画布的统一缩放比例
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRatio(f64);

impl ScaleRatio {
  pub fn new(ratio: f64) -> Self {
    Self(ratio)
  }

  /// 保持宽高比，将源图像缩放到视口以内
  pub fn fit(
    source_width: u32,
    source_height: u32,
    max_width: u32,
    max_height: u32,
  ) -> Result<Self, GeometryError> {
    if source_width == 0 || source_height == 0 {
      return Err(GeometryError::EmptySource(source_width, source_height));
    }
    if max_width == 0 || max_height == 0 {
      return Err(GeometryError::EmptyViewport(max_width, max_height));
    }

    let ratio_w = max_width as f64 / source_width as f64;
    let ratio_h = max_height as f64 / source_height as f64;
    Ok(Self(ratio_w.min(ratio_h)))
  }

  pub fn value(&self) -> f64 {
    self.0
  }

  pub fn inverse(&self) -> Self {
    Self(1.0 / self.0)
  }

  /// 缩放后的画布尺寸，不超过视口且至少为 1 像素
  pub fn display_size(
    &self,
    source_width: u32,
    source_height: u32,
    max_width: u32,
    max_height: u32,
  ) -> (u32, u32) {
    let scale_dim = |dim: u32, max: u32| -> u32 {
      let scaled = (dim as f64 * self.0).round();
      (scaled.clamp(1.0, u32::MAX as f64) as u32).min(max.max(1))
    };
    (
      scale_dim(source_width, max_width),
      scale_dim(source_height, max_height),
    )
  }

  /// 各坐标独立四舍五入（远离零方向）
  pub fn scale_box(&self, bbox: &BoundingBox) -> PixelRect {
    let r = self.0;
    let x = (bbox.x as f64 * r).round();
    let y = (bbox.y as f64 * r).round();
    let width = (bbox.width as f64 * r).round();
    let height = (bbox.height as f64 * r).round();

    // `as` 饱和转换：负宽高落为 0
    PixelRect {
      x: x as i32,
      y: y as i32,
      width: width as u32,
      height: height as u32,
    }
  }

  pub fn scale_rect(&self, rect: &PixelRect) -> PixelRect {
    self.scale_box(&BoundingBox::new(
      rect.x as f32,
      rect.y as f32,
      rect.width as f32,
      rect.height as f32,
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fit_picks_tighter_axis() {
    let ratio = ScaleRatio::fit(1000, 800, 900, 600).unwrap();
    assert_eq!(ratio.value(), 0.75);
    assert_eq!(ratio.display_size(1000, 800, 900, 600), (750, 600));
  }

  #[test]
  fn fit_rejects_empty_dimensions() {
    assert_eq!(
      ScaleRatio::fit(0, 10, 100, 100),
      Err(GeometryError::EmptySource(0, 10))
    );
    assert_eq!(
      ScaleRatio::fit(10, 10, 100, 0),
      Err(GeometryError::EmptyViewport(100, 0))
    );
  }

  #[test]
  fn display_size_rounds_and_fills_viewport() {
    let ratio = ScaleRatio::fit(1001, 800, 900, 600).unwrap();
    assert_eq!(ratio.display_size(1001, 800, 900, 600), (751, 600));
    // 7 * (61 / 7) 略小于 61，截断会少一个像素
    let ratio = ScaleRatio::fit(7, 7, 61, 61).unwrap();
    assert_eq!(ratio.display_size(7, 7, 61, 61), (61, 61));
  }

  #[test]
  fn small_images_are_upscaled() {
    let ratio = ScaleRatio::fit(100, 50, 400, 400).unwrap();
    assert_eq!(ratio.value(), 4.0);
    assert_eq!(ratio.display_size(100, 50, 400, 400), (400, 200));
  }

  #[test]
  fn scale_box_rounds_each_coordinate() {
    let ratio = ScaleRatio::new(0.75);
    let rect = ratio.scale_box(&BoundingBox::new(100.0, 100.0, 200.0, 150.0));
    assert_eq!(rect, PixelRect::new(75, 75, 150, 113));
  }

  #[test]
  fn halves_round_away_from_zero() {
    let ratio = ScaleRatio::new(0.5);
    let rect = ratio.scale_box(&BoundingBox::new(5.0, -5.0, 3.0, 1.0));
    assert_eq!(rect, PixelRect::new(3, -3, 2, 1));
  }

  #[test]
  fn inverse_recovers_within_one_pixel() {
    for ratio in [0.75, 0.9, 1.0, 1.25, 2.0, 0.6] {
      let forward = ScaleRatio::new(ratio);
      let backward = forward.inverse();
      for (x, y, w, h) in [(0, 0, 1, 1), (13, 7, 101, 57), (333, 999, 2, 45)] {
        let original = PixelRect::new(x, y, w, h);
        let back = backward.scale_rect(&forward.scale_rect(&original));
        assert!((back.x - original.x).abs() <= 1, "{ratio}: {back:?}");
        assert!((back.y - original.y).abs() <= 1, "{ratio}: {back:?}");
        assert!((back.width as i64 - original.width as i64).abs() <= 1);
        assert!((back.height as i64 - original.height as i64).abs() <= 1);
      }
    }
  }

  #[test]
  fn clip_trims_to_bounds() {
    let rect = PixelRect::new(-5, 90, 20, 20);
    assert_eq!(
      rect.clip(100, 100),
      Some(Region {
        x: 0,
        y: 90,
        width: 15,
        height: 10
      })
    );
    assert_eq!(PixelRect::new(100, 0, 5, 5).clip(100, 100), None);
    assert_eq!(PixelRect::new(0, 0, 0, 5).clip(100, 100), None);
  }
}
