// 该文件是 Uncommon （罕物） 项目的一部分。
// src/factor.rs - 置信度到马赛克块大小的映射
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

/// 默认除数：最大块边长 = sqrt(画布面积) / 20
pub const DEFAULT_PIXELATION_DIVISOR: f64 = 20.0;

/// 马赛克块边长（像素），总是 >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PixelationFactor(u32);

impl PixelationFactor {
  pub const NONE: PixelationFactor = PixelationFactor(1);

  pub fn new(edge: u32) -> Self {
    Self(edge.max(1))
  }

  /// 画布越大，允许的最大块越粗；置信度越高，块越粗
  pub fn from_confidence(area: u64, score: f64, divisor: f64) -> Self {
    let max_pixelation = (area as f64).sqrt() / divisor;
    let raw = (score * max_pixelation).floor();
    if !raw.is_finite() || raw < 1.0 {
      return Self::NONE;
    }
    Self::new(raw.min(u32::MAX as f64) as u32)
  }

  pub fn get(&self) -> u32 {
    self.0
  }

  /// 块边长为 1 时不产生可见效果
  pub fn is_noop(&self) -> bool {
    self.0 <= 1
  }
}

impl Default for PixelationFactor {
  fn default() -> Self {
    Self::NONE
  }
}

impl std::fmt::Display for PixelationFactor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn factor(area: u64, score: f64) -> u32 {
    PixelationFactor::from_confidence(area, score, DEFAULT_PIXELATION_DIVISOR).get()
  }

  #[test]
  fn matches_reference_canvas() {
    // 750x600 画布，最大块约 33.54
    assert_eq!(factor(750 * 600, 0.8), 26);
    assert_eq!(factor(750 * 600, 1.0), 33);
  }

  #[test]
  fn score_product_lands_on_integer() {
    // 2000x2000 画布最大块为 100，0.7 * 100 必须得到 70
    assert_eq!(factor(2000 * 2000, 0.7), 70);
    assert_eq!(factor(2000 * 2000, 0.29), 28);
    assert_eq!(factor(2000 * 2000, 0.57), 56);
  }

  #[test]
  fn never_below_one() {
    assert_eq!(factor(0, 1.0), 1);
    assert_eq!(factor(100, 0.0), 1);
    assert_eq!(factor(1_000_000, -0.5), 1);
    assert_eq!(factor(1_000_000, f64::NAN), 1);
    assert!(PixelationFactor::new(0).is_noop());
  }

  #[test]
  fn monotonic_in_score() {
    let area = 1920 * 1080;
    let mut last = 0;
    for step in 0..=100 {
      let current = factor(area, step as f64 / 100.0);
      assert!(current >= last);
      last = current;
    }
  }

  #[test]
  fn monotonic_in_area() {
    let mut last = 0;
    for side in (1..4000).step_by(37) {
      let current = factor(side * side, 0.63);
      assert!(current >= last);
      last = current;
    }
  }
}
