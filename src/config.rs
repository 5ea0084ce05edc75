// 该文件是 Uncommon （罕物） 项目的一部分。
// src/config.rs - 渲染配置
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

use image::imageops::FilterType;

use crate::factor::DEFAULT_PIXELATION_DIVISOR;

// 1920x1080 窗口宽度的 90%、高度的 70%
const DEFAULT_VIEWPORT_WIDTH: u32 = 1728;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 756;

const OVERLAY_COLOR: [u8; 4] = [255, 0, 0, 255]; // 红色
const OVERLAY_MIN_LINE_WIDTH: f64 = 3.0;
const OVERLAY_LINE_WIDTH_SCALE: f64 = 2.0;
const OVERLAY_MIN_FONT_SIZE: f64 = 20.0;
const OVERLAY_FONT_SIZE_SCALE: f64 = 16.0;

/// 画布允许的最大尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
  pub max_width: u32,
  pub max_height: u32,
}

impl Viewport {
  pub fn new(max_width: u32, max_height: u32) -> Self {
    Self {
      max_width,
      max_height,
    }
  }
}

impl Default for Viewport {
  fn default() -> Self {
    Self::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT)
  }
}

/// 检测框与标签的样式，线宽和字号随缩放比例增长
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
  pub color: [u8; 4],
  pub min_line_width: f64,
  pub line_width_scale: f64,
  pub min_font_size: f64,
  pub font_size_scale: f64,
}

impl OverlayStyle {
  pub fn line_width(&self, ratio: f64) -> u32 {
    self.min_line_width.max(self.line_width_scale * ratio).round() as u32
  }

  pub fn font_size(&self, ratio: f64) -> f32 {
    self.min_font_size.max(self.font_size_scale * ratio) as f32
  }
}

impl Default for OverlayStyle {
  fn default() -> Self {
    Self {
      color: OVERLAY_COLOR,
      min_line_width: OVERLAY_MIN_LINE_WIDTH,
      line_width_scale: OVERLAY_LINE_WIDTH_SCALE,
      min_font_size: OVERLAY_MIN_FONT_SIZE,
      font_size_scale: OVERLAY_FONT_SIZE_SCALE,
    }
  }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
  pub viewport: Viewport,
  /// 最大块边长 = sqrt(画布面积) / divisor
  pub pixelation_divisor: f64,
  /// 源图像缩放到画布时使用的滤波器
  pub resize_filter: FilterType,
  pub overlay: OverlayStyle,
}

impl RenderConfig {
  pub fn with_viewport(mut self, viewport: Viewport) -> Self {
    self.viewport = viewport;
    self
  }

  pub fn with_pixelation_divisor(mut self, divisor: f64) -> Self {
    self.pixelation_divisor = divisor;
    self
  }
}

impl Default for RenderConfig {
  fn default() -> Self {
    Self {
      viewport: Viewport::default(),
      pixelation_divisor: DEFAULT_PIXELATION_DIVISOR,
      resize_filter: FilterType::Triangle,
      overlay: OverlayStyle::default(),
    }
  }
}
