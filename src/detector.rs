// 该文件是 Uncommon （罕物） 项目的一部分。
// src/detector.rs - 目标检测接口
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

use std::{convert::Infallible, future::Future};

use image::RgbaImage;

use crate::geometry::BoundingBox;

/// 检测器返回的一个目标，坐标位于输入图像的原始像素空间
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub bbox: BoundingBox,
  pub label: String,
  pub score: f64,
}

impl Detection {
  /// `bbox` 为 [x, y, width, height]
  pub fn new(bbox: [f32; 4], label: impl Into<String>, score: f64) -> Self {
    Self {
      bbox: BoundingBox::from(bbox),
      label: label.into(),
      score,
    }
  }

  /// 叠加层上显示的文本，例如 `cat (80%)`
  pub fn caption(&self) -> String {
    format!("{} ({}%)", self.label, (self.score * 100.0).round() as i32)
  }
}

pub trait Detector {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 返回顺序即渲染顺序，调用方不得重排
  fn detect(
    &self,
    image: &RgbaImage,
  ) -> impl Future<Output = Result<Vec<Detection>, Self::Error>> + Send;
}

/// 返回固定检测结果的检测器
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
  detections: Vec<Detection>,
}

impl StaticDetector {
  pub fn new(detections: Vec<Detection>) -> Self {
    Self { detections }
  }
}

impl Detector for StaticDetector {
  type Error = Infallible;

  async fn detect(&self, _image: &RgbaImage) -> Result<Vec<Detection>, Self::Error> {
    Ok(self.detections.clone())
  }
}

#[cfg(feature = "json_detector")]
mod json_detector;
#[cfg(feature = "json_detector")]
pub use self::json_detector::{JsonDetector, JsonDetectorError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn caption_rounds_percentage() {
    let detection = Detection::new([0.0, 0.0, 1.0, 1.0], "cat", 0.806);
    assert_eq!(detection.caption(), "cat (81%)");
    let detection = Detection::new([0.0, 0.0, 1.0, 1.0], "dining table", 0.5);
    assert_eq!(detection.caption(), "dining table (50%)");
  }
}
