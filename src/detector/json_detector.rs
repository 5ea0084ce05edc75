// 该文件是 Uncommon （罕物） 项目的一部分。
// src/detector/json_detector.rs - 从 JSON 文件回放检测结果
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

use std::path::PathBuf;

use image::RgbaImage;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detector::{Detection, Detector},
  url_file_path,
};

#[derive(Error, Debug)]
pub enum JsonDetectorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测结果解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("置信度超出范围 [0, 1]: {0}")]
  ScoreOutOfRange(f64),
  #[error("无效的查询参数 {0}={1}")]
  InvalidQuery(String, String),
}

/// COCO-SSD 输出格式的单条记录
#[derive(Debug, Deserialize)]
struct RawDetection {
  bbox: [f32; 4],
  class: String,
  score: f64,
}

/// 读取预先计算好的检测结果，按文件中的顺序返回
pub struct JsonDetector {
  path: PathBuf,
  min_score: f64,
  max_detections: Option<usize>,
}

impl FromUrlWithScheme for JsonDetector {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonDetector {
  type Error = JsonDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonDetectorError::SchemeMismatch(format!(
        "期望检测方式 '{}', 实际检测方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let mut detector = JsonDetector {
      path: url_file_path(url),
      min_score: 0.0,
      max_detections: None,
    };

    // json:///path/detections.json?min_score=0.5&max=20
    for (k, v) in url.query_pairs() {
      let invalid = || JsonDetectorError::InvalidQuery(k.to_string(), v.to_string());
      match k.as_ref() {
        "min_score" => detector = detector.with_min_score(v.parse().map_err(|_| invalid())?),
        "max" => {
          detector = detector.with_max_detections(Some(v.parse().map_err(|_| invalid())?))
        }
        _ => debug!("忽略未知查询参数: {}", k),
      }
    }

    Ok(detector)
  }
}

impl JsonDetector {
  pub fn with_min_score(mut self, min_score: f64) -> Self {
    self.min_score = min_score;
    self
  }

  pub fn with_max_detections(mut self, max_detections: Option<usize>) -> Self {
    self.max_detections = max_detections;
    self
  }

  fn parse(&self, data: &[u8]) -> Result<Vec<Detection>, JsonDetectorError> {
    let raw: Vec<RawDetection> = serde_json::from_slice(data)?;
    let limit = self.max_detections.unwrap_or(usize::MAX);

    let mut detections = Vec::with_capacity(raw.len().min(limit));
    for RawDetection { bbox, class, score } in raw {
      if !(0.0..=1.0).contains(&score) {
        return Err(JsonDetectorError::ScoreOutOfRange(score));
      }
      if score < self.min_score {
        debug!("丢弃低置信度目标: {} {:.2}", class, score);
        continue;
      }
      if detections.len() >= limit {
        break;
      }
      detections.push(Detection::new(bbox, class, score));
    }
    Ok(detections)
  }
}

impl Detector for JsonDetector {
  type Error = JsonDetectorError;

  async fn detect(&self, image: &RgbaImage) -> Result<Vec<Detection>, Self::Error> {
    info!(
      "读取检测结果: {} (图像 {}x{})",
      self.path.display(),
      image.width(),
      image.height()
    );
    let data = tokio::fs::read(&self.path).await?;
    let detections = self.parse(&data)?;
    debug!("共 {} 个目标", detections.len());
    Ok(detections)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::BoundingBox;

  fn detector() -> JsonDetector {
    JsonDetector::from_url(&Url::parse("json:///tmp/detections.json").unwrap()).unwrap()
  }

  #[test]
  fn parses_coco_ssd_layout_in_order() {
    let data = br#"[
      {"bbox": [10, 20, 30, 40], "class": "dog", "score": 0.4},
      {"bbox": [1.5, 2.5, 3.5, 4.5], "class": "cat", "score": 0.9}
    ]"#;
    let detections = detector().parse(data).unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].label, "dog");
    assert_eq!(detections[1].bbox, BoundingBox::new(1.5, 2.5, 3.5, 4.5));
  }

  #[test]
  fn applies_score_and_count_limits() {
    let data = br#"[
      {"bbox": [0, 0, 1, 1], "class": "a", "score": 0.2},
      {"bbox": [0, 0, 1, 1], "class": "b", "score": 0.7},
      {"bbox": [0, 0, 1, 1], "class": "c", "score": 0.8},
      {"bbox": [0, 0, 1, 1], "class": "d", "score": 0.9}
    ]"#;
    let detections = detector()
      .with_min_score(0.5)
      .with_max_detections(Some(2))
      .parse(data)
      .unwrap();
    let labels: Vec<_> = detections.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, ["b", "c"]);
  }

  #[test]
  fn rejects_bad_input() {
    assert!(matches!(
      detector().parse(b"{\"bbox\": 1}"),
      Err(JsonDetectorError::ParseError(_))
    ));
    assert!(matches!(
      detector().parse(br#"[{"bbox": [0, 0, 1, 1], "class": "x", "score": 1.5}]"#),
      Err(JsonDetectorError::ScoreOutOfRange(_))
    ));
    assert!(matches!(
      JsonDetector::from_url(&Url::parse("image:///a.png").unwrap()),
      Err(JsonDetectorError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn reads_options_from_query() {
    let url = Url::parse("json:///data/my%20shots/d.json?min_score=0.25&max=3").unwrap();
    let detector = JsonDetector::from_url(&url).unwrap();
    assert_eq!(detector.path, PathBuf::from("/data/my shots/d.json"));
    assert_eq!(detector.min_score, 0.25);
    assert_eq!(detector.max_detections, Some(3));

    let url = Url::parse("json:///d.json?max=many").unwrap();
    assert!(matches!(
      JsonDetector::from_url(&url),
      Err(JsonDetectorError::InvalidQuery(_, _))
    ));
  }

  #[tokio::test]
  async fn missing_file_is_io_error() {
    let url = Url::parse("json:///nonexistent/uncommon/detections.json").unwrap();
    let detector = JsonDetector::from_url(&url).unwrap();
    let image = RgbaImage::new(1, 1);
    assert!(matches!(
      detector.detect(&image).await,
      Err(JsonDetectorError::IoError(_))
    ));
  }
}
