// 该文件是 Uncommon （罕物） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

use uncommon::config::{RenderConfig, Viewport};

/// Uncommon 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像，例如 image:///path/to/photo.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 检测结果（COCO-SSD 格式 JSON），例如 json:///path/to/detections.json?min_score=0.5
  #[arg(long, value_name = "DETECTIONS")]
  pub detections: Url,

  /// 输出路径，以 / 结尾时使用默认文件名
  #[arg(long, value_name = "OUTPUT", default_value = "image:uncommon-object.jpg")]
  pub output: Url,

  /// 绘制检测框和标签
  #[arg(long)]
  pub show_boxes: bool,

  /// 画布最大宽度
  #[arg(long, default_value = "1728", value_name = "PIXELS")]
  pub viewport_width: u32,

  /// 画布最大高度
  #[arg(long, default_value = "756", value_name = "PIXELS")]
  pub viewport_height: u32,

  /// 最大块边长 = sqrt(画布面积) / DIVISOR
  #[arg(long, default_value = "20", value_name = "DIVISOR")]
  pub divisor: f64,

  /// 标签字体（TrueType），未指定时使用内置字体
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,
}

impl Args {
  pub fn render_config(&self) -> RenderConfig {
    RenderConfig::default()
      .with_viewport(Viewport::new(self.viewport_width, self.viewport_height))
      .with_pixelation_divisor(self.divisor)
  }
}
