// 该文件是 Uncommon （罕物） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use uncommon::{
  FromUrl,
  detector::JsonDetector,
  input::ImageFileInput,
  output::{SaveImageFileOutput, draw::Overlay},
  task::{OneShotTask, Task},
};

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("输入来源: {}", args.input);
  info!("检测结果: {}", args.detections);
  info!("输出路径: {}", args.output);
  info!(
    "画布上限: {}x{}，块大小除数: {}",
    args.viewport_width, args.viewport_height, args.divisor
  );

  let input = ImageFileInput::from_url(&args.input)?;
  let detector = JsonDetector::from_url(&args.detections)?;
  let output = SaveImageFileOutput::from_url(&args.output)?;
  let font = args.font.as_ref().map(Overlay::load_font).transpose()?;

  OneShotTask::new(args.render_config())
    .with_overlay(args.show_boxes)
    .with_font(font)
    .run_task(input, detector, output)
    .await?;

  Ok(())
}
