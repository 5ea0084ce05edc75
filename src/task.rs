// 该文件是 Uncommon （罕物） 项目的一部分。
// src/task.rs - 单张图像处理任务
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

use std::future::Future;

use ab_glyph::FontArc;
use tracing::{info, warn};

use crate::{
  config::RenderConfig,
  detector::Detector,
  input::ImageSource,
  output::Export,
  render::{Orchestrator, RenderOutcome},
};

pub trait Task<I, D, O>: Sized {
  type Error;
  fn run_task(
    self,
    input: I,
    detector: D,
    output: O,
  ) -> impl Future<Output = Result<RenderOutcome, Self::Error>>;
}

/// 读取一张图像，检测、马赛克后导出
#[derive(Default)]
pub struct OneShotTask {
  config: RenderConfig,
  show_overlay: bool,
  font: Option<FontArc>,
}

impl OneShotTask {
  pub fn new(config: RenderConfig) -> Self {
    Self {
      config,
      ..Default::default()
    }
  }

  pub fn with_overlay(mut self, show_overlay: bool) -> Self {
    self.show_overlay = show_overlay;
    self
  }

  pub fn with_font(mut self, font: Option<FontArc>) -> Self {
    self.font = font;
    self
  }
}

impl<I, D, O, OE> Task<I, D, O> for OneShotTask
where
  I: ImageSource,
  D: Detector,
  O: Export<Error = OE>,
  OE: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  async fn run_task(self, input: I, detector: D, output: O) -> Result<RenderOutcome, Self::Error> {
    info!("开始任务...");
    let mut orchestrator = Orchestrator::new(detector, self.config);
    if let Some(font) = self.font {
      orchestrator = orchestrator.with_font(font);
    }

    let outcome = orchestrator.upload(input).await?;
    match outcome {
      RenderOutcome::NothingDetected => warn!("未发现常见物体，输出原图"),
      RenderOutcome::Rendered {
        detections,
        pixelated,
      } => {
        info!("共 {} 个目标，{} 个区域已马赛克", detections, pixelated);
        if self.show_overlay {
          orchestrator.set_overlay_visible(true);
        }
      }
    }

    let image = orchestrator
      .snapshot()
      .ok_or_else(|| anyhow::anyhow!("没有可导出的画面"))?;
    output.export(&image)?;
    info!("任务完成，退出");

    Ok(outcome)
  }
}
