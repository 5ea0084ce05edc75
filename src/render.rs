// 该文件是 Uncommon （罕物） 项目的一部分。
// src/render.rs - 渲染流程编排
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

//! 两个状态：`Idle`（未加载图像）与 `Rendered`（图像与检测结果已绘制）。
//!
//! 每次上传分配一个递增的代号，检测完成后只有代号仍为最新时才会提交；
//! 渲染在离屏画布上完成，提交时整体替换，失败的上传不会留下半成品。
//! 重叠的检测框按检测器返回的顺序依次处理，后处理者覆盖重叠像素。

use std::{
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
  },
  time::Instant,
};

use ab_glyph::FontArc;
use image::{RgbaImage, imageops};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  config::RenderConfig,
  detector::{Detection, Detector},
  factor::PixelationFactor,
  geometry::{GeometryError, ScaleRatio},
  input::ImageSource,
  output::draw::Overlay,
  pixelate::pixelate_surface,
  surface::{Canvas, Surface},
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum RenderError {
  #[error("图像输入错误: {0}")]
  Input(#[source] BoxError),
  #[error("图像尺寸错误: {0}")]
  Geometry(#[from] GeometryError),
  #[error("目标检测失败: {0}")]
  Detection(#[source] BoxError),
  #[error("上传 #{0} 已被更新的上传取代")]
  Superseded(u64),
  #[error("尚未加载图像")]
  NotRendered,
}

/// 一次上传对应的不可变上下文
#[derive(Debug)]
pub struct Session {
  generation: u64,
  source_size: (u32, u32),
  ratio: ScaleRatio,
  base: RgbaImage,
  detections: Vec<Detection>,
}

impl Session {
  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn source_size(&self) -> (u32, u32) {
    self.source_size
  }

  pub fn ratio(&self) -> ScaleRatio {
    self.ratio
  }

  pub fn display_size(&self) -> (u32, u32) {
    self.base.dimensions()
  }

  /// 已缩放到画布尺寸的原图
  pub fn base(&self) -> &RgbaImage {
    &self.base
  }

  pub fn detections(&self) -> &[Detection] {
    &self.detections
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
  /// `pixelated` 为实际修改了像素的检测数量
  Rendered { detections: usize, pixelated: usize },
  /// 未发现常见物体，原图原样显示
  NothingDetected,
}

/// 清空画布、重绘原图，再依次马赛克；叠加层最后绘制以免被覆盖
pub fn render_pass<S: Surface>(
  surface: &mut S,
  session: &Session,
  config: &RenderConfig,
  overlay: Option<&Overlay>,
) -> usize {
  surface.clear();
  surface.draw_image(&session.base);

  let area = surface.area();
  let ratio = session.ratio;
  let mut pixelated = 0;

  for detection in &session.detections {
    let rect = ratio.scale_box(&detection.bbox);
    let factor =
      PixelationFactor::from_confidence(area, detection.score, config.pixelation_divisor);
    debug!(
      "{}: ({}, {}, {}x{}) 块大小 {}",
      detection.label, rect.x, rect.y, rect.width, rect.height, factor
    );
    if pixelate_surface(surface, rect, factor) {
      pixelated += 1;
    }
  }

  if let Some(overlay) = overlay {
    for detection in &session.detections {
      let rect = ratio.scale_box(&detection.bbox);
      overlay.draw(
        surface.raster_mut(),
        rect,
        &detection.caption(),
        ratio.value(),
      );
    }
  }

  pixelated
}

enum RenderState {
  Idle,
  Rendered {
    session: Arc<Session>,
    canvas: Canvas,
  },
}

struct Inner {
  state: RenderState,
  overlay_visible: bool,
}

pub struct Orchestrator<D> {
  detector: D,
  config: RenderConfig,
  overlay: Overlay,
  generation: AtomicU64,
  inner: Mutex<Inner>,
}

impl<D: Detector> Orchestrator<D> {
  pub fn new(detector: D, config: RenderConfig) -> Self {
    let overlay = Overlay::new(config.overlay.clone());
    Self {
      detector,
      config,
      overlay,
      generation: AtomicU64::new(0),
      inner: Mutex::new(Inner {
        state: RenderState::Idle,
        overlay_visible: false,
      }),
    }
  }

  pub fn with_font(mut self, font: FontArc) -> Self {
    self.overlay = self.overlay.with_font(font);
    self
  }

  pub fn config(&self) -> &RenderConfig {
    &self.config
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn ensure_current(&self, generation: u64) -> Result<(), RenderError> {
    let latest = self.generation.load(Ordering::SeqCst);
    if latest != generation {
      warn!("上传 #{} 已过期（最新 #{}），丢弃结果", generation, latest);
      return Err(RenderError::Superseded(generation));
    }
    Ok(())
  }

  /// 加载、检测并渲染一张新图像；失败时保留之前的状态
  pub async fn upload<I: ImageSource>(&self, source: I) -> Result<RenderOutcome, RenderError> {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    info!("开始处理上传 #{}", generation);

    let image = source
      .load()
      .await
      .map_err(|e| RenderError::Input(Box::new(e)))?;
    self.ensure_current(generation)?;

    let source_size = image.dimensions();
    let viewport = self.config.viewport;
    let ratio = ScaleRatio::fit(
      source_size.0,
      source_size.1,
      viewport.max_width,
      viewport.max_height,
    )?;
    let (width, height) = ratio.display_size(
      source_size.0,
      source_size.1,
      viewport.max_width,
      viewport.max_height,
    );
    info!(
      "源图像 {}x{}，缩放比例 {:.4}，画布 {}x{}",
      source_size.0,
      source_size.1,
      ratio.value(),
      width,
      height
    );

    let now = Instant::now();
    let detections = self
      .detector
      .detect(&image)
      .await
      .map_err(|e| RenderError::Detection(Box::new(e)))?;
    info!(
      "检测完成，耗时: {:.2?}，共 {} 个目标",
      now.elapsed(),
      detections.len()
    );
    self.ensure_current(generation)?;

    let base = if (width, height) == source_size {
      image
    } else {
      imageops::resize(&image, width, height, self.config.resize_filter)
    };
    let session = Arc::new(Session {
      generation,
      source_size,
      ratio,
      base,
      detections,
    });

    let now = Instant::now();
    let mut canvas = Canvas::new(width, height);
    let pixelated = render_pass(&mut canvas, &session, &self.config, None);
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    let outcome = if session.detections.is_empty() {
      info!("未发现常见物体");
      RenderOutcome::NothingDetected
    } else {
      RenderOutcome::Rendered {
        detections: session.detections.len(),
        pixelated,
      }
    };

    let mut inner = self.lock();
    self.ensure_current(generation)?;
    inner.state = RenderState::Rendered { session, canvas };
    inner.overlay_visible = false;

    Ok(outcome)
  }

  /// 不重新检测，基于已保存的检测结果重新渲染
  pub fn redraw(&self) -> Result<usize, RenderError> {
    let mut inner = self.lock();
    self.redraw_locked(&mut inner)
  }

  fn redraw_locked(&self, inner: &mut Inner) -> Result<usize, RenderError> {
    let Inner {
      state,
      overlay_visible,
    } = inner;
    match state {
      RenderState::Idle => Err(RenderError::NotRendered),
      RenderState::Rendered { session, canvas } => {
        debug!(
          "重绘上传 #{}，叠加层: {}",
          session.generation, overlay_visible
        );
        let overlay = overlay_visible.then_some(&self.overlay);
        Ok(render_pass(canvas, session, &self.config, overlay))
      }
    }
  }

  /// 切换检测框显示；未加载图像时只记录状态，返回是否触发了重绘
  pub fn set_overlay_visible(&self, visible: bool) -> bool {
    let mut inner = self.lock();
    inner.overlay_visible = visible;
    self.redraw_locked(&mut inner).is_ok()
  }

  pub fn overlay_visible(&self) -> bool {
    self.lock().overlay_visible
  }

  pub fn is_rendered(&self) -> bool {
    matches!(self.lock().state, RenderState::Rendered { .. })
  }

  pub fn session(&self) -> Option<Arc<Session>> {
    match &self.lock().state {
      RenderState::Idle => None,
      RenderState::Rendered { session, .. } => Some(session.clone()),
    }
  }

  /// 当前画布内容的副本
  pub fn snapshot(&self) -> Option<RgbaImage> {
    match &self.lock().state {
      RenderState::Idle => None,
      RenderState::Rendered { canvas, .. } => Some(canvas.raster().clone()),
    }
  }
}
