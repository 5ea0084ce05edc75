// 该文件是 Uncommon （罕物） 项目的一部分。
// src/pixelate.rs - 区域马赛克
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

//! 块平均马赛克。
//!
//! 块网格锚定在目标矩形自身的左上角（而不是画布原点），最后一行/列的块
//! 可能被截断。每个块先累加求均值，再整体写回，两步互相独立：
//! 累加由 [`Accumulator`] 完成，可以替换为积分图实现而不影响写回。

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::{
  factor::PixelationFactor,
  geometry::{PixelRect, Region},
  surface::Surface,
};

const CHANNELS: usize = 4;

/// 块均值计算
pub trait Accumulator: Sized {
  /// 在写回开始之前，基于 `region` 内的原始像素准备
  fn prepare(image: &RgbaImage, region: Region) -> Self;

  /// `block` 内各通道的向下取整均值，空块返回 `None`
  fn block_mean(&self, image: &RgbaImage, block: Region) -> Option<Rgba<u8>>;
}

/// 逐块直接求和
pub struct DirectSum;

impl Accumulator for DirectSum {
  fn prepare(_image: &RgbaImage, _region: Region) -> Self {
    DirectSum
  }

  fn block_mean(&self, image: &RgbaImage, block: Region) -> Option<Rgba<u8>> {
    let mut sums = [0u64; CHANNELS];
    let mut count = 0u64;

    for y in block.y..block.bottom() {
      for x in block.x..block.right() {
        let pixel = image.get_pixel(x, y);
        for (sum, value) in sums.iter_mut().zip(pixel.0) {
          *sum += value as u64;
        }
        count += 1;
      }
    }

    mean_of(sums, count)
  }
}

/// 积分图（summed-area table），只覆盖裁剪后的区域
pub struct SummedArea {
  origin_x: u32,
  origin_y: u32,
  stride: usize,
  table: Vec<[u64; CHANNELS]>,
}

impl SummedArea {
  fn at(&self, x: u32, y: u32) -> [u64; CHANNELS] {
    // 表比区域多一行一列的零
    let col = (x - self.origin_x) as usize;
    let row = (y - self.origin_y) as usize;
    self.table[row * self.stride + col]
  }
}

impl Accumulator for SummedArea {
  fn prepare(image: &RgbaImage, region: Region) -> Self {
    let stride = region.width as usize + 1;
    let rows = region.height as usize + 1;
    let mut table = vec![[0u64; CHANNELS]; stride * rows];

    for row in 0..region.height as usize {
      let mut running = [0u64; CHANNELS];
      for col in 0..region.width as usize {
        let pixel = image.get_pixel(region.x + col as u32, region.y + row as u32);
        let above = table[row * stride + col + 1];
        let cell = &mut table[(row + 1) * stride + col + 1];
        for c in 0..CHANNELS {
          running[c] += pixel.0[c] as u64;
          cell[c] = above[c] + running[c];
        }
      }
    }

    Self {
      origin_x: region.x,
      origin_y: region.y,
      stride,
      table,
    }
  }

  fn block_mean(&self, _image: &RgbaImage, block: Region) -> Option<Rgba<u8>> {
    let a = self.at(block.x, block.y);
    let b = self.at(block.right(), block.y);
    let c = self.at(block.x, block.bottom());
    let d = self.at(block.right(), block.bottom());

    let mut sums = [0u64; CHANNELS];
    for i in 0..CHANNELS {
      sums[i] = d[i] + a[i] - b[i] - c[i];
    }
    mean_of(sums, block.area())
  }
}

fn mean_of(sums: [u64; CHANNELS], count: u64) -> Option<Rgba<u8>> {
  if count == 0 {
    return None;
  }
  Some(Rgba(sums.map(|sum| (sum / count) as u8)))
}

fn fill_block(image: &mut RgbaImage, block: Region, color: Rgba<u8>) {
  for y in block.y..block.bottom() {
    for x in block.x..block.right() {
      image.put_pixel(x, y, color);
    }
  }
}

/// 使用默认累加器对 `rect` 做马赛克，返回是否修改了缓冲区
pub fn pixelate_area(image: &mut RgbaImage, rect: PixelRect, factor: PixelationFactor) -> bool {
  pixelate_area_with::<DirectSum>(image, rect, factor)
}

/// `factor <= 1` 或矩形与画布无交集时什么都不做
pub fn pixelate_area_with<A: Accumulator>(
  image: &mut RgbaImage,
  rect: PixelRect,
  factor: PixelationFactor,
) -> bool {
  if factor.is_noop() {
    return false;
  }

  let Some(clipped) = rect.clip(image.width(), image.height()) else {
    debug!("区域 {:?} 完全位于画布之外，跳过", rect);
    return false;
  };
  if clipped.area() != rect.width as u64 * rect.height as u64 {
    debug!("区域 {:?} 超出画布，裁剪为 {:?}", rect, clipped);
  }

  let accumulator = A::prepare(image, clipped);
  let step = factor.get() as i64;

  // 从第一个与裁剪区域相交的块开始，网格仍以 rect 原点对齐
  let first_col = (clipped.x as i64 - rect.x as i64) / step;
  let first_row = (clipped.y as i64 - rect.y as i64) / step;
  let last_x = clipped.right() as i64;
  let last_y = clipped.bottom() as i64;

  let mut block_y = rect.y as i64 + first_row * step;
  while block_y < last_y {
    let mut block_x = rect.x as i64 + first_col * step;
    while block_x < last_x {
      if let Some(block) = block_region(block_x, block_y, step).intersect(&clipped)
        && let Some(color) = accumulator.block_mean(image, block)
      {
        fill_block(image, block, color);
      }
      block_x += step;
    }
    block_y += step;
  }

  true
}

/// 经由画布的读/写接口完成马赛克：取出裁剪区域，处理后整体写回
pub fn pixelate_surface<S: Surface>(
  surface: &mut S,
  rect: PixelRect,
  factor: PixelationFactor,
) -> bool {
  if factor.is_noop() {
    return false;
  }
  let Some(region) = rect.clip(surface.width(), surface.height()) else {
    debug!("区域 {:?} 完全位于画布之外，跳过", rect);
    return false;
  };

  let mut pixels = surface.get_region(region);
  let local = PixelRect::new(
    rect.x - region.x as i32,
    rect.y - region.y as i32,
    rect.width,
    rect.height,
  );
  let changed = pixelate_area(&mut pixels, local, factor);
  if changed {
    surface.put_region(&pixels, region.x, region.y);
  }
  changed
}

fn block_region(x: i64, y: i64, step: i64) -> Region {
  // 调用方保证块与裁剪区域（非负坐标）相交
  let x0 = x.max(0);
  let y0 = y.max(0);
  Region {
    x: x0 as u32,
    y: y0 as u32,
    width: (x + step - x0).max(0) as u32,
    height: (y + step - y0).max(0) as u32,
  }
}
