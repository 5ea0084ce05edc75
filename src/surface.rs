// 该文件是 Uncommon （罕物） 项目的一部分。
// src/surface.rs - 显示画布
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

use image::{Rgba, RgbaImage, imageops};

use crate::geometry::Region;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub trait Surface {
  fn width(&self) -> u32;
  fn height(&self) -> u32;

  fn area(&self) -> u64 {
    self.width() as u64 * self.height() as u64
  }

  /// 清空为全透明
  fn clear(&mut self);

  /// 在左上角写入图像（不做 alpha 混合），超出部分被丢弃
  fn draw_image(&mut self, image: &RgbaImage);

  /// 读取矩形区域的像素副本
  fn get_region(&self, region: Region) -> RgbaImage;

  /// 将像素块写回 (x, y)
  fn put_region(&mut self, pixels: &RgbaImage, x: u32, y: u32);

  fn raster(&self) -> &RgbaImage;
  fn raster_mut(&mut self) -> &mut RgbaImage;
}

/// 内存中的 RGBA 画布
#[derive(Debug, Clone)]
pub struct Canvas {
  data: RgbaImage,
}

impl Canvas {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      data: RgbaImage::from_pixel(width, height, TRANSPARENT),
    }
  }
}

impl From<RgbaImage> for Canvas {
  fn from(data: RgbaImage) -> Self {
    Self { data }
  }
}

impl Surface for Canvas {
  fn width(&self) -> u32 {
    self.data.width()
  }

  fn height(&self) -> u32 {
    self.data.height()
  }

  fn clear(&mut self) {
    for pixel in self.data.pixels_mut() {
      *pixel = TRANSPARENT;
    }
  }

  fn draw_image(&mut self, image: &RgbaImage) {
    imageops::replace(&mut self.data, image, 0, 0);
  }

  fn get_region(&self, region: Region) -> RgbaImage {
    imageops::crop_imm(&self.data, region.x, region.y, region.width, region.height).to_image()
  }

  fn put_region(&mut self, pixels: &RgbaImage, x: u32, y: u32) {
    imageops::replace(&mut self.data, pixels, x as i64, y as i64);
  }

  fn raster(&self) -> &RgbaImage {
    &self.data
  }

  fn raster_mut(&mut self) -> &mut RgbaImage {
    &mut self.data
  }
}
