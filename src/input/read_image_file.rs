// 该文件是 Uncommon （罕物） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::ImageSource, url_file_path};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("No file selected")]
  NoFile,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("Decode task failed: {0}")]
  TaskError(#[from] tokio::task::JoinError),
}

pub struct ImageFileInput {
  path: PathBuf,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url_file_path(url);
    if path.file_name().is_none() {
      return Err(ImageFileInputError::NoFile);
    }

    Ok(ImageFileInput { path })
  }
}

impl ImageFileInput {
  pub fn path(&self) -> &std::path::Path {
    &self.path
  }
}

impl ImageSource for ImageFileInput {
  type Error = ImageFileInputError;

  async fn load(self) -> Result<RgbaImage, Self::Error> {
    let path = self.path;
    info!("解码图像文件: {}", path.display());
    // 解码是 CPU 密集操作，放到阻塞线程池
    let image = tokio::task::spawn_blocking(move || -> Result<RgbaImage, ImageFileInputError> {
      let mut decoder = ImageReader::open(&path)?
        .with_guessed_format()?
        .into_decoder()?;
      // 检测结果基于按 EXIF 方向摆正后的图像
      let orientation = decoder.orientation()?;
      let mut image = DynamicImage::from_decoder(decoder)?;
      image.apply_orientation(orientation);
      Ok(image.to_rgba8())
    })
    .await??;
    info!("图像尺寸: {}x{}", image.width(), image.height());
    Ok(image)
  }
}
