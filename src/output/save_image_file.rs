// 该文件是 Uncommon （罕物） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Export, url_file_path};

/// URL 指向目录时使用的文件名
pub const DEFAULT_FILE_NAME: &str = "uncommon-object.jpg";

pub struct SaveImageFileOutput {
  path: PathBuf,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let mut path = url_file_path(uri);
    if uri.path().ends_with('/') {
      path.push(DEFAULT_FILE_NAME);
    }

    Ok(SaveImageFileOutput { path })
  }
}

impl SaveImageFileOutput {
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn is_jpeg(&self) -> bool {
    self
      .path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
  }
}

impl Export for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn export(&self, image: &RgbaImage) -> Result<(), Self::Error> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    // JPEG 不支持透明通道
    if self.is_jpeg() {
      DynamicImage::ImageRgba8(image.clone())
        .to_rgb8()
        .save(&self.path)?;
    } else {
      image.save(&self.path)?;
    }

    warn!("保存图像到文件: {}", self.path.display());

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgba;

  #[test]
  fn directory_url_gets_default_name() {
    let output = SaveImageFileOutput::from_url(&Url::parse("image:///tmp/out/").unwrap()).unwrap();
    assert_eq!(output.path(), Path::new("/tmp/out").join(DEFAULT_FILE_NAME));
    assert!(output.is_jpeg());
  }

  #[test]
  fn exports_png_and_jpeg() {
    let dir = std::env::temp_dir().join("uncommon-export-test");
    let image = RgbaImage::from_pixel(8, 6, Rgba([40, 80, 120, 255]));

    for name in ["frame.png", "frame.jpg"] {
      let url = Url::parse(&format!("image://{}/{}", dir.display(), name)).unwrap();
      let output = SaveImageFileOutput::from_url(&url).unwrap();
      output.export(&image).unwrap();
      let reloaded = image::open(output.path()).unwrap();
      assert_eq!((reloaded.width(), reloaded.height()), (8, 6));
    }
  }

  #[test]
  fn wrong_scheme_rejected() {
    assert!(matches!(
      SaveImageFileOutput::from_url(&Url::parse("json:///a.jpg").unwrap()),
      Err(SaveImageFileError::SchemeMismatch(_))
    ));
  }
}
