// 该文件是 Xuedao （雪道排队） 项目的一部分。
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

use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detect::ImageSize,
  input::{FrameInfo, HasImageSize},
};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 读取单张图像，作为只产出一帧的迭代器使用
pub struct ImageFileInput {
  image: Option<RgbImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch(url.scheme().to_string()));
    }

    Self::open(url.path())
  }
}

impl ImageFileInput {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImageFileInputError> {
    let path = path.as_ref();
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let image = image.into_rgb8();
    debug!(
      "读取图像 {}: {}x{}",
      path.display(),
      image.width(),
      image.height()
    );

    Ok(ImageFileInput { image: Some(image) })
  }

  pub fn from_image(image: RgbImage) -> Self {
    ImageFileInput { image: Some(image) }
  }
}

impl Iterator for ImageFileInput {
  type Item = RgbImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// 带来源路径的图像帧
#[derive(Debug, Clone)]
pub struct ImageFrame {
  pub path: PathBuf,
  pub image: RgbImage,
}

impl HasImageSize for ImageFrame {
  fn image_size(&self) -> ImageSize {
    self.image.image_size()
  }
}

impl FrameInfo for ImageFrame {
  type Info = PathBuf;

  fn info(&self) -> PathBuf {
    self.path.clone()
  }
}

/// 按文件名顺序读取目录中的全部图像
///
/// 无法解码的文件记录日志后跳过。
pub struct ImageDirectoryInput {
  paths: std::vec::IntoIter<PathBuf>,
}

impl FromUrlWithScheme for ImageDirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for ImageDirectoryInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ImageFileInputError::SchemeMismatch(url.scheme().to_string()));
    }

    Self::open(url.path())
  }
}

impl ImageDirectoryInput {
  pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self, ImageFileInputError> {
    let directory = directory.as_ref();
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory)? {
      let path = entry?.path();
      let is_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
          IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false);
      if is_image && path.is_file() {
        paths.push(path);
      }
    }
    paths.sort();
    info!("目录 {} 中找到 {} 张图像", directory.display(), paths.len());

    Ok(Self {
      paths: paths.into_iter(),
    })
  }
}

impl Iterator for ImageDirectoryInput {
  type Item = ImageFrame;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.paths.by_ref() {
      match ImageFileInput::open(&path) {
        Ok(mut input) => {
          if let Some(image) = input.next() {
            return Some(ImageFrame { path, image });
          }
        }
        Err(e) => error!("读取图像 {} 失败，已跳过: {}", path.display(), e),
      }
    }
    None
  }
}
