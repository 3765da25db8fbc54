// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/input.rs - 图像输入
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

use crate::detect::ImageSize;

/// 提供帧的像素尺寸，解码时用于反归一化
pub trait HasImageSize {
  fn image_size(&self) -> ImageSize;
}

impl HasImageSize for ImageSize {
  fn image_size(&self) -> ImageSize {
    *self
  }
}

#[cfg(feature = "image")]
impl HasImageSize for image::RgbImage {
  fn image_size(&self) -> ImageSize {
    ImageSize::new(self.width(), self.height())
  }
}

/// 帧处理完成后保留的信息，批量任务只保留它而不保留像素
pub trait FrameInfo: HasImageSize {
  type Info;
  fn info(&self) -> Self::Info;
}

impl FrameInfo for ImageSize {
  type Info = ImageSize;

  fn info(&self) -> ImageSize {
    *self
  }
}

#[cfg(feature = "image")]
impl FrameInfo for image::RgbImage {
  type Info = ImageSize;

  fn info(&self) -> ImageSize {
    self.image_size()
  }
}

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{
  ImageDirectoryInput, ImageFileInput, ImageFileInputError, ImageFrame,
};
