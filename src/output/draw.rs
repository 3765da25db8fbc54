// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{debug, info};

use crate::detect::{BBox, Detection, DetectionResult};

const BOX_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const BOX_THICKNESS: u32 = 2;
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_OFFSET_Y: i32 = 10;

#[derive(Error, Debug)]
pub enum FontError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 在图像上绘制检测框与标签
///
/// 边界框超出图像时只绘制落在图像内的部分。未设置字体时只画框。
pub struct Annotator {
  font: Option<FontVec>,
  font_size: f32,
  color: [u8; 3],
  thickness: u32,
}

impl Default for Annotator {
  fn default() -> Self {
    Self {
      font: None,
      font_size: LABEL_FONT_SIZE,
      color: BOX_COLOR,
      thickness: BOX_THICKNESS,
    }
  }
}

impl Annotator {
  pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontVec, FontError> {
    let path = path.as_ref();
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    Ok(FontVec::try_from_vec(data)?)
  }

  pub fn with_font(mut self, font: FontVec) -> Self {
    self.font = Some(font);
    self
  }

  pub fn with_font_size(mut self, font_size: f32) -> Self {
    self.font_size = font_size;
    self
  }

  pub fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }

  pub fn annotate(&self, image: &mut RgbImage, result: &DetectionResult) {
    for detection in result.detections.iter() {
      self.draw_detection(image, detection);
    }
    debug!("绘制 {} 个检测框", result.detections.len());
  }

  pub fn annotated(&self, image: &RgbImage, result: &DetectionResult) -> RgbImage {
    let mut image = image.clone();
    self.annotate(&mut image, result);
    image
  }

  fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
    let color = Rgb(self.color);
    let bbox = detection.bbox;
    let (image_width, image_height) = (image.width() as i64, image.height() as i64);

    if !bbox.is_valid()
      || bbox.right() <= 0
      || bbox.bottom() <= 0
      || bbox.x as i64 >= image_width
      || bbox.y as i64 >= image_height
    {
      debug!("检测框 {:?} 不在图像内，跳过绘制", bbox);
      return;
    }

    for t in 0..self.thickness as i64 {
      let left = bbox.x as i64 + t;
      let top = bbox.y as i64 + t;
      let right = bbox.right() - 1 - t;
      let bottom = bbox.bottom() - 1 - t;
      if right < left || bottom < top {
        break;
      }
      if let Some(rect) = clip_rect(left, top, right, bottom, image_width, image_height) {
        draw_hollow_rect_mut(image, rect, color);
      }
    }

    // 文本底边位于 (x, y - 10)
    if let Some(font) = &self.font {
      let caption = detection.caption();
      let Some((text_x, text_y)) = caption_origin(
        &bbox,
        self.font_size,
        caption.chars().count(),
        image_width,
        image_height,
      ) else {
        return;
      };
      draw_text_mut(
        image,
        color,
        text_x,
        text_y,
        PxScale::from(self.font_size),
        font,
        &caption,
      );
    }
  }
}

/// 把矩形裁剪到图像外扩一像素的范围内
///
/// 落在 -1 或图像宽高处的边不可见，裁剪后的矩形与原矩形在图像内的轮廓一致。
fn clip_rect(left: i64, top: i64, right: i64, bottom: i64, width: i64, height: i64) -> Option<Rect> {
  let left = left.max(-1);
  let top = top.max(-1);
  let right = right.min(width);
  let bottom = bottom.min(height);
  if right < left || bottom < top {
    return None;
  }

  Some(Rect::at(left as i32, top as i32).of_size((right - left + 1) as u32, (bottom - top + 1) as u32))
}

/// 标签文本左上角；文本完全落在图像外时返回 `None`
///
/// 每个字符按不超过两倍字号估算文本范围。
fn caption_origin(
  bbox: &BBox,
  font_size: f32,
  chars: usize,
  width: i64,
  height: i64,
) -> Option<(i32, i32)> {
  if !font_size.is_finite() || font_size <= 0.0 {
    return None;
  }
  let glyph = (font_size * 2.0).ceil() as i64;
  let x = bbox.x as i64;
  let y = bbox.y as i64 - LABEL_OFFSET_Y as i64 - font_size.ceil() as i64;
  let extent_x = glyph.saturating_mul(chars as i64 + 1);

  if x >= width || x.saturating_add(extent_x) < 0 || y >= height || y.saturating_add(glyph) < 0 {
    return None;
  }

  Some((i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detect::{BoxDecoder, ImageSize, PredictionLayout, Upright};

  const SYSTEM_FONTS: [&str; 2] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
  ];

  fn decode_person(cx: f32, cy: f32) -> BBox {
    let mut cell = vec![cx, cy, 0.1, 0.3, 1.0];
    let mut scores = vec![0.0; 80];
    scores[0] = 0.9;
    cell.extend(scores);

    let decoder = BoxDecoder::new(PredictionLayout::yolo(80), 0.01, &Upright);
    decoder
      .decode_cell(&cell, ImageSize::new(800, 600))
      .unwrap()
      .unwrap()
      .bbox
  }

  fn result_with(bbox: BBox) -> DetectionResult {
    DetectionResult {
      detections: vec![Detection {
        class_id: 0,
        label: "person".to_string(),
        confidence: 0.9,
        bbox,
      }],
      counts: [("person".to_string(), 1)].into_iter().collect(),
    }
  }

  #[test]
  fn draws_box_outline() {
    let mut image = RgbImage::new(50, 50);
    Annotator::default().annotate(&mut image, &result_with(BBox::new(10, 10, 10, 20)));

    assert_eq!(image.get_pixel(10, 10), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(11, 15), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(15, 15), &Rgb([0, 0, 0]));
  }

  #[test]
  fn tolerates_out_of_bounds_boxes() {
    let mut image = RgbImage::new(20, 20);
    let annotator = Annotator::default();
    annotator.annotate(&mut image, &result_with(BBox::new(-5, -8, 10, 40)));
    annotator.annotate(&mut image, &result_with(BBox::new(100, 100, 10, 40)));
    assert_eq!(image.get_pixel(4, 5), &Rgb(BOX_COLOR));
  }

  #[test]
  fn skips_boxes_pushed_to_integer_limits() {
    let far_right = decode_person(1.0e10, 0.5);
    assert_eq!(far_right.x, i32::MAX - 40);
    let far_above = decode_person(0.5, -1.0e10);
    assert_eq!(far_above.y, i32::MIN);

    let mut image = RgbImage::new(800, 600);
    let annotator = Annotator::default();
    annotator.annotate(&mut image, &result_with(far_right));
    annotator.annotate(&mut image, &result_with(far_above));
    assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
  }

  #[test]
  fn clips_huge_boxes_that_cross_the_image() {
    let mut image = RgbImage::new(20, 20);
    let bbox = BBox::new(-2_000_000_000, 10, i32::MAX, 30);
    Annotator::default().annotate(&mut image, &result_with(bbox));

    assert_eq!(image.get_pixel(0, 10), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(19, 11), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(5, 15), &Rgb([0, 0, 0]));
  }

  #[test]
  fn caption_origin_stays_in_range() {
    assert_eq!(
      caption_origin(&BBox::new(30, 50, 10, 20), 16.0, 11, 800, 600),
      Some((30, 24))
    );
    // 框在顶部时文本部分可见
    assert_eq!(
      caption_origin(&BBox::new(30, 5, 10, 20), 16.0, 11, 800, 600),
      Some((30, -21))
    );
    assert_eq!(
      caption_origin(&BBox::new(i32::MAX - 40, 210, 80, 180), 16.0, 11, 800, 600),
      None
    );
    assert_eq!(
      caption_origin(&BBox::new(360, i32::MIN, 80, 180), 16.0, 11, 800, 600),
      None
    );
    assert_eq!(
      caption_origin(&BBox::new(-2_000_000_000, 10, i32::MAX, 30), 16.0, 11, 20, 20),
      None
    );
    assert_eq!(
      caption_origin(&BBox::new(30, 50, 10, 20), f32::NAN, 11, 800, 600),
      None
    );
  }

  #[test]
  fn captions_tolerate_extreme_boxes() {
    let Some(font) = SYSTEM_FONTS
      .iter()
      .find_map(|path| Annotator::load_font(path).ok())
    else {
      return;
    };
    let annotator = Annotator::default().with_font(font);

    let mut image = RgbImage::new(800, 600);
    annotator.annotate(&mut image, &result_with(decode_person(1.0e10, 0.5)));
    annotator.annotate(&mut image, &result_with(decode_person(0.5, -1.0e10)));
    annotator.annotate(&mut image, &result_with(BBox::new(-2_000_000_000, 10, i32::MAX, 30)));
    assert_eq!(image.get_pixel(0, 10), &Rgb(BOX_COLOR));

    let mut image = RgbImage::new(200, 200);
    annotator.annotate(&mut image, &result_with(BBox::new(50, 80, 40, 100)));
    // 标签画在框上方
    assert!((0..200).any(|x| (40..70).any(|y| *image.get_pixel(x, y) != Rgb([0, 0, 0]))));
  }
}
