// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/detect/decode.rs - 网格预测解码
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::detect::{BBox, ShapeGate};

/// 图像像素尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
  pub width: u32,
  pub height: u32,
}

impl ImageSize {
  pub fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }
}

/// 单个网格预测向量的布局
///
/// 前四个分量固定为归一化的 `(cx, cy, w, h)`，类别分数从 `score_offset` 开始。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionLayout {
  pub score_offset: usize,
  pub num_classes: usize,
}

impl PredictionLayout {
  /// Darknet 风格: `[cx, cy, w, h, objectness, scores...]`，objectness 不参与计算
  pub const fn yolo(num_classes: usize) -> Self {
    Self {
      score_offset: 5,
      num_classes,
    }
  }

  /// 无 objectness: `[cx, cy, w, h, scores...]`
  pub const fn anchor_free(num_classes: usize) -> Self {
    Self {
      score_offset: 4,
      num_classes,
    }
  }

  pub fn row_len(&self) -> usize {
    self.score_offset + self.num_classes
  }
}

/// 解码得到、尚未去重的候选检测
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  /// 类别索引
  pub class_id: usize,
  /// 所选类别的分数
  pub confidence: f32,
  pub bbox: BBox,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedCell {
  #[error("预测向量长度错误: 期望 {expected}, 实际 {actual}")]
  Length { expected: usize, actual: usize },
  #[error("预测向量第 {0} 个分量不是有限数")]
  NonFinite(usize),
}

/// 单次解码的各阶段计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
  pub cells: usize,
  pub malformed: usize,
  pub below_threshold: usize,
  pub degenerate: usize,
  pub rejected_shape: usize,
  pub accepted: usize,
}

/// 把网格预测向量解码为像素坐标候选框
#[derive(Debug)]
pub struct BoxDecoder<'a> {
  layout: PredictionLayout,
  confidence_threshold: f32,
  gate: &'a dyn ShapeGate,
}

/// 返回最大分数的索引与值，并列时取第一个
///
/// 全零向量得到类别 0，分数 0.0，随后会被阈值过滤。
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
  let mut iter = scores.iter().copied().enumerate();
  let (mut best_id, mut best_score) = iter.next()?;
  for (id, score) in iter {
    if score > best_score {
      best_id = id;
      best_score = score;
    }
  }
  Some((best_id, best_score))
}

/// 归一化坐标乘以图像尺寸后截断（向零取整，不做四舍五入）
fn denormalize(value: f32, extent: u32) -> i32 {
  (value as f64 * extent as f64) as i32
}

impl<'a> BoxDecoder<'a> {
  pub fn new(layout: PredictionLayout, confidence_threshold: f32, gate: &'a dyn ShapeGate) -> Self {
    Self {
      layout,
      confidence_threshold,
      gate,
    }
  }

  fn check_cell(&self, cell: &[f32]) -> Result<(), MalformedCell> {
    let expected = self.layout.row_len();
    if cell.len() != expected {
      return Err(MalformedCell::Length {
        expected,
        actual: cell.len(),
      });
    }

    let used = (0..4).chain(self.layout.score_offset..expected);
    for idx in used {
      if !cell[idx].is_finite() {
        return Err(MalformedCell::NonFinite(idx));
      }
    }

    Ok(())
  }

  /// 解码单个网格
  ///
  /// 低于阈值、退化或形状不合格时返回 `Ok(None)`。
  pub fn decode_cell(&self, cell: &[f32], size: ImageSize) -> Result<Option<Candidate>, MalformedCell> {
    let mut stats = DecodeStats::default();
    self.decode_cell_with_stats(cell, size, &mut stats)
  }

  fn decode_cell_with_stats(
    &self,
    cell: &[f32],
    size: ImageSize,
    stats: &mut DecodeStats,
  ) -> Result<Option<Candidate>, MalformedCell> {
    self.check_cell(cell)?;

    let scores = &cell[self.layout.score_offset..];
    let Some((class_id, confidence)) = argmax(scores) else {
      stats.below_threshold += 1;
      return Ok(None);
    };

    if confidence <= self.confidence_threshold {
      stats.below_threshold += 1;
      return Ok(None);
    }

    let center_x = denormalize(cell[0], size.width);
    let center_y = denormalize(cell[1], size.height);
    let width = denormalize(cell[2], size.width);
    let height = denormalize(cell[3], size.height);

    if width <= 0 || height <= 0 {
      stats.degenerate += 1;
      return Ok(None);
    }

    let x = (center_x as f64 - width as f64 / 2.0) as i32;
    let y = (center_y as f64 - height as f64 / 2.0) as i32;
    let bbox = BBox::new(x, y, width, height);

    if !self.gate.accept(&bbox) {
      stats.rejected_shape += 1;
      return Ok(None);
    }

    stats.accepted += 1;
    Ok(Some(Candidate {
      class_id,
      confidence,
      bbox,
    }))
  }

  /// 解码一张图像的全部网格，保持输入顺序
  ///
  /// 格式错误的网格被跳过，不影响其余网格。
  pub fn decode<'c, I>(&self, cells: I, size: ImageSize) -> (Vec<Candidate>, DecodeStats)
  where
    I: IntoIterator<Item = &'c [f32]>,
  {
    let mut stats = DecodeStats::default();
    let mut candidates = Vec::new();

    for (idx, cell) in cells.into_iter().enumerate() {
      stats.cells += 1;
      match self.decode_cell_with_stats(cell, size, &mut stats) {
        Ok(Some(candidate)) => candidates.push(candidate),
        Ok(None) => {}
        Err(e) => {
          stats.malformed += 1;
          debug!("跳过第 {} 个网格: {}", idx, e);
        }
      }
    }

    if stats.malformed > 0 {
      warn!("{} 个网格预测格式错误，已跳过", stats.malformed);
    }
    debug!("解码统计: {:?}", stats);

    (candidates, stats)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detect::{AnyShape, Upright};

  fn cell(cx: f32, cy: f32, w: f32, h: f32, scores: &[f32]) -> Vec<f32> {
    let mut v = vec![cx, cy, w, h, 1.0];
    v.extend_from_slice(scores);
    v
  }

  #[test]
  fn argmax_prefers_first_maximum() {
    assert_eq!(argmax(&[0.0, 0.0, 0.0]), Some((0, 0.0)));
    assert_eq!(argmax(&[0.1, 0.7, 0.7]), Some((1, 0.7)));
    assert_eq!(argmax(&[]), None);
  }

  #[test]
  fn truncates_instead_of_rounding() {
    let decoder = BoxDecoder::new(PredictionLayout::yolo(1), 0.01, &Upright);
    // cx*W = 99.9 -> 99, w*W = 9.9 -> 9, 99 - 4.5 = 94.5 -> 94
    let c = cell(0.999, 0.5, 0.099, 0.5, &[0.9]);
    let got = decoder
      .decode_cell(&c, ImageSize::new(100, 100))
      .unwrap()
      .unwrap();
    assert_eq!(got.bbox, BBox::new(94, 25, 9, 50));
  }

  #[test]
  fn negative_corner_truncates_toward_zero() {
    let decoder = BoxDecoder::new(PredictionLayout::yolo(1), 0.01, &Upright);
    // center_x = 10, width = 25, 10 - 12.5 = -2.5 -> -2
    let c = cell(0.1, 0.5, 0.25, 0.5, &[0.9]);
    let got = decoder
      .decode_cell(&c, ImageSize::new(100, 100))
      .unwrap()
      .unwrap();
    assert_eq!(got.bbox.x, -2);
  }

  #[test]
  fn threshold_is_exclusive() {
    let decoder = BoxDecoder::new(PredictionLayout::yolo(2), 0.5, &Upright);
    let at = cell(0.5, 0.5, 0.1, 0.3, &[0.5, 0.1]);
    assert_eq!(decoder.decode_cell(&at, ImageSize::new(100, 100)), Ok(None));
    let above = cell(0.5, 0.5, 0.1, 0.3, &[0.1, 0.51]);
    let got = decoder
      .decode_cell(&above, ImageSize::new(100, 100))
      .unwrap()
      .unwrap();
    assert_eq!(got.class_id, 1);
  }

  #[test]
  fn degenerate_boxes_are_dropped_even_without_gate() {
    let decoder = BoxDecoder::new(PredictionLayout::yolo(1), 0.01, &AnyShape);
    let tiny = cell(0.5, 0.5, 0.001, 0.3, &[0.9]);
    let (out, stats) = decoder.decode([tiny.as_slice()], ImageSize::new(100, 100));
    assert!(out.is_empty());
    assert_eq!(stats.degenerate, 1);
  }

  #[test]
  fn malformed_cells_are_skipped() {
    let decoder = BoxDecoder::new(PredictionLayout::yolo(2), 0.01, &Upright);
    let short = vec![0.5, 0.5, 0.1];
    let nan = cell(0.5, 0.5, 0.1, 0.3, &[f32::NAN, 0.9]);
    let good = cell(0.5, 0.5, 0.1, 0.3, &[0.2, 0.9]);

    assert!(matches!(
      decoder.decode_cell(&short, ImageSize::new(10, 10)),
      Err(MalformedCell::Length {
        expected: 7,
        actual: 3
      })
    ));
    assert_eq!(
      decoder.decode_cell(&nan, ImageSize::new(10, 10)),
      Err(MalformedCell::NonFinite(5))
    );

    let (out, stats) = decoder.decode(
      [short.as_slice(), nan.as_slice(), good.as_slice()],
      ImageSize::new(100, 100),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(stats.cells, 3);
    assert_eq!(stats.malformed, 2);
    assert_eq!(stats.accepted, 1);
  }

  #[test]
  fn objectness_is_ignored() {
    let decoder = BoxDecoder::new(PredictionLayout::yolo(1), 0.01, &Upright);
    let mut c = cell(0.5, 0.5, 0.1, 0.3, &[0.9]);
    c[4] = f32::NAN;
    assert!(
      decoder
        .decode_cell(&c, ImageSize::new(100, 100))
        .unwrap()
        .is_some()
    );
  }
}
