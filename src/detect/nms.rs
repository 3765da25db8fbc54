// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/detect/nms.rs - 非极大值抑制
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

use std::collections::BTreeMap;

use tracing::debug;

use crate::detect::Candidate;

/// 按类别独立执行的贪心非极大值抑制
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suppressor {
  /// 超过该 IoU 的低分框被抑制
  pub iou_threshold: f32,
  /// 与解码阶段相同的置信度阈值，不高于它的候选框直接丢弃
  pub confidence_threshold: f32,
}

impl Suppressor {
  pub fn new(iou_threshold: f32, confidence_threshold: f32) -> Self {
    Self {
      iou_threshold,
      confidence_threshold,
    }
  }

  /// 对候选框去重
  ///
  /// 输出按类别索引升序排列，同一类别内按选中顺序（置信度降序）排列。
  pub fn suppress(&self, candidates: &[Candidate]) -> Vec<Candidate> {
    let mut partitions: BTreeMap<usize, Vec<Candidate>> = BTreeMap::new();
    for candidate in candidates
      .iter()
      .filter(|c| c.confidence > self.confidence_threshold)
    {
      partitions
        .entry(candidate.class_id)
        .or_default()
        .push(*candidate);
    }

    let mut kept = Vec::new();
    for (class_id, partition) in partitions {
      let before = partition.len();
      let selected = self.suppress_partition(partition);
      debug!(
        "类别 {}: NMS 前 {} 个, NMS 后 {} 个",
        class_id,
        before,
        selected.len()
      );
      kept.extend(selected);
    }

    kept
  }

  fn suppress_partition(&self, mut partition: Vec<Candidate>) -> Vec<Candidate> {
    // 稳定排序，同分时保持解码顺序
    partition.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let threshold = self.iou_threshold as f64;
    let mut selected: Vec<Candidate> = Vec::new();

    'outer: for candidate in partition {
      for best in selected.iter() {
        if best.bbox.iou(&candidate.bbox) > threshold {
          continue 'outer;
        }
      }
      selected.push(candidate);
    }

    selected
  }
}
