// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/detect/aggregate.rs - 类别过滤与计数
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

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
  config::{ClassVocabulary, same_label},
  detect::{BBox, Candidate},
};

/// 最终检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub class_id: usize,
  /// 类别名称
  pub label: String,
  /// 置信度
  pub confidence: f32,
  pub bbox: BBox,
}

impl Detection {
  /// 标注文本，例如 `person 0.87`
  pub fn caption(&self) -> String {
    format!("{} {:.2}", self.label, self.confidence)
  }
}

/// 单张图像的检测结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
  /// 按 NMS 保留顺序排列
  pub detections: Vec<Detection>,
  /// 类别名称到数量
  pub counts: BTreeMap<String, usize>,
}

impl DetectionResult {
  pub fn is_empty(&self) -> bool {
    self.detections.is_empty()
  }

  /// 某个类别的数量，名称不区分大小写
  pub fn count(&self, label: &str) -> usize {
    self
      .counts
      .iter()
      .filter(|(name, _)| same_label(name, label))
      .map(|(_, count)| *count)
      .sum()
  }

  pub fn total(&self) -> usize {
    self.counts.values().sum()
  }
}

/// 保留的目标类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetLabel {
  /// 仅保留该类别（不区分大小写）
  Label(String),
  /// 保留全部类别
  Any,
}

impl Default for TargetLabel {
  fn default() -> Self {
    TargetLabel::Label("person".to_string())
  }
}

impl TargetLabel {
  pub fn matches(&self, label: &str) -> bool {
    match self {
      TargetLabel::Label(target) => same_label(target, label),
      TargetLabel::Any => true,
    }
  }
}

impl std::fmt::Display for TargetLabel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TargetLabel::Label(label) => write!(f, "{}", label),
      TargetLabel::Any => write!(f, "*"),
    }
  }
}

impl std::str::FromStr for TargetLabel {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s == "*" || s.eq_ignore_ascii_case("any") {
      Ok(TargetLabel::Any)
    } else {
      Ok(TargetLabel::Label(s.to_string()))
    }
  }
}

/// 按目标类别过滤 NMS 结果并计数
#[derive(Debug)]
pub struct Aggregator<'a> {
  vocabulary: &'a ClassVocabulary,
  target: &'a TargetLabel,
}

impl<'a> Aggregator<'a> {
  pub fn new(vocabulary: &'a ClassVocabulary, target: &'a TargetLabel) -> Self {
    Self { vocabulary, target }
  }

  pub fn aggregate(&self, suppressed: &[Candidate]) -> DetectionResult {
    let mut result = DetectionResult::default();

    for candidate in suppressed {
      let Some(label) = self.vocabulary.label(candidate.class_id) else {
        // 配置校验保证类别数一致，这里只会在直接调用时出现
        error!("类别索引 {} 超出词表范围", candidate.class_id);
        continue;
      };

      if !self.target.matches(label) {
        continue;
      }

      *result.counts.entry(label.to_string()).or_insert(0) += 1;
      result.detections.push(Detection {
        class_id: candidate.class_id,
        label: label.to_string(),
        confidence: candidate.confidence,
        bbox: candidate.bbox,
      });
    }

    debug!(
      "目标类别 {}: 保留 {} / {} 个检测",
      self.target,
      result.detections.len(),
      suppressed.len()
    );

    result
  }
}
