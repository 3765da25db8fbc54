// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/config.rs - 检测流程配置
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

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use crate::detect::{PredictionLayout, ShapeGate, TargetLabel, Upright};

mod vocabulary;
pub use self::vocabulary::{COCO_CLASSES, ClassVocabulary, VocabularyError, same_label};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.01;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.4;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("{name} 必须位于 [0, 1] 区间, 实际为 {value}")]
  ThresholdOutOfRange { name: &'static str, value: f32 },
  #[error("目标类别 '{0}' 不在类别词表中")]
  UnknownTargetLabel(String),
  #[error("预测布局类别数 {layout} 与词表大小 {vocabulary} 不一致")]
  ClassCountMismatch { layout: usize, vocabulary: usize },
  #[error("宽高比门限必须为正的有限值, 实际为 {0}")]
  InvalidAspectRatio(f32),
  #[error("类别词表错误: {0}")]
  VocabularyError(#[from] VocabularyError),
}

/// 经过校验的检测流程配置，构造后不可变，可在线程间共享
#[derive(Debug, Clone)]
pub struct DetectConfig {
  confidence_threshold: f32,
  iou_threshold: f32,
  target_label: TargetLabel,
  vocabulary: ClassVocabulary,
  layout: PredictionLayout,
  gate: Arc<dyn ShapeGate>,
}

impl DetectConfig {
  pub fn builder() -> DetectConfigBuilder {
    DetectConfigBuilder::default()
  }

  pub fn confidence_threshold(&self) -> f32 {
    self.confidence_threshold
  }

  pub fn iou_threshold(&self) -> f32 {
    self.iou_threshold
  }

  pub fn target_label(&self) -> &TargetLabel {
    &self.target_label
  }

  pub fn vocabulary(&self) -> &ClassVocabulary {
    &self.vocabulary
  }

  pub fn layout(&self) -> PredictionLayout {
    self.layout
  }

  pub fn shape_gate(&self) -> &dyn ShapeGate {
    self.gate.as_ref()
  }
}

pub struct DetectConfigBuilder {
  confidence_threshold: f32,
  iou_threshold: f32,
  target_label: TargetLabel,
  vocabulary: Option<ClassVocabulary>,
  layout: Option<PredictionLayout>,
  gate: Arc<dyn ShapeGate>,
}

impl Default for DetectConfigBuilder {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      target_label: TargetLabel::default(),
      vocabulary: None,
      layout: None,
      gate: Arc::new(Upright),
    }
  }
}

fn check_unit_range(name: &'static str, value: f32) -> Result<f32, ConfigError> {
  if value.is_finite() && (0.0..=1.0).contains(&value) {
    Ok(value)
  } else {
    error!("{} 超出范围: {}", name, value);
    Err(ConfigError::ThresholdOutOfRange { name, value })
  }
}

impl DetectConfigBuilder {
  pub fn confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn iou_threshold(mut self, threshold: f32) -> Self {
    self.iou_threshold = threshold;
    self
  }

  pub fn target_label(mut self, target: TargetLabel) -> Self {
    self.target_label = target;
    self
  }

  /// 默认使用 COCO 词表
  pub fn vocabulary(mut self, vocabulary: ClassVocabulary) -> Self {
    self.vocabulary = Some(vocabulary);
    self
  }

  /// 默认使用 [`PredictionLayout::yolo`]，类别数取词表大小
  pub fn layout(mut self, layout: PredictionLayout) -> Self {
    self.layout = Some(layout);
    self
  }

  pub fn shape_gate<G: ShapeGate + 'static>(mut self, gate: G) -> Self {
    self.gate = Arc::new(gate);
    self
  }

  pub fn build(self) -> Result<DetectConfig, ConfigError> {
    let confidence_threshold = check_unit_range("置信度阈值", self.confidence_threshold)?;
    let iou_threshold = check_unit_range("IoU 阈值", self.iou_threshold)?;
    self.gate.validate().inspect_err(|e| error!("{}", e))?;

    let vocabulary = self.vocabulary.unwrap_or_default();
    if vocabulary.is_empty() {
      return Err(VocabularyError::Empty.into());
    }

    if let TargetLabel::Label(label) = &self.target_label
      && vocabulary.find(label).is_none()
    {
      error!("目标类别 '{}' 不在类别词表中", label);
      return Err(ConfigError::UnknownTargetLabel(label.clone()));
    }

    let layout = self
      .layout
      .unwrap_or_else(|| PredictionLayout::yolo(vocabulary.len()));
    if layout.num_classes != vocabulary.len() {
      return Err(ConfigError::ClassCountMismatch {
        layout: layout.num_classes,
        vocabulary: vocabulary.len(),
      });
    }

    debug!(
      "检测配置: 置信度阈值 {}, IoU 阈值 {}, 目标类别 {}, 类别数 {}",
      confidence_threshold,
      iou_threshold,
      self.target_label,
      vocabulary.len()
    );

    Ok(DetectConfig {
      confidence_threshold,
      iou_threshold,
      target_label: self.target_label,
      vocabulary,
      layout,
      gate: self.gate,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detect::MinAspectRatio;

  #[test]
  fn defaults() {
    let config = DetectConfig::builder().build().unwrap();
    assert_eq!(config.confidence_threshold(), 0.01);
    assert_eq!(config.iou_threshold(), 0.4);
    assert_eq!(
      config.target_label(),
      &TargetLabel::Label("person".to_string())
    );
    assert_eq!(config.vocabulary().len(), 80);
    assert_eq!(config.layout(), PredictionLayout::yolo(80));
  }

  #[test]
  fn rejects_thresholds_outside_unit_range() {
    assert!(matches!(
      DetectConfig::builder().confidence_threshold(1.5).build(),
      Err(ConfigError::ThresholdOutOfRange { .. })
    ));
    assert!(matches!(
      DetectConfig::builder().iou_threshold(f32::NAN).build(),
      Err(ConfigError::ThresholdOutOfRange { .. })
    ));
  }

  #[test]
  fn rejects_unknown_target_before_processing() {
    let result = DetectConfig::builder()
      .target_label(TargetLabel::Label("gondola".to_string()))
      .build();
    assert!(matches!(result, Err(ConfigError::UnknownTargetLabel(label)) if label == "gondola"));
  }

  #[test]
  fn rejects_layout_with_wrong_class_count() {
    let vocabulary = ClassVocabulary::new(["person", "dog"]).unwrap();
    let result = DetectConfig::builder()
      .vocabulary(vocabulary)
      .layout(PredictionLayout::anchor_free(80))
      .build();
    assert!(matches!(
      result,
      Err(ConfigError::ClassCountMismatch {
        layout: 80,
        vocabulary: 2
      })
    ));
  }

  #[test]
  fn rejects_invalid_aspect_ratio_gate() {
    assert!(matches!(
      DetectConfig::builder()
        .shape_gate(MinAspectRatio { min_ratio: f32::NAN })
        .build(),
      Err(ConfigError::InvalidAspectRatio(_))
    ));
    assert!(matches!(
      DetectConfig::builder()
        .shape_gate(MinAspectRatio { min_ratio: -0.5 })
        .build(),
      Err(ConfigError::InvalidAspectRatio(_))
    ));
    assert!(
      DetectConfig::builder()
        .shape_gate(MinAspectRatio { min_ratio: 0.8 })
        .build()
        .is_ok()
    );
  }

  #[test]
  fn target_match_is_case_insensitive() {
    let config = DetectConfig::builder()
      .target_label(TargetLabel::Label("Person".to_string()))
      .build();
    assert!(config.is_ok());
  }
}
