// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/config/vocabulary.rs - 类别词表
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

use thiserror::Error;
use tracing::{debug, info};

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

/// 类别名称比较，不区分大小写
pub fn same_label(a: &str, b: &str) -> bool {
  a == b || a.to_lowercase() == b.to_lowercase()
}

#[derive(Error, Debug)]
pub enum VocabularyError {
  #[error("类别词表为空")]
  Empty,
  #[error("第 {0} 个类别名称为空")]
  EmptyLabel(usize),
  #[error("类别名称重复: '{label}' (索引 {first} 与 {second})")]
  Duplicate {
    label: String,
    first: usize,
    second: usize,
  },
  #[error("读取类别文件错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 类别索引到类别名称的映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassVocabulary {
  labels: Box<[String]>,
}

impl Default for ClassVocabulary {
  fn default() -> Self {
    Self::coco()
  }
}

impl ClassVocabulary {
  /// 校验并构造词表：不允许空表、空名称以及（不区分大小写的）重复名称
  pub fn new<I, S>(labels: I) -> Result<Self, VocabularyError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
    if labels.is_empty() {
      return Err(VocabularyError::Empty);
    }

    for (idx, label) in labels.iter().enumerate() {
      if label.trim().is_empty() {
        return Err(VocabularyError::EmptyLabel(idx));
      }
      if let Some(first) = labels[..idx].iter().position(|l| same_label(l, label)) {
        return Err(VocabularyError::Duplicate {
          label: label.clone(),
          first,
          second: idx,
        });
      }
    }

    Ok(Self {
      labels: labels.into_boxed_slice(),
    })
  }

  /// 内置的 80 类 COCO 词表
  pub fn coco() -> Self {
    Self {
      labels: COCO_CLASSES.iter().map(|s| s.to_string()).collect(),
    }
  }

  /// 解析每行一个类别名称的文本（如 `coco.names`）
  ///
  /// 行号即类别索引。文件末尾的空行被忽略；中间的空行会改变其后所有类别的索引，
  /// 因此报 [`VocabularyError::EmptyLabel`]。
  pub fn parse_names(content: &str) -> Result<Self, VocabularyError> {
    Self::new(content.trim_end().lines().map(str::trim))
  }

  pub fn from_names_file<P: AsRef<Path>>(path: P) -> Result<Self, VocabularyError> {
    let path = path.as_ref();
    info!("加载类别文件: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let vocabulary = Self::parse_names(&content)?;
    debug!("类别数量: {}", vocabulary.len());
    Ok(vocabulary)
  }

  pub fn label(&self, class_id: usize) -> Option<&str> {
    self.labels.get(class_id).map(String::as_str)
  }

  /// 不区分大小写地查找类别索引
  pub fn find(&self, label: &str) -> Option<usize> {
    self.labels.iter().position(|l| same_label(l, label))
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.labels.iter().map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn coco_lookup() {
    let vocabulary = ClassVocabulary::coco();
    assert_eq!(vocabulary.len(), 80);
    assert_eq!(vocabulary.label(0), Some("person"));
    assert_eq!(vocabulary.label(16), Some("dog"));
    assert_eq!(vocabulary.label(80), None);
    assert_eq!(vocabulary.find("Person"), Some(0));
    assert_eq!(vocabulary.find("TEDDY BEAR"), Some(77));
    assert_eq!(vocabulary.find("lift"), None);
  }

  #[test]
  fn parse_names_file_content() {
    let vocabulary = ClassVocabulary::parse_names("person\r\n skier \nsnowboard\n\n").unwrap();
    assert_eq!(
      vocabulary.iter().collect::<Vec<_>>(),
      vec!["person", "skier", "snowboard"]
    );
  }

  #[test]
  fn rejects_invalid_vocabularies() {
    assert!(matches!(
      ClassVocabulary::parse_names(""),
      Err(VocabularyError::Empty)
    ));
    assert!(matches!(
      ClassVocabulary::parse_names("person\n\ndog"),
      Err(VocabularyError::EmptyLabel(1))
    ));
    assert!(matches!(
      ClassVocabulary::new(["person", "dog", "Person"]),
      Err(VocabularyError::Duplicate {
        first: 0,
        second: 2,
        ..
      })
    ));
  }

  #[test]
  fn names_file_with_inner_blank_line_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lift.names");

    std::fs::write(&path, "person\nskier\n\n\n").unwrap();
    let vocabulary = ClassVocabulary::from_names_file(&path).unwrap();
    assert_eq!(vocabulary.len(), 2);

    std::fs::write(&path, "person\n   \nskier\n").unwrap();
    assert!(matches!(
      ClassVocabulary::from_names_file(&path),
      Err(VocabularyError::EmptyLabel(1))
    ));
  }
}
