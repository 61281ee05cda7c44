//! 结构计算中的异常与阶段错误。
//!
//! 引擎不会因为局部异常中断整次计算：阶段错误会被转换为 `Anomaly`
//! 记录在输出文档里，由调用方决定是否丢弃部分结果。

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::constant::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    InsufficientData,
    MalformedBar,
    NoOverlap,
    AmbiguousFractal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub level: Option<Level>,
    pub index: Option<usize>,
    pub note: String,
}

impl Anomaly {
    pub fn new(kind: AnomalyKind, note: impl Into<String>) -> Self {
        Self {
            kind,
            level: None,
            index: None,
            note: note.into(),
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }
}

/// 单个阶段返回的错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    InsufficientData {
        stage: &'static str,
        required: usize,
        available: usize,
    },
    MalformedBar {
        index: usize,
        reason: String,
    },
}

impl Display for StructureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData {
                stage,
                required,
                available,
            } => write!(
                f,
                "{stage}: insufficient data, required {required}, available {available}"
            ),
            Self::MalformedBar { index, reason } => write!(f, "malformed bar #{index}: {reason}"),
        }
    }
}

impl std::error::Error for StructureError {}

impl From<StructureError> for Anomaly {
    fn from(value: StructureError) -> Self {
        let note = value.to_string();
        match value {
            StructureError::InsufficientData { .. } => Anomaly::new(AnomalyKind::InsufficientData, note),
            StructureError::MalformedBar { index, .. } => {
                Anomaly::new(AnomalyKind::MalformedBar, note).at(index)
            }
        }
    }
}
