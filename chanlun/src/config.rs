//! 引擎配置。
//!
//! 理论上没有完全固定的阈值（成笔最小间隔、线段最少笔数、力度聚合方式等）
//! 统一作为具名配置项给出默认值，支持 YAML patch 与按 symbol/周期分层覆盖。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constant::{DataError, Timeframe};

/// MACD 柱面积的聚合方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthMode {
    /// 只累加与走势方向同号的柱子。
    SameSign,
    /// 累加全部柱子的绝对值。
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 分型之后必须存在且不再创新极值的合并 K 线数量。
    pub fractal_confirm_bars: usize,
    /// 成笔要求的两端分型中心在合并 K 线序列上的最小距离。
    pub min_stroke_span: usize,
    /// 线段封闭时最少包含的笔数。
    pub min_segment_strokes: usize,

    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub strength_mode: StrengthMode,

    /// 三类买卖点回踩距离中枢边界在该比例（相对中枢高度）以内时视为触及，归为类三买/类三卖。
    pub pivot_touch_ratio: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfigPatch {
    pub fractal_confirm_bars: Option<usize>,
    pub min_stroke_span: Option<usize>,
    pub min_segment_strokes: Option<usize>,

    pub macd_fast: Option<usize>,
    pub macd_slow: Option<usize>,
    pub macd_signal: Option<usize>,
    pub strength_mode: Option<StrengthMode>,

    pub pivot_touch_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineProfileConfig {
    #[serde(default)]
    pub default: EngineConfigPatch,
    #[serde(default)]
    pub timeframe: HashMap<String, EngineConfigPatch>,
    #[serde(default)]
    pub symbol: HashMap<String, EngineConfigPatch>,
    #[serde(default)]
    pub symbol_timeframe: HashMap<String, EngineConfigPatch>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fractal_confirm_bars: 1,
            min_stroke_span: 4,
            min_segment_strokes: 3,

            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            strength_mode: StrengthMode::SameSign,

            pivot_touch_ratio: 0.05,
        }
    }
}

impl EngineConfig {
    pub fn apply_patch(mut self, patch: EngineConfigPatch) -> Self {
        if let Some(v) = patch.fractal_confirm_bars {
            self.fractal_confirm_bars = v;
        }
        if let Some(v) = patch.min_stroke_span {
            self.min_stroke_span = v;
        }
        if let Some(v) = patch.min_segment_strokes {
            self.min_segment_strokes = v;
        }

        if let Some(v) = patch.macd_fast {
            self.macd_fast = v;
        }
        if let Some(v) = patch.macd_slow {
            self.macd_slow = v;
        }
        if let Some(v) = patch.macd_signal {
            self.macd_signal = v;
        }
        if let Some(v) = patch.strength_mode {
            self.strength_mode = v;
        }

        if let Some(v) = patch.pivot_touch_ratio {
            self.pivot_touch_ratio = v;
        }
        self
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.fractal_confirm_bars == 0 {
            return Err(DataError::InvalidConfig(
                "fractal_confirm_bars must be >= 1".to_string(),
            ));
        }
        if self.min_stroke_span < 2 {
            return Err(DataError::InvalidConfig(
                "min_stroke_span must be >= 2".to_string(),
            ));
        }
        if self.min_segment_strokes == 0 || self.min_segment_strokes % 2 == 0 {
            return Err(DataError::InvalidConfig(
                "min_segment_strokes must be an odd number >= 1".to_string(),
            ));
        }
        if self.macd_fast == 0 || self.macd_signal == 0 || self.macd_fast >= self.macd_slow {
            return Err(DataError::InvalidConfig(format!(
                "macd periods invalid: fast={} slow={} signal={}",
                self.macd_fast, self.macd_slow, self.macd_signal
            )));
        }
        if !(self.pivot_touch_ratio >= 0.0) {
            return Err(DataError::InvalidConfig(
                "pivot_touch_ratio must be >= 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        let patch: EngineConfigPatch = serde_yaml::from_str(yaml)?;
        let config = Self::default().apply_patch(patch);
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }
}

impl EngineProfileConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// 按 default -> timeframe -> symbol -> symbol_timeframe 依次叠加，结果经过校验。
    pub fn resolve_for(&self, symbol: &str, timeframe: Timeframe) -> Result<EngineConfig, DataError> {
        let symbol_norm = normalize_key(symbol);
        let tf_norm = timeframe.as_str().to_string();
        let symbol_tf = format!("{symbol_norm}.{tf_norm}");
        let symbol_wild = format!("{symbol_norm}.*");
        let tf_wild = format!("*.{tf_norm}");

        let mut config = EngineConfig::default().apply_patch(self.default.clone());

        if let Some(patch) = find_patch(&self.timeframe, &tf_norm) {
            config = config.apply_patch(patch.clone());
        }
        if let Some(patch) = find_patch(&self.symbol, &symbol_norm) {
            config = config.apply_patch(patch.clone());
        }
        if let Some(patch) = find_patch(&self.symbol_timeframe, &tf_wild) {
            config = config.apply_patch(patch.clone());
        }
        if let Some(patch) = find_patch(&self.symbol_timeframe, &symbol_wild) {
            config = config.apply_patch(patch.clone());
        }
        if let Some(patch) = find_patch(&self.symbol_timeframe, &symbol_tf) {
            config = config.apply_patch(patch.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn find_patch<'a>(
    map: &'a HashMap<String, EngineConfigPatch>,
    key: &str,
) -> Option<&'a EngineConfigPatch> {
    let key_norm = normalize_key(key);
    map.iter()
        .find(|(k, _)| normalize_key(k) == key_norm)
        .map(|(_, v)| v)
}
