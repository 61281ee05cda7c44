//! 线段（SegmentBuilder）。
//!
//! 候选线段从第一笔开始，方向等于首笔方向。处理规则：
//! - 反向笔的极值突破了前一根同向反向笔的极值（特征序列反转）即视为破坏，
//!   候选线段在破坏笔的起点处封闭，新候选从破坏笔开始；
//! - 候选未达到最少笔数时不封闭；若此前还没有任何封闭线段，
//!   丢弃候选中的笔并从破坏笔重新定锚（记为 unattached）；
//! - 与上一封闭线段同向且突破其极值的笔会重新打开该线段并延伸；
//! - 末尾未封闭的候选以 `Provisional` 状态输出。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constant::Direction;
use crate::engine::AnalysisContext;
use crate::run::Run;
use crate::stroke::Stroke;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Sealed,
    Provisional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub direction: Direction,
    /// 组成线段的笔序号（连续）。
    pub strokes: Vec<usize>,
    pub start_price: f64,
    pub end_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub start_cbar: usize,
    pub end_cbar: usize,
    pub start_sbar: usize,
    pub end_sbar: usize,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: SegmentStatus,
}

impl Segment {
    fn from_strokes(index: usize, strokes: &[Stroke], first: usize, last: usize, status: SegmentStatus) -> Self {
        let head = &strokes[first];
        let tail = &strokes[last];
        let members = &strokes[first..=last];
        Self {
            index,
            direction: head.direction,
            strokes: (first..=last).collect(),
            start_price: head.start_price,
            end_price: tail.end_price,
            high_price: members.iter().map(|x| x.high_price).fold(f64::MIN, f64::max),
            low_price: members.iter().map(|x| x.low_price).fold(f64::MAX, f64::min),
            start_cbar: head.start_cbar,
            end_cbar: tail.end_cbar,
            start_sbar: head.start_sbar,
            end_sbar: tail.end_sbar,
            start_datetime: head.start_datetime,
            end_datetime: tail.end_datetime,
            status,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.status == SegmentStatus::Sealed
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }
}

impl Run for Segment {
    fn direction(&self) -> Direction {
        self.direction
    }
    fn start_price(&self) -> f64 {
        self.start_price
    }
    fn end_price(&self) -> f64 {
        self.end_price
    }
    fn high_price(&self) -> f64 {
        self.high_price
    }
    fn low_price(&self) -> f64 {
        self.low_price
    }
    fn start_cbar(&self) -> usize {
        self.start_cbar
    }
    fn end_cbar(&self) -> usize {
        self.end_cbar
    }
    fn start_sbar(&self) -> usize {
        self.start_sbar
    }
    fn end_sbar(&self) -> usize {
        self.end_sbar
    }
    fn end_datetime(&self) -> DateTime<Utc> {
        self.end_datetime
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentOutput {
    /// 封闭线段在前，至多一条临时线段在末尾。
    pub segments: Vec<Segment>,
    pub unattached_strokes: Vec<usize>,
}

impl SegmentOutput {
    pub fn sealed(&self) -> &[Segment] {
        let count = self.segments.iter().take_while(|x| x.is_sealed()).count();
        &self.segments[..count]
    }

    pub fn provisional(&self) -> Option<&Segment> {
        self.segments.last().filter(|x| !x.is_sealed())
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    direction: Direction,
    first: usize,
}

#[derive(Debug, Clone, Copy)]
struct SealedRange {
    direction: Direction,
    first: usize,
    last: usize,
}

pub struct SegmentBuilder;

impl SegmentBuilder {
    pub fn build(strokes: &[Stroke], ctx: &mut AnalysisContext<'_>) -> SegmentOutput {
        let min_strokes = ctx.config.min_segment_strokes.max(1);
        let mut sealed: Vec<SealedRange> = Vec::new();
        let mut unattached: Vec<usize> = Vec::new();
        let mut candidate: Option<Candidate> = None;

        let mut i = 0;
        while i < strokes.len() {
            let stroke = &strokes[i];
            let Some(cand) = candidate else {
                candidate = Some(Candidate {
                    direction: stroke.direction,
                    first: i,
                });
                i += 1;
                continue;
            };

            if let Some(prev) = sealed.last().copied() {
                if stroke.direction == prev.direction
                    && exceeds_extreme(stroke, strokes, prev)
                {
                    sealed.pop();
                    candidate = Some(Candidate {
                        direction: prev.direction,
                        first: prev.first,
                    });
                    i += 1;
                    continue;
                }
            }

            if stroke.direction == cand.direction
                || i < cand.first + 3
                || !breaks_feature(stroke, &strokes[i - 2], cand.direction)
            {
                i += 1;
                continue;
            }

            // 线段终点即破坏笔的起点，新候选从破坏笔开始
            let count = i - cand.first;
            if count >= min_strokes {
                sealed.push(SealedRange {
                    direction: cand.direction,
                    first: cand.first,
                    last: i - 1,
                });
            } else if sealed.is_empty() {
                unattached.extend(cand.first..i);
            } else {
                i += 1;
                continue;
            }
            candidate = Some(Candidate {
                direction: stroke.direction,
                first: i,
            });
            i += 1;
        }

        let mut segments: Vec<Segment> = sealed
            .iter()
            .enumerate()
            .map(|(idx, x)| Segment::from_strokes(idx, strokes, x.first, x.last, SegmentStatus::Sealed))
            .collect();
        if let Some(cand) = candidate {
            segments.push(Segment::from_strokes(
                segments.len(),
                strokes,
                cand.first,
                strokes.len() - 1,
                SegmentStatus::Provisional,
            ));
        }

        debug!(
            sealed = sealed.len(),
            provisional = segments.len() - sealed.len(),
            unattached = unattached.len(),
            "segment building done"
        );
        SegmentOutput {
            segments,
            unattached_strokes: unattached,
        }
    }
}

/// 向上线段被向下笔跌破前一向下笔低点，向下线段被向上笔升破前一向上笔高点。
fn breaks_feature(stroke: &Stroke, previous_reverse: &Stroke, direction: Direction) -> bool {
    match direction {
        Direction::Up => stroke.low_price < previous_reverse.low_price,
        Direction::Down => stroke.high_price > previous_reverse.high_price,
    }
}

fn exceeds_extreme(stroke: &Stroke, strokes: &[Stroke], range: SealedRange) -> bool {
    let members = &strokes[range.first..=range.last];
    match range.direction {
        Direction::Up => {
            let high = members.iter().map(|x| x.high_price).fold(f64::MIN, f64::max);
            stroke.high_price > high
        }
        Direction::Down => {
            let low = members.iter().map(|x| x.low_price).fold(f64::MAX, f64::min);
            stroke.low_price < low
        }
    }
}
