//! 多序列并行计算。
//!
//! 每个 `BarSeries` 的计算彼此独立、无共享可变状态，
//! 固定数量的工作线程从任务队列领取序列，结果按输入顺序返回。

use crossbeam::channel;
use tracing::debug;

use crate::constant::DataError;
use crate::engine::StructureEngine;
use crate::export::StructureDocument;
use crate::series::BarSeries;

pub fn analyze_batch(
    engine: &StructureEngine,
    series: &[BarSeries],
    workers: usize,
) -> Result<Vec<StructureDocument>, DataError> {
    if series.is_empty() {
        return Ok(Vec::new());
    }
    let workers = workers.max(1).min(series.len());

    let (job_tx, job_rx) = channel::unbounded::<(usize, &BarSeries)>();
    let (done_tx, done_rx) = channel::unbounded::<(usize, StructureDocument)>();
    for job in series.iter().enumerate() {
        job_tx
            .send(job)
            .map_err(|e| DataError::Worker(e.to_string()))?;
    }
    drop(job_tx);

    crossbeam::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            scope.spawn(move |_| {
                for (idx, item) in job_rx.iter() {
                    if done_tx.send((idx, engine.analyze(item))).is_err() {
                        break;
                    }
                }
            });
        }
    })
    .map_err(|_| DataError::Worker("analysis worker panicked".to_string()))?;
    drop(done_tx);

    let mut slots: Vec<Option<StructureDocument>> = vec![None; series.len()];
    for (idx, doc) in done_rx.iter() {
        slots[idx] = Some(doc);
    }
    debug!(series = series.len(), workers, "batch analysis done");

    slots
        .into_iter()
        .enumerate()
        .map(|(idx, doc)| doc.ok_or_else(|| DataError::Worker(format!("missing result for series #{idx}"))))
        .collect()
}
