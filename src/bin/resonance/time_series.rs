// Per-Step JSONL Time Series Writer
// Streams one JSON line per simulation step to a file named after the run's
// seed and gradient strategy, so parallel runs never clobber each other.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use resonance_engine::{HamiltonianWeights, SimulationCore, StepReport};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StepSnapshot {
    pub step: u64,
    pub hamiltonian: f64,
    pub capped: bool,
    pub confirmation_time: f64,
    pub path_latency: f64,
    pub quantity_imbalance: f64,
    pub imbalance_max_abs: f64,
    pub imbalance_saturated: usize,
    pub clamped_updates: u32,
    pub decaying_updates: u32,
    pub means: Vec<(String, f64)>,
    pub weights: HamiltonianWeights,
    pub route_action: Option<f64>,
    pub block_admitted: bool,
}

impl StepSnapshot {
    pub fn capture(core: &SimulationCore, report: &StepReport, route_action: Option<f64>, block_admitted: bool) -> Self {
        let field = core.field();
        Self {
            step: report.step,
            hamiltonian: report.energy.value,
            capped: report.energy.capped,
            confirmation_time: report.record.confirmation_time,
            path_latency: report.record.path_latency,
            quantity_imbalance: report.record.quantity_imbalance,
            imbalance_max_abs: report.imbalance.max_abs,
            imbalance_saturated: report.imbalance.saturated,
            clamped_updates: report.decisions.clamped(),
            decaying_updates: report.decisions.decaying,
            means: field
                .param_ids()
                .map(|id| (field.parameter(id).name().to_string(), field.mean_of(id)))
                .collect(),
            weights: *core.weights(),
            route_action,
            block_admitted,
        }
    }
}

/// Writes each snapshot as soon as it is captured.
pub struct TimeSeriesWriter {
    path: PathBuf,
    out: BufWriter<File>,
    lines: u64,
}

impl TimeSeriesWriter {
    /// Open `<dir>/seed-<seed>-<gradient>.jsonl`, truncating any previous run.
    pub fn create(dir: &Path, seed: u64, gradient: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("seed-{seed}-{gradient}.jsonl"));
        let out = BufWriter::new(File::create(&path)?);
        Ok(Self { path, out, lines: 0 })
    }

    pub fn record(&mut self, snapshot: &StepSnapshot) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, snapshot)?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Flush and report where the series went and how many lines it holds.
    pub fn finish(mut self) -> std::io::Result<(PathBuf, u64)> {
        self.out.flush()?;
        Ok((self.path, self.lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resonance_engine::{NetworkGraph, SimulationConfig};

    #[test]
    fn writer_streams_one_line_per_step_into_a_run_named_file() {
        let dir = std::env::temp_dir().join(format!("resonance-ts-{}", std::process::id()));
        let graph = NetworkGraph::with_edges(["A", "B"], &[("A", "B", 0.1, 0.01)]).expect("test: graph");
        let mut core = SimulationCore::new(graph, &SimulationConfig::default().with_seed(9)).expect("test: core");

        let mut writer = TimeSeriesWriter::create(&dir, 9, core.strategy_name()).expect("test: create");
        for _ in 0..3 {
            let report = core.step();
            writer.record(&StepSnapshot::capture(&core, &report, None, false)).expect("test: record");
        }
        let (path, lines) = writer.finish().expect("test: finish");

        assert_eq!(path, dir.join("seed-9-numerical.jsonl"));
        assert_eq!(lines, 3);
        let text = std::fs::read_to_string(&path).expect("test: read back");
        let steps: Vec<u64> = text
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).expect("test: json")["step"].as_u64().expect("test: step"))
            .collect();
        assert_eq!(steps, vec![1, 2, 3]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
