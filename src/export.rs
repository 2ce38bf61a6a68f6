//! Training history buffers and their CSV export.
//!
//! Every tracked variable gets a dense `[episode, step]` table. Column 0
//! holds the initial condition and steps fill columns `1..=MAX_STEPS`. Target
//! points are stored by relocation index, and the time grid is stored once.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{s, Array1, Array2, Array3, ArrayView2};
use polars::prelude::*;

use flatplate_calc::{CartesianState, EpisodeLog, SimConfig, SimError, TrackedVariable, Vec2};

pub struct HistoryBuffer {
    /// `[variable, episode, step]`
    vars: Array3<f64>,
    /// `[relocation, (xB, yB)]`
    targets: Array2<f64>,
    time: Array1<f64>,
}

impl HistoryBuffer {
    /// Allocate for `MAX_EPISODES` episodes of up to `MAX_STEPS` steps.
    pub fn new(config: &SimConfig, initial: &CartesianState) -> Self {
        let n_vars = TrackedVariable::ALL.len();
        let mut vars = Array3::zeros((n_vars, config.max_episodes, config.max_steps + 1));

        let start = initial.to_array();
        for (i, value) in start.iter().enumerate() {
            vars.slice_mut(s![i, .., 0]).fill(*value);
        }

        Self {
            vars,
            targets: Array2::zeros((config.target_history_len(), 2)),
            time: Array1::from(config.time_grid()),
        }
    }

    pub fn max_episodes(&self) -> usize {
        self.vars.shape()[1]
    }

    pub fn max_steps(&self) -> usize {
        self.vars.shape()[2] - 1
    }

    /// Copy the log of episode number `episode` (1-based) into its row.
    pub fn fill_episode(&mut self, episode: usize, log: &EpisodeLog) -> Result<(), SimError> {
        if episode == 0 || episode > self.max_episodes() {
            return Err(SimError::HistoryOverflow {
                what: "episode",
                index: episode,
                capacity: self.max_episodes(),
            });
        }
        if log.len() > self.max_steps() {
            return Err(SimError::HistoryOverflow {
                what: "step",
                index: log.len(),
                capacity: self.max_steps(),
            });
        }

        let row = episode - 1;
        for (k, record) in log.records().iter().enumerate() {
            for var in TrackedVariable::ALL {
                self.vars[[var.index(), row, k + 1]] = record.get(var);
            }
        }
        Ok(())
    }

    /// Store the target history, index 0 being the initial target.
    pub fn set_targets(&mut self, targets: &[Vec2]) -> Result<(), SimError> {
        let capacity = self.targets.nrows();
        if targets.len() > capacity {
            return Err(SimError::HistoryOverflow {
                what: "target",
                index: targets.len() - 1,
                capacity,
            });
        }
        for (i, b) in targets.iter().enumerate() {
            self.targets[[i, 0]] = b.x;
            self.targets[[i, 1]] = b.y;
        }
        Ok(())
    }

    /// `[episode, step]` table of one variable.
    pub fn variable(&self, var: TrackedVariable) -> ArrayView2<'_, f64> {
        self.vars.slice(s![var.index(), .., ..])
    }

    pub fn targets(&self) -> ArrayView2<'_, f64> {
        self.targets.view()
    }

    /// Write `<var>.csv`, `Bcoordinates.csv` and `time.csv` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        for var in TrackedVariable::ALL {
            let path = dir.join(format!("{}.csv", var.name()));
            write_table(&path, self.variable(var))?;
        }
        write_table(&dir.join("Bcoordinates.csv"), self.targets.view())?;

        let time = self.time.view().insert_axis(ndarray::Axis(1));
        write_table(&dir.join("time.csv"), time)?;

        Ok(())
    }
}

/// Write a dense table as `;`-separated values without a header.
fn write_table(path: &Path, table: ArrayView2<'_, f64>) -> Result<()> {
    let columns: Vec<Series> = table
        .columns()
        .into_iter()
        .enumerate()
        .map(|(j, col)| Series::new(&format!("c{}", j), col.to_vec()))
        .collect();
    let mut df = DataFrame::new(columns)?;

    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .has_header(false)
        .with_delimiter(b';')
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
