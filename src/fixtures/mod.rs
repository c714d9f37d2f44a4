//! Marker trace fixtures for the deterministic CLI harness.
//!
//! This module discovers recorded or synthetic marker traces on disk,
//! parses optional expectation JSON, and replays traces through a
//! [`RepSession`] frame by frame. It stands in for the live camera and
//! marker detector in tests and QA runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::{MarkerFrame, UpdateResult};
use crate::config::{AppConfig, TrackingConfig};
use crate::session::{RepEvent, RepSession};

pub mod synthetic;

/// Default location for trace/expectation JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const TRACE_EXTENSION: &str = "json";
const EXPECT_SUFFIX: &str = ".expect.json";

/// Recorded marker detections, one entry per video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerTrace {
    pub name: String,
    /// Capture frame rate; overrides the session fps when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    /// Tracking calibration captured with the trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingConfig>,
    pub frames: Vec<MarkerFrame>,
}

impl MarkerTrace {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let trace: MarkerTrace = serde_json::from_str(&contents)
            .with_context(|| format!("parsing trace {}", path.display()))?;
        if trace.frames.is_empty() {
            bail!("trace {} contains no frames", path.display());
        }
        Ok(trace)
    }

    pub fn write_json_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing trace")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }
}

/// Metadata describing an available trace.
#[derive(Clone, Debug)]
pub struct TraceMetadata {
    pub name: String,
    pub trace_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Loaded trace plus optional expectations.
pub struct TraceData {
    pub metadata: TraceMetadata,
    pub trace: MarkerTrace,
    pub expectations: Option<TraceExpectations>,
}

/// JSON expectation schema for trace verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub final_count: u32,
    /// Frame indices on which a repetition must complete.
    pub rep_frames: Vec<u64>,
}

impl TraceExpectations {
    pub fn verify(&self, actual: &ReplayReport) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        if actual.final_count != self.final_count {
            failures.push(ExpectationFailure::FinalCount {
                expected: self.final_count,
                actual: actual.final_count,
            });
        }

        let longest = self.rep_frames.len().max(actual.rep_frames.len());
        for index in 0..longest {
            let expected = self.rep_frames.get(index).copied();
            let found = actual.rep_frames.get(index).copied();
            if expected != found {
                failures.push(ExpectationFailure::RepFrame {
                    index,
                    expected,
                    actual: found,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing a replay with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "failures": self.failures })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectationFailure {
    FinalCount {
        expected: u32,
        actual: u32,
    },
    RepFrame {
        index: usize,
        expected: Option<u64>,
        actual: Option<u64>,
    },
}

/// Catalog responsible for discovering traces on disk.
pub struct TraceCatalog {
    root: PathBuf,
}

impl TraceCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List traces under the root, sorted by name.
    pub fn discover(&self) -> Result<Vec<TraceMetadata>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("reading fixture dir {}", self.root.display()))?;

        let mut traces = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let Some(name) = trace_name(&path) else {
                continue;
            };
            let expect_path = self.expect_path_for(&name);
            traces.push(TraceMetadata {
                name,
                trace_path: path,
                expect_path,
            });
        }
        traces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(traces)
    }

    /// Load a trace by catalog name or by explicit file path.
    ///
    /// `override_expect` replaces the catalog's `<name>.expect.json`.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<TraceData> {
        let metadata = self.resolve(fixture)?;
        let trace = MarkerTrace::from_json_file(&metadata.trace_path)?;

        let expect_path = override_expect.or_else(|| metadata.expect_path.clone());
        let expectations = match expect_path {
            Some(path) => Some(load_expectations(&path)?),
            None => None,
        };

        Ok(TraceData {
            metadata,
            trace,
            expectations,
        })
    }

    fn resolve(&self, fixture: &str) -> Result<TraceMetadata> {
        let direct = PathBuf::from(fixture);
        if direct.is_file() {
            let name = trace_name(&direct)
                .ok_or_else(|| anyhow!("{} is not a trace JSON file", direct.display()))?;
            let expect = direct.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
            let expect_path = expect.is_file().then_some(expect);
            return Ok(TraceMetadata {
                name,
                trace_path: direct,
                expect_path,
            });
        }

        let trace_path = self.root.join(format!("{fixture}.{TRACE_EXTENSION}"));
        if !trace_path.is_file() {
            bail!(
                "fixture {} not found under {}",
                fixture,
                self.root.display()
            );
        }
        Ok(TraceMetadata {
            name: fixture.to_string(),
            trace_path,
            expect_path: self.expect_path_for(fixture),
        })
    }

    fn expect_path_for(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(format!("{name}{EXPECT_SUFFIX}"));
        path.is_file().then_some(path)
    }
}

impl Default for TraceCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Trace name for `path`, or `None` if it is not a trace file.
fn trace_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.ends_with(EXPECT_SUFFIX) {
        return None;
    }
    if path.extension()?.to_str()? != TRACE_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

fn load_expectations(path: &Path) -> Result<TraceExpectations> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing expectations {}", path.display()))
}

/// Per-frame replay output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_index: u64,
    pub result: UpdateResult,
}

/// Full replay output for one trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub fixture: String,
    pub frame_count: usize,
    pub final_count: u32,
    pub rep_frames: Vec<u64>,
    pub events: Vec<RepEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<FrameRecord>,
}

/// Replays marker traces through a fresh [`RepSession`].
pub struct TraceProcessor {
    config: AppConfig,
    keep_frames: bool,
}

impl TraceProcessor {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            keep_frames: false,
        }
    }

    /// Include every frame's `UpdateResult` in the report.
    pub fn with_frames(mut self, keep_frames: bool) -> Self {
        self.keep_frames = keep_frames;
        self
    }

    /// Session configuration for `trace`: the trace's own calibration and
    /// fps win over the processor's.
    pub fn config_for(&self, trace: &MarkerTrace) -> AppConfig {
        let mut config = self.config.clone();
        if let Some(tracking) = &trace.tracking {
            config.tracking = tracking.clone();
        }
        if let Some(fps) = trace.fps {
            config.session.fps = fps;
        }
        config
    }

    pub fn run(&self, trace: &MarkerTrace) -> Result<ReplayReport> {
        self.run_with_config(trace, &self.config_for(trace))
    }

    /// Replay with an explicit configuration, ignoring the trace's own.
    pub fn run_with_config(&self, trace: &MarkerTrace, config: &AppConfig) -> Result<ReplayReport> {
        let mut session = RepSession::new(config)
            .map_err(|err| anyhow!("invalid session config for {}: {}", trace.name, err))?;
        let mut rep_rx = session.subscribe_reps();
        let mut frames = Vec::new();
        let mut events = Vec::new();

        for (frame_index, frame) in trace.frames.iter().enumerate() {
            if let Some(result) = session.process_frame(frame) {
                if self.keep_frames {
                    frames.push(FrameRecord {
                        frame_index: frame_index as u64,
                        result,
                    });
                }
            }
            // Drain per frame so long traces never lag the channel
            while let Ok(event) = rep_rx.try_recv() {
                events.push(event);
            }
        }

        tracing::debug!(
            fixture = %trace.name,
            frames = trace.frames.len(),
            reps = session.repetition_count(),
            "[TraceProcessor] replay finished"
        );

        Ok(ReplayReport {
            fixture: trace.name.clone(),
            frame_count: trace.frames.len(),
            final_count: session.repetition_count(),
            rep_frames: events.iter().map(|event| event.frame_index).collect(),
            events,
            frames,
        })
    }
}
