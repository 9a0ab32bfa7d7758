//! Motion capability and scripted replay
//!
//! The controller never touches a sensor directly. A `MotionCapability`
//! reports whether motion is available, asks for permission, and pushes
//! readings into the controller channel as `CoreEvent::Motion`.
//!
//! Scripts are JSONL: `{"at_ms": 2500, "event": {"type": "manual_trigger"}}`.
//! `at_ms` is relative to the run origin. Blank lines and `#` comments are skipped.

use crate::domain::events::{CoreEvent, PermissionOutcome};
use crate::domain::types::MotionReading;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// No sensor; manual trigger only
    Unsupported,
    /// Sensor present but the user must grant access first
    PermissionRequired,
    Available,
}

#[async_trait]
pub trait MotionCapability: Send + Sync {
    fn availability(&self) -> Availability;

    async fn request_permission(&self) -> PermissionOutcome;

    /// Push readings into `tx` until the receiver is gone or `shutdown` flips
    async fn subscribe(
        &self,
        tx: mpsc::Sender<CoreEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()>;
}

/// Device without a motion sensor
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMotion;

#[async_trait]
impl MotionCapability for NoMotion {
    fn availability(&self) -> Availability {
        Availability::Unsupported
    }

    async fn request_permission(&self) -> PermissionOutcome {
        PermissionOutcome::Denied
    }

    async fn subscribe(
        &self,
        _tx: mpsc::Sender<CoreEvent>,
        _shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        info!("motion_unsupported");
        Ok(())
    }
}

/// One timed script entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptLine {
    pub at_ms: u64,
    pub event: CoreEvent,
}

/// Parsed replay script, ordered by `at_ms`
#[derive(Debug, Clone, Default)]
pub struct Script {
    lines: Vec<ScriptLine>,
}

impl Script {
    pub fn from_jsonl(content: &str) -> anyhow::Result<Self> {
        let mut lines = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }
            let line: ScriptLine = serde_json::from_str(raw)
                .with_context(|| format!("Invalid script line {}", idx + 1))?;
            lines.push(line);
        }
        // stable: equal timestamps keep file order
        lines.sort_by_key(|l| l.at_ms);
        Ok(Self { lines })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let script = Self::from_jsonl(&content)?;
        info!(file = %path.display(), lines = %script.lines.len(), "script_loaded");
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Offset of the last entry
    pub fn duration_ms(&self) -> u64 {
        self.lines.last().map_or(0, |l| l.at_ms)
    }

    /// Split into sensor readings and everything else
    pub fn split(self) -> (Vec<(u64, MotionReading)>, Vec<ScriptLine>) {
        let mut readings = Vec::new();
        let mut others = Vec::new();
        for line in self.lines {
            match line.event {
                CoreEvent::Motion(reading) => readings.push((line.at_ms, reading)),
                event => others.push(ScriptLine { at_ms: line.at_ms, event }),
            }
        }
        (readings, others)
    }
}

/// Motion source replaying recorded readings
pub struct ScriptedMotion {
    readings: Vec<(u64, MotionReading)>,
    availability: Availability,
    permission: PermissionOutcome,
    origin: Instant,
}

impl ScriptedMotion {
    pub fn new(
        readings: Vec<(u64, MotionReading)>,
        availability: Availability,
        permission: PermissionOutcome,
        origin: Instant,
    ) -> Self {
        Self { readings, availability, permission, origin }
    }
}

#[async_trait]
impl MotionCapability for ScriptedMotion {
    fn availability(&self) -> Availability {
        self.availability
    }

    async fn request_permission(&self) -> PermissionOutcome {
        self.permission
    }

    async fn subscribe(
        &self,
        tx: mpsc::Sender<CoreEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let entries = self.readings.iter().map(|(at, r)| (*at, CoreEvent::Motion(r.clone())));
        let sent = replay(entries, &tx, self.origin, shutdown).await;
        info!(sent = %sent, "motion_replay_finished");
        Ok(())
    }
}

/// Send non-motion script entries at their offsets. Returns how many were sent.
pub async fn replay_events(
    lines: Vec<ScriptLine>,
    tx: mpsc::Sender<CoreEvent>,
    origin: Instant,
    shutdown: watch::Receiver<bool>,
) -> usize {
    replay(lines.into_iter().map(|l| (l.at_ms, l.event)), &tx, origin, shutdown).await
}

async fn replay(
    entries: impl Iterator<Item = (u64, CoreEvent)>,
    tx: &mpsc::Sender<CoreEvent>,
    origin: Instant,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    let mut sent = 0;
    for (at_ms, event) in entries {
        tokio::select! {
            _ = tokio::time::sleep_until(origin + Duration::from_millis(at_ms)) => {}
            _ = shutdown.changed() => {
                debug!(sent = %sent, "replay_interrupted");
                return sent;
            }
        }
        if tx.send(event).await.is_err() {
            debug!(sent = %sent, "replay_channel_closed");
            return sent;
        }
        sent += 1;
    }
    sent
}
