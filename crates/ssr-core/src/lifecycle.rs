//! Render lifecycle tracking.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Lifecycle phases for a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Cache lookup before any rendering.
    CacheLookup,
    /// Pending actions resolved for a loop pass.
    ActionPass(usize),
    /// Discovery render for a loop pass.
    RenderPass(usize),
    /// Final render with module capture.
    FinalRender,
    /// Result assembled.
    Completion,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheLookup => write!(f, "cache_lookup"),
            Self::ActionPass(pass) => write!(f, "action_pass_{}", pass),
            Self::RenderPass(pass) => write!(f, "render_pass_{}", pass),
            Self::FinalRender => write!(f, "final_render"),
            Self::Completion => write!(f, "completion"),
        }
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Mark the start of a lifecycle phase.
    pub fn mark_phase_start(&mut self, phase: &LifecyclePhase) {
        self.mark(&format!("{}_start", phase));
    }

    /// Mark the end of a lifecycle phase.
    pub fn mark_phase_end(&mut self, phase: &LifecyclePhase) {
        self.mark(&format!("{}_end", phase));
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get timing for a phase that has both a start and an end mark.
    pub fn phase_timing(&self, phase: &LifecyclePhase) -> Option<PhaseTiming> {
        let start = self.marks.get(&format!("{}_start", phase))?;
        let end = self.marks.get(&format!("{}_end", phase))?;

        Some(PhaseTiming {
            phase: phase.clone(),
            start: start.duration_since(self.start),
            duration: end.duration_since(*start),
        })
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing information for a phase.
#[derive(Debug, Clone)]
pub struct PhaseTiming {
    /// The phase.
    pub phase: LifecyclePhase,
    /// Time from request start to phase start.
    pub start: Duration,
    /// Duration of the phase.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(LifecyclePhase::ActionPass(2).to_string(), "action_pass_2");
        assert_eq!(LifecyclePhase::FinalRender.to_string(), "final_render");
    }

    #[test]
    fn test_phase_timing_requires_both_marks() {
        let mut timing = TimingContext::new();
        let phase = LifecyclePhase::RenderPass(1);

        timing.mark_phase_start(&phase);
        assert!(timing.phase_timing(&phase).is_none());

        timing.mark_phase_end(&phase);
        let recorded = timing.phase_timing(&phase).unwrap();
        assert_eq!(recorded.phase, phase);
    }
}
