//! User-triggered heading stability calibration
//!
//! The user presses the calibration control once to get instructions, then a
//! second time to confirm. The session then collects displayed headings for a
//! fixed window and accepts the calibration only if the heading stayed steady.

use std::collections::VecDeque;

use log::{debug, info};

use crate::math::{circular_mean, circular_std_dev};

/// Pending events kept for the UI; older ones are dropped first
const MAX_PENDING_EVENTS: usize = 16;

/// Calibration session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationPhase {
    /// No calibration in progress
    #[default]
    Idle,
    /// Instructions shown, waiting for the user to confirm
    AwaitingConfirmation,
    /// Sampling headings since `started_at_ms`
    Collecting { started_at_ms: u64 },
}

/// Prompt the UI should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// How to move the device before confirming
    Instruction,
    /// Keep the device still while samples are taken
    HoldSteady,
}

/// Label of the calibration control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLabel {
    Calibrate,
    FinishCalibration,
}

/// Rendered state of the calibration control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
    pub label: ButtonLabel,
}

/// Result of pressing the calibration control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonResponse {
    /// Prompt to show, if the press changed phase
    pub prompt: Option<Prompt>,
    /// Control state after the press
    pub control: ControlState,
}

/// Verdict at the end of a collection window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationOutcome {
    /// Heading was steady; the filter should jump to `mean`
    Accepted { mean: f32, std_dev: f32 },
    /// Heading moved too much, or no samples were taken
    Rejected { std_dev: Option<f32> },
}

impl CalibrationOutcome {
    /// Whether the calibration was accepted
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// State transition notification for the UI collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationEvent {
    /// Show a prompt
    PromptShown(Prompt),
    /// Re-render the calibration control
    ControlChanged(ControlState),
    /// A collection window closed
    Finished(CalibrationOutcome),
}

/// Calibration state machine
///
/// Samples are fed through [`CalibrationSession::tick`]; the window is closed
/// by the first sample arriving at or after its end, there is no separate
/// timer.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    /// Collection window length in milliseconds
    window_ms: u64,
    /// Largest accepted spread in degrees
    stability_threshold: f32,
    phase: CalibrationPhase,
    /// Displayed headings in arrival order
    samples: Vec<f32>,
    events: VecDeque<CalibrationEvent>,
}

impl CalibrationSession {
    /// Create an idle session
    pub fn new(window_ms: u64, stability_threshold: f32) -> Self {
        Self {
            window_ms,
            stability_threshold,
            phase: CalibrationPhase::Idle,
            samples: Vec::new(),
            events: VecDeque::new(),
        }
    }

    /// Handle a press of the calibration control
    ///
    /// # Example
    /// ```
    /// use fusion_compass::{ButtonLabel, CalibrationSession, Prompt};
    ///
    /// let mut session = CalibrationSession::new(1500, 5.0);
    ///
    /// let first = session.press_button(0);
    /// assert_eq!(first.prompt, Some(Prompt::Instruction));
    /// assert_eq!(first.control.label, ButtonLabel::FinishCalibration);
    ///
    /// let second = session.press_button(1000);
    /// assert_eq!(second.prompt, Some(Prompt::HoldSteady));
    /// assert!(!second.control.enabled);
    /// ```
    pub fn press_button(&mut self, now_ms: u64) -> ButtonResponse {
        let prompt = match self.phase {
            CalibrationPhase::Idle => {
                debug!("Calibration requested, awaiting confirmation");
                self.phase = CalibrationPhase::AwaitingConfirmation;
                Some(Prompt::Instruction)
            }
            CalibrationPhase::AwaitingConfirmation => {
                debug!("Calibration confirmed, collecting for {} ms", self.window_ms);
                self.phase = CalibrationPhase::Collecting {
                    started_at_ms: now_ms,
                };
                self.samples.clear();
                Some(Prompt::HoldSteady)
            }
            // Control is disabled while collecting
            CalibrationPhase::Collecting { .. } => None,
        };

        if let Some(prompt) = prompt {
            self.queue(CalibrationEvent::PromptShown(prompt));
            self.queue(CalibrationEvent::ControlChanged(self.control()));
        }

        ButtonResponse {
            prompt,
            control: self.control(),
        }
    }

    /// Feed one displayed heading
    ///
    /// Outside of collection this does nothing. While collecting, the heading
    /// is recorded and, once the window has elapsed, the session evaluates
    /// the samples and returns the outcome.
    pub fn tick(&mut self, displayed_heading: f32, now_ms: u64) -> Option<CalibrationOutcome> {
        let CalibrationPhase::Collecting { started_at_ms } = self.phase else {
            return None;
        };

        self.samples.push(displayed_heading);

        if now_ms.saturating_sub(started_at_ms) < self.window_ms {
            return None;
        }

        let outcome = self.evaluate();
        self.samples.clear();

        match outcome {
            CalibrationOutcome::Accepted { mean, std_dev } => {
                info!("Calibration accepted: mean {:.1}°, spread {:.2}°", mean, std_dev);
                self.phase = CalibrationPhase::Idle;
            }
            CalibrationOutcome::Rejected { std_dev } => {
                info!("Calibration rejected as unstable: spread {:?}", std_dev);
                self.phase = CalibrationPhase::AwaitingConfirmation;
            }
        }

        self.queue(CalibrationEvent::ControlChanged(self.control()));
        self.queue(CalibrationEvent::Finished(outcome));

        Some(outcome)
    }

    /// Restore the phase persisted across a suspend
    ///
    /// An interrupted collection resumes as awaiting confirmation since its
    /// samples are gone. Undelivered events are discarded.
    pub fn restore(&mut self, is_calibrating: bool) {
        self.samples.clear();
        self.events.clear();
        self.phase = if is_calibrating {
            CalibrationPhase::AwaitingConfirmation
        } else {
            CalibrationPhase::Idle
        };
    }

    /// Current phase
    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    /// Whether a calibration is in progress (awaiting confirmation or collecting)
    pub fn is_calibrating(&self) -> bool {
        self.phase != CalibrationPhase::Idle
    }

    /// How the calibration control should be rendered
    pub fn control(&self) -> ControlState {
        match self.phase {
            CalibrationPhase::Idle => ControlState {
                enabled: true,
                label: ButtonLabel::Calibrate,
            },
            CalibrationPhase::AwaitingConfirmation => ControlState {
                enabled: true,
                label: ButtonLabel::FinishCalibration,
            },
            CalibrationPhase::Collecting { .. } => ControlState {
                enabled: false,
                label: ButtonLabel::FinishCalibration,
            },
        }
    }

    /// Samples collected in the current window
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Take the oldest pending event
    pub fn poll_event(&mut self) -> Option<CalibrationEvent> {
        self.events.pop_front()
    }

    fn queue(&mut self, event: CalibrationEvent) {
        if self.events.len() == MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn evaluate(&self) -> CalibrationOutcome {
        let Some(mean) = circular_mean(&self.samples) else {
            return CalibrationOutcome::Rejected { std_dev: None };
        };

        match circular_std_dev(&self.samples, mean) {
            Some(std_dev) if std_dev <= self.stability_threshold => {
                CalibrationOutcome::Accepted { mean, std_dev }
            }
            std_dev => CalibrationOutcome::Rejected { std_dev },
        }
    }
}
