//! Wizard state machine.
//!
//! ```text
//! Step1 --next--> Step2 --analyze--> Loading --ok--> Step3 --submit ok--> Success
//!   ^               |  ^                |                |                  |
//!   +-----back------+  +---err / back---+                |                  |
//!                   ^                                    |                  |
//!                   +----------------back----------------+                  |
//! Step1 <------------------------------reset--------------------------------+
//! ```
//!
//! Every view change bumps a generation counter. Network calls started with
//! `begin_*` carry the generation in a [`Ticket`]; a `finish_*` whose ticket
//! no longer matches is stale and is dropped without touching the state.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::domain::{AssessmentResult, ImagePayload};
use crate::error::{WizardError, WizardResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Step1,
    Step2,
    Loading,
    Step3,
    Success,
}

impl View {
    /// Position in the three-step indicator.
    pub fn step(&self) -> u8 {
        match self {
            Self::Step1 => 1,
            Self::Step2 | Self::Loading => 2,
            Self::Step3 | Self::Success => 3,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Step1 => "metadata entry",
            Self::Step2 => "photo capture",
            Self::Loading => "analysis",
            Self::Step3 => "review",
            Self::Success => "confirmation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepIndicator {
    pub steps: [StepStatus; 3],
}

impl StepIndicator {
    pub fn for_view(view: View) -> Self {
        if view == View::Success {
            return Self {
                steps: [StepStatus::Completed; 3],
            };
        }
        let current = view.step() as usize;
        let mut steps = [StepStatus::Pending; 3];
        for (i, status) in steps.iter_mut().enumerate() {
            *status = match (i + 1).cmp(&current) {
                std::cmp::Ordering::Less => StepStatus::Completed,
                std::cmp::Ordering::Equal => StepStatus::Active,
                std::cmp::Ordering::Greater => StepStatus::Pending,
            };
        }
        Self { steps }
    }

    pub fn status(&self, step: u8) -> Option<StepStatus> {
        self.steps.get(usize::from(step).checked_sub(1)?).copied()
    }
}

/// What a front end redraws after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewChange {
    pub from: View,
    pub to: View,
    pub indicator: StepIndicator,
    pub scroll_to_top: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketKind {
    Assess,
    Submit,
}

/// Proof of an in-flight network call, tied to the view it started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: TicketKind,
    generation: u64,
}

impl Ticket {
    pub fn kind(&self) -> TicketKind {
        self.kind
    }
}

#[derive(Debug, Clone)]
pub struct WizardState {
    view: View,
    generation: u64,
    image: Option<ImagePayload>,
    assessment: Option<AssessmentResult>,
    submitting: bool,
    banner: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            view: View::Step1,
            generation: 0,
            image: None,
            assessment: None,
            submitting: false,
            banner: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn current_step(&self) -> u8 {
        self.view.step()
    }

    pub fn indicator(&self) -> StepIndicator {
        StepIndicator::for_view(self.view)
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    pub fn assessment(&self) -> Option<&AssessmentResult> {
        self.assessment.as_ref()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Whether the submit control accepts input.
    pub fn submit_enabled(&self) -> bool {
        self.view == View::Step3 && !self.submitting
    }

    pub fn show_banner(&mut self, message: impl Into<String>) {
        self.banner = Some(message.into());
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    fn go(&mut self, to: View) -> ViewChange {
        let from = self.view;
        self.view = to;
        self.generation += 1;
        debug!(%from, %to, generation = self.generation, "View changed");
        ViewChange {
            from,
            to,
            indicator: self.indicator(),
            scroll_to_top: true,
        }
    }

    fn invalid(&self, action: &str) -> WizardError {
        WizardError::InvalidTransition {
            from: self.view.to_string(),
            action: action.to_string(),
        }
    }

    /// Step1 → Step2. The caller has already validated the metadata.
    pub fn advance_to_photo(&mut self) -> WizardResult<ViewChange> {
        if self.view != View::Step1 {
            return Err(self.invalid("continue to the photo step"));
        }
        self.clear_banner();
        Ok(self.go(View::Step2))
    }

    /// Back navigation. Leaving `Loading` abandons the in-flight assessment.
    pub fn back(&mut self) -> WizardResult<ViewChange> {
        let to = match self.view {
            View::Step2 => View::Step1,
            View::Step3 | View::Loading => View::Step2,
            View::Step1 | View::Success => return Err(self.invalid("go back")),
        };
        self.submitting = false;
        self.clear_banner();
        Ok(self.go(to))
    }

    /// Store a processed photo. Only the photo step accepts one.
    pub fn set_image(&mut self, image: ImagePayload) -> WizardResult<()> {
        if self.view != View::Step2 {
            return Err(self.invalid("attach a photo"));
        }
        self.image = Some(image);
        self.clear_banner();
        Ok(())
    }

    /// Step2 → Loading, guarded by a processed photo.
    pub fn begin_analyze(&mut self) -> WizardResult<(Ticket, ViewChange)> {
        if self.view != View::Step2 {
            return Err(self.invalid("analyze the photo"));
        }
        if self.image.is_none() {
            return Err(WizardError::InvalidInput(
                "Please take or select a photo first.".to_string(),
            ));
        }
        self.clear_banner();
        let change = self.go(View::Loading);
        Ok((
            Ticket {
                kind: TicketKind::Assess,
                generation: self.generation,
            },
            change,
        ))
    }

    /// Loading → Step3 on success, Loading → Step2 with a banner on failure.
    ///
    /// Returns `Ok(None)` for a stale ticket.
    pub fn finish_analyze(
        &mut self,
        ticket: Ticket,
        result: WizardResult<AssessmentResult>,
    ) -> WizardResult<Option<ViewChange>> {
        if !self.is_current(ticket, TicketKind::Assess) {
            return Ok(None);
        }
        match result {
            Ok(assessment) => {
                self.assessment = Some(assessment);
                Ok(Some(self.go(View::Step3)))
            }
            Err(e) => {
                self.go(View::Step2);
                self.show_banner(e.user_message());
                Err(e)
            }
        }
    }

    /// Disable the submit control for the duration of the call.
    pub fn begin_submit(&mut self) -> WizardResult<Ticket> {
        if self.view != View::Step3 || self.assessment.is_none() {
            return Err(self.invalid("submit"));
        }
        if self.submitting {
            return Err(self.invalid("submit again while submitting"));
        }
        self.submitting = true;
        self.clear_banner();
        Ok(Ticket {
            kind: TicketKind::Submit,
            generation: self.generation,
        })
    }

    /// Step3 → Success on success. On failure stay on Step3 with a banner.
    /// The submit control is re-enabled either way.
    ///
    /// Returns `Ok(None)` for a stale ticket.
    pub fn finish_submit(
        &mut self,
        ticket: Ticket,
        result: WizardResult<()>,
    ) -> WizardResult<Option<ViewChange>> {
        if !self.is_current(ticket, TicketKind::Submit) {
            return Ok(None);
        }
        self.submitting = false;
        match result {
            Ok(()) => Ok(Some(self.go(View::Success))),
            Err(e) => {
                self.show_banner(e.user_message());
                Err(e)
            }
        }
    }

    /// Success → Step1. Photo and assessment are cleared.
    pub fn reset(&mut self) -> WizardResult<ViewChange> {
        if self.view != View::Success {
            return Err(self.invalid("start a new assessment"));
        }
        self.image = None;
        self.assessment = None;
        self.submitting = false;
        self.clear_banner();
        Ok(self.go(View::Step1))
    }

    fn is_current(&self, ticket: Ticket, kind: TicketKind) -> bool {
        let current = ticket.kind == kind && ticket.generation == self.generation;
        if !current {
            warn!(
                kind = ?ticket.kind,
                ticket_generation = ticket.generation,
                generation = self.generation,
                view = %self.view,
                "Ignoring stale response"
            );
        }
        current
    }
}
