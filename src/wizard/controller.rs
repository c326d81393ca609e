//! Wizard orchestration: ties the state machine to the form, the photo
//! pipeline, the review renderer and the assessment service.

use chrono::{Local, NaiveDate};
use tracing::{info, instrument, warn};

use super::state::{Ticket, View, ViewChange, WizardState};
use crate::domain::{AssessRequest, AssessmentResult, FormSchema, ImagePayload, SubmissionPayload};
use crate::error::{WizardError, WizardResult};
use crate::form::{build_form, MetadataForm};
use crate::photo::ImageProcessor;
use crate::review::{build_submission, render_review, ReviewForm};
use crate::services::{ApiClient, DraftStore};

pub struct WizardController {
    api: ApiClient,
    drafts: DraftStore,
    processor: ImageProcessor,
    schema: FormSchema,
    form: MetadataForm,
    review: Option<ReviewForm>,
    state: WizardState,
}

impl WizardController {
    /// Load the schema and build the metadata form from the saved draft.
    ///
    /// A config failure is fatal: the caller shows the banner and stops.
    #[instrument(skip_all, fields(api = %api.base_url()))]
    pub async fn start(
        api: ApiClient,
        drafts: DraftStore,
        processor: ImageProcessor,
    ) -> WizardResult<Self> {
        let schema = api.get_config().await?;
        info!(
            fields = schema.metadata_fields.len(),
            categories = schema.categories.len(),
            "Form config loaded"
        );
        Self::with_schema(schema, api, drafts, processor, Local::now().date_naive())
    }

    pub fn with_schema(
        schema: FormSchema,
        api: ApiClient,
        drafts: DraftStore,
        processor: ImageProcessor,
        today: NaiveDate,
    ) -> WizardResult<Self> {
        let draft = drafts.load();
        let form = build_form(&schema, &draft, today)?;
        Ok(Self {
            api,
            drafts,
            processor,
            schema,
            form,
            review: None,
            state: WizardState::new(),
        })
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn view(&self) -> View {
        self.state.view()
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn form(&self) -> &MetadataForm {
        &self.form
    }

    /// Metadata edits are accepted on step 1 only.
    pub fn form_mut(&mut self) -> WizardResult<&mut MetadataForm> {
        if self.state.view() != View::Step1 {
            return Err(self.not_here("edit the sign details"));
        }
        Ok(&mut self.form)
    }

    pub fn review(&self) -> Option<&ReviewForm> {
        self.review.as_ref()
    }

    /// Review edits are accepted on step 3 only.
    pub fn review_mut(&mut self) -> WizardResult<&mut ReviewForm> {
        let err = self.not_here("edit the assessment");
        if self.state.view() != View::Step3 {
            return Err(err);
        }
        self.review.as_mut().ok_or(err)
    }

    fn not_here(&self, action: &str) -> WizardError {
        WizardError::InvalidTransition {
            from: self.state.view().to_string(),
            action: action.to_string(),
        }
    }

    /// Step1 → Step2. Blank required fields are flagged and block the move.
    /// The draft is saved on every successful move.
    pub fn next(&mut self) -> WizardResult<ViewChange> {
        if self.state.view() != View::Step1 {
            return Err(self.not_here("continue to the photo step"));
        }
        self.form.validate()?;
        let change = self.state.advance_to_photo()?;
        self.drafts.save(&self.form.values());
        Ok(change)
    }

    pub fn back(&mut self) -> WizardResult<ViewChange> {
        self.state.back()
    }

    /// Process a selected photo. On failure the banner is shown and the
    /// previous photo, if any, is kept.
    pub async fn select_photo(&mut self, bytes: Vec<u8>) -> WizardResult<()> {
        if self.state.view() != View::Step2 {
            return Err(self.not_here("attach a photo"));
        }
        let result = self.processor.process(bytes).await;
        self.accept_photo(result)
    }

    /// Apply a photo pipeline result. With several pipelines in flight the
    /// last one accepted wins.
    pub fn accept_photo(&mut self, result: WizardResult<ImagePayload>) -> WizardResult<()> {
        match result {
            Ok(image) => {
                info!(width = image.width, height = image.height, "Photo ready");
                self.state.set_image(image)
            }
            Err(e) => {
                warn!(error = %e, "Photo rejected");
                self.state.show_banner(e.user_message());
                Err(e)
            }
        }
    }

    pub fn begin_analyze(&mut self) -> WizardResult<(Ticket, AssessRequest)> {
        let (ticket, _) = self.state.begin_analyze()?;
        let image = self
            .state
            .image()
            .ok_or_else(|| WizardError::InvalidInput("Please take or select a photo first.".into()))?;
        Ok((ticket, AssessRequest::new(image, self.form.values())))
    }

    /// Apply an assessment response. Returns `Ok(None)` when the response
    /// belongs to a view the user already left.
    pub fn finish_analyze(
        &mut self,
        ticket: Ticket,
        result: WizardResult<AssessmentResult>,
    ) -> WizardResult<Option<ViewChange>> {
        let change = self.state.finish_analyze(ticket, result)?;
        if change.is_some() {
            if let Some(assessment) = self.state.assessment() {
                self.review = Some(render_review(assessment, &self.schema));
            }
        }
        Ok(change)
    }

    /// Step2 → Loading → Step3.
    pub async fn analyze(&mut self) -> WizardResult<ViewChange> {
        let (ticket, request) = self.begin_analyze()?;
        let result = self.api.assess(&request).await;
        self.finish_analyze(ticket, result)?
            .ok_or_else(|| self.not_here("finish the analysis"))
    }

    pub fn begin_submit(&mut self) -> WizardResult<(Ticket, SubmissionPayload)> {
        let payload = self
            .review
            .as_ref()
            .zip(self.state.image())
            .map(|(review, image)| build_submission(self.form.values(), review, image))
            .ok_or_else(|| self.not_here("submit"))?;
        let ticket = self.state.begin_submit()?;
        Ok((ticket, payload))
    }

    pub fn finish_submit(
        &mut self,
        ticket: Ticket,
        result: WizardResult<()>,
    ) -> WizardResult<Option<ViewChange>> {
        let change = self.state.finish_submit(ticket, result)?;
        if change.is_some() {
            info!("Assessment submitted");
        }
        Ok(change)
    }

    /// Step3 → Success.
    pub async fn submit(&mut self) -> WizardResult<ViewChange> {
        let (ticket, payload) = self.begin_submit()?;
        let result = self.api.submit(&payload).await;
        self.finish_submit(ticket, result)?
            .ok_or_else(|| self.not_here("finish the submission"))
    }

    /// Success → Step1. The metadata form keeps the saved answers.
    pub fn reset(&mut self) -> WizardResult<ViewChange> {
        let change = self.state.reset()?;
        self.review = None;
        Ok(change)
    }
}
