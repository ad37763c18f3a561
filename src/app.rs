use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::ai::{MacroEstimator, OpenAiEstimator};
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{
    Bands, MacroSet, NewEntry, Submission, DATE_FORMAT, DEFAULT_QUANTITY, DEFAULT_UNIT,
};
use crate::services::{FormClient, GoogleFormsClient, Mailer, ResendMailer};

const WARNING_SUBJECT: &str = "Keto Warning!";

pub struct App {
    pub repository: Repository,
    bands: Bands,
    estimator: Arc<dyn MacroEstimator>,
    mailer: Arc<dyn Mailer>,
    form: Arc<dyn FormClient>,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let repository = Repository::new(&config.db_path).await?;

        let estimator = Arc::new(OpenAiEstimator::new(config.openai_api_key()?.to_string()));
        let mailer = Arc::new(ResendMailer::new(
            config.resend_api_key()?.to_string(),
            config.notification_recipient()?.to_string(),
        ));
        let form = Arc::new(GoogleFormsClient::new(
            config.forms_api_token()?.to_string(),
            config.form_id()?.to_string(),
        ));

        Ok(Self {
            repository,
            bands: config.bands.clone(),
            estimator,
            mailer,
            form,
        })
    }

    /// Wire the app from explicit parts. Used by tests to inject fakes.
    #[allow(dead_code)]
    pub fn with_collaborators(
        repository: Repository,
        bands: Bands,
        estimator: Arc<dyn MacroEstimator>,
        mailer: Arc<dyn Mailer>,
        form: Arc<dyn FormClient>,
    ) -> Self {
        Self {
            repository,
            bands,
            estimator,
            mailer,
            form,
        }
    }

    /// Process one form submission to completion.
    pub async fn handle_submission(&self, submission: Submission) -> Result<()> {
        self.handle_submission_at(submission, Local::now()).await
    }

    pub async fn handle_submission_at(
        &self,
        mut submission: Submission,
        now: DateTime<Local>,
    ) -> Result<()> {
        // Resolve a saved-item reference before anything is written; a bad
        // reference aborts the whole submission.
        if let Some(name) = submission.saved_item.clone() {
            let quantity = submission.quantity.unwrap_or(DEFAULT_QUANTITY);
            let saved = self
                .repository
                .saved_item(&name)
                .await?
                .ok_or(AppError::UnknownSavedItem(name))?;
            submission.item = saved.name;
            submission.set_macros(saved.per_unit.scale(quantity));
        }

        if submission.item.is_empty() {
            // Incomplete rows are ignored rather than flagged
            return Ok(());
        }

        let quantity = submission.quantity.unwrap_or(DEFAULT_QUANTITY);
        let unit = submission
            .unit
            .clone()
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());
        let entry_date = now.format(DATE_FORMAT).to_string();

        let entry_id = self
            .repository
            .append_entry(NewEntry {
                timestamp: now.to_rfc3339(),
                entry_date: entry_date.clone(),
                item: submission.item.clone(),
                quantity,
                unit: unit.clone(),
                brand_info: submission.brand_info.clone(),
            })
            .await?;

        // Manual macros win when all four are supplied; otherwise estimate.
        // An estimation failure leaves the row without macros and propagates.
        let macros = match submission.manual_macros() {
            Some(macros) => macros,
            None => {
                self.estimator
                    .estimate(
                        &submission.item,
                        Some(quantity),
                        &unit,
                        submission.brand_info.as_deref(),
                    )
                    .await?
            }
        };
        self.repository.update_entry_macros(entry_id, macros).await?;

        if submission.save_item {
            let display_name = match &submission.brand_info {
                Some(brand) => format!("{} ({})", submission.item, brand),
                None => submission.item.clone(),
            };
            self.repository
                .insert_saved_item(&display_name, macros.per_unit(quantity))
                .await?;

            if let Err(e) = self.refresh_form_choices().await {
                tracing::warn!("Failed to refresh form choices: {}", e);
            }
        }

        let totals = self.accumulate_today(&entry_date).await?;
        self.repository.update_entry_totals(entry_id, totals).await?;

        self.check_carb_ceiling(entry_id, totals.carbs).await?;

        Ok(())
    }

    /// Sum of resolved macros for every entry logged on the given day,
    /// including the one currently being processed.
    pub async fn accumulate_today(&self, date: &str) -> Result<MacroSet> {
        let entries = self.repository.entries_on_date(date).await?;

        let mut totals = MacroSet::ZERO;
        for entry in &entries {
            // Unresolved rows count as zero
            if let Some(macros) = entry.macros {
                totals = totals.add(macros);
            }
        }
        Ok(totals)
    }

    /// Warn on the first crossing of the carb ceiling for the day. The
    /// previous row's stored running total tells us whether we were already
    /// over; with no previous row we skip silently.
    async fn check_carb_ceiling(&self, entry_id: i64, total_carbs: f64) -> Result<()> {
        if total_carbs <= self.bands.carbs.green_ceil {
            return Ok(());
        }

        let Some(previous) = self.repository.entry_before(entry_id).await? else {
            return Ok(());
        };
        let previous_carbs = previous.totals.map(|t| t.carbs).unwrap_or(0.0);
        if previous_carbs > self.bands.carbs.green_ceil {
            return Ok(());
        }

        let body = format!(
            "Warning: You have exceeded the total recommended carb allowance for the day. \
             You have had {:.2} carbs today.",
            total_carbs
        );
        if let Err(e) = self.mailer.send(WARNING_SUBJECT, &body).await {
            tracing::error!("Failed to send warning notification: {}", e);
        }

        Ok(())
    }

    async fn refresh_form_choices(&self) -> Result<()> {
        let names = self.repository.saved_item_names().await?;
        self.form.refresh_item_choices(&names).await
    }

    /// Append a recap row for the most recent log day and email the summary.
    pub async fn produce_recap(&self) -> Result<()> {
        let Some(latest) = self.repository.latest_entry().await? else {
            tracing::warn!("No log entries yet; skipping recap");
            return Ok(());
        };

        let totals = latest.totals.unwrap_or(MacroSet::ZERO);
        self.repository.append_recap(&latest.entry_date, totals).await?;

        let subject = format!("Macros Summary for {}", latest.entry_date);
        let body = recap_body(&latest.entry_date, totals, &self.bands);
        // The recap row stays even when the email fails
        if let Err(e) = self.mailer.send(&subject, &body).await {
            tracing::error!("Failed to send recap notification: {}", e);
        }

        Ok(())
    }
}

fn recap_body(date: &str, totals: MacroSet, bands: &Bands) -> String {
    format!(
        "Macros summary for {}:\n  \
         Carbs: {:.2} ({})\n  \
         Fats: {:.2} ({})\n  \
         Proteins: {:.2} ({})\n  \
         Calories: {:.2} ({})\n",
        date,
        totals.carbs,
        bands.carbs.classify(totals.carbs),
        totals.fats,
        bands.fats.classify(totals.fats),
        totals.proteins,
        bands.proteins.classify(totals.proteins),
        totals.calories,
        bands.calories.classify(totals.calories),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;

    struct ScriptedEstimator {
        responses: Mutex<VecDeque<MacroSet>>,
        calls: Mutex<u32>,
    }

    impl ScriptedEstimator {
        fn new(responses: Vec<MacroSet>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl MacroEstimator for ScriptedEstimator {
        async fn estimate(
            &self,
            item: &str,
            quantity: Option<f64>,
            _unit: &str,
            _brand_info: Option<&str>,
        ) -> Result<MacroSet> {
            *self.calls.lock().unwrap() += 1;
            if item.is_empty() || quantity.is_none() {
                return Ok(MacroSet::ZERO);
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AppError::OpenAiApi("no scripted response left".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        fn messages(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, subject: &str, body: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingForm {
        refreshes: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingForm {
        fn refreshes(&self) -> Vec<Vec<String>> {
            self.refreshes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FormClient for RecordingForm {
        async fn refresh_item_choices(&self, names: &[String]) -> Result<()> {
            self.refreshes.lock().unwrap().push(names.to_vec());
            Ok(())
        }
    }

    struct TestHarness {
        app: App,
        estimator: Arc<ScriptedEstimator>,
        mailer: Arc<RecordingMailer>,
        form: Arc<RecordingForm>,
        _dir: tempfile::TempDir,
    }

    async fn harness(estimator_responses: Vec<MacroSet>) -> TestHarness {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let repository = Repository::new(db_path.to_str().unwrap()).await.unwrap();

        let estimator = ScriptedEstimator::new(estimator_responses);
        let mailer = Arc::new(RecordingMailer::default());
        let form = Arc::new(RecordingForm::default());

        let app = App::with_collaborators(
            repository,
            Bands::default(),
            estimator.clone(),
            mailer.clone(),
            form.clone(),
        );

        TestHarness {
            app,
            estimator,
            mailer,
            form,
            _dir: dir,
        }
    }

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn manual(carbs: f64, fats: f64, proteins: f64, calories: f64) -> Submission {
        Submission {
            item: "meal".to_string(),
            carbs: Some(carbs),
            fats: Some(fats),
            proteins: Some(proteins),
            calories: Some(calories),
            ..Submission::default()
        }
    }

    fn set(carbs: f64, fats: f64, proteins: f64, calories: f64) -> MacroSet {
        MacroSet {
            carbs,
            fats,
            proteins,
            calories,
        }
    }

    #[tokio::test]
    async fn estimated_submission_records_resolved_macros() {
        // Estimator output already has fiber subtracted: 27 - 3 = 24 carbs
        let h = harness(vec![set(24.0, 0.4, 1.3, 105.0)]).await;

        let submission = Submission {
            item: "banana".to_string(),
            quantity: Some(1.0),
            ..Submission::default()
        };
        h.app
            .handle_submission_at(submission, noon(2024, 3, 1))
            .await
            .unwrap();

        let entry = h.app.repository.latest_entry().await.unwrap().unwrap();
        assert_eq!(entry.item, "banana");
        assert_eq!(entry.quantity, 1.0);
        assert_eq!(entry.unit, "unit(s)");
        assert_eq!(entry.macros.unwrap(), set(24.0, 0.4, 1.3, 105.0));
        assert_eq!(entry.totals.unwrap(), set(24.0, 0.4, 1.3, 105.0));
    }

    #[tokio::test]
    async fn empty_item_is_a_silent_noop() {
        let h = harness(vec![]).await;

        h.app
            .handle_submission_at(Submission::default(), noon(2024, 3, 1))
            .await
            .unwrap();

        assert!(h.app.repository.latest_entry().await.unwrap().is_none());
        assert_eq!(h.estimator.call_count(), 0);
    }

    #[tokio::test]
    async fn manual_macros_skip_estimation() {
        let h = harness(vec![]).await;

        h.app
            .handle_submission_at(manual(10.0, 8.0, 20.0, 300.0), noon(2024, 3, 1))
            .await
            .unwrap();

        let entry = h.app.repository.latest_entry().await.unwrap().unwrap();
        assert_eq!(entry.macros.unwrap(), set(10.0, 8.0, 20.0, 300.0));
        assert_eq!(h.estimator.call_count(), 0);
    }

    #[tokio::test]
    async fn estimation_failure_aborts_and_leaves_macros_unresolved() {
        // Empty script makes the estimator fail
        let h = harness(vec![]).await;

        let submission = Submission {
            item: "mystery stew".to_string(),
            quantity: Some(1.0),
            ..Submission::default()
        };
        let result = h
            .app
            .handle_submission_at(submission, noon(2024, 3, 1))
            .await;
        assert!(result.is_err());

        // The raw row was appended but never resolved
        let entry = h.app.repository.latest_entry().await.unwrap().unwrap();
        assert!(entry.macros.is_none());
        assert!(entry.totals.is_none());
        assert!(h.mailer.messages().is_empty());
    }

    #[tokio::test]
    async fn unknown_saved_item_aborts_before_any_write() {
        let h = harness(vec![]).await;

        let submission = Submission {
            saved_item: Some("no such item".to_string()),
            ..Submission::default()
        };
        let result = h
            .app
            .handle_submission_at(submission, noon(2024, 3, 1))
            .await;
        assert!(matches!(result, Err(AppError::UnknownSavedItem(_))));
        assert!(h.app.repository.latest_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_item_reference_scales_per_unit_macros() {
        let h = harness(vec![]).await;
        h.app
            .repository
            .insert_saved_item("shake", set(2.0, 3.0, 4.0, 500.0))
            .await
            .unwrap();

        let submission = Submission {
            saved_item: Some("shake".to_string()),
            quantity: Some(3.0),
            ..Submission::default()
        };
        h.app
            .handle_submission_at(submission, noon(2024, 3, 1))
            .await
            .unwrap();

        let entry = h.app.repository.latest_entry().await.unwrap().unwrap();
        assert_eq!(entry.item, "shake");
        assert_eq!(entry.macros.unwrap(), set(6.0, 9.0, 12.0, 1500.0));
        assert_eq!(h.estimator.call_count(), 0);
    }

    #[tokio::test]
    async fn save_flag_stores_per_unit_macros_and_refreshes_form() {
        let h = harness(vec![]).await;

        let submission = Submission {
            item: "protein bar".to_string(),
            quantity: Some(2.0),
            brand_info: Some("BrandCo".to_string()),
            save_item: true,
            ..manual(10.0, 8.0, 20.0, 300.0)
        };
        h.app
            .handle_submission_at(submission, noon(2024, 3, 1))
            .await
            .unwrap();

        let saved = h
            .app
            .repository
            .saved_item("protein bar (BrandCo)")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.per_unit, set(5.0, 4.0, 10.0, 150.0));

        let refreshes = h.form.refreshes();
        assert_eq!(refreshes, vec![vec!["protein bar (BrandCo)".to_string()]]);
    }

    #[tokio::test]
    async fn warning_fires_exactly_once_per_day() {
        let h = harness(vec![]).await;
        let day = noon(2024, 3, 1);

        // Running totals go 15 -> 18 -> 22 -> 25; only the 18 -> 22
        // transition crosses the ceiling of 20
        for carbs in [15.0, 3.0, 4.0, 3.0] {
            h.app
                .handle_submission_at(manual(carbs, 0.0, 0.0, 0.0), day)
                .await
                .unwrap();
        }

        let messages = h.mailer.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "Keto Warning!");
        assert!(messages[0].1.contains("22.00"));
    }

    #[tokio::test]
    async fn first_entry_over_ceiling_has_no_previous_row_and_stays_silent() {
        // Preserved quirk of the original: with no preceding row the warning
        // is skipped even though the ceiling was crossed
        let h = harness(vec![]).await;

        h.app
            .handle_submission_at(manual(25.0, 0.0, 0.0, 0.0), noon(2024, 3, 1))
            .await
            .unwrap();

        assert!(h.mailer.messages().is_empty());
    }

    #[tokio::test]
    async fn totals_reset_at_day_boundaries() {
        let h = harness(vec![]).await;

        h.app
            .handle_submission_at(manual(10.0, 1.0, 1.0, 100.0), noon(2024, 3, 1))
            .await
            .unwrap();
        h.app
            .handle_submission_at(manual(5.0, 2.0, 2.0, 200.0), noon(2024, 3, 2))
            .await
            .unwrap();

        let entry = h.app.repository.latest_entry().await.unwrap().unwrap();
        assert_eq!(entry.totals.unwrap(), set(5.0, 2.0, 2.0, 200.0));
    }

    #[tokio::test]
    async fn accumulate_today_is_idempotent() {
        let h = harness(vec![]).await;
        let day = noon(2024, 3, 1);

        h.app
            .handle_submission_at(manual(10.0, 1.0, 1.0, 100.0), day)
            .await
            .unwrap();
        h.app
            .handle_submission_at(manual(4.0, 2.0, 3.0, 50.0), day)
            .await
            .unwrap();

        let first = h.app.accumulate_today("03/01/2024").await.unwrap();
        let second = h.app.accumulate_today("03/01/2024").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, set(14.0, 3.0, 4.0, 150.0));
    }

    #[tokio::test]
    async fn recap_appends_record_and_mails_classified_summary() {
        let h = harness(vec![]).await;

        h.app
            .handle_submission_at(manual(18.0, 140.0, 110.0, 1900.0), noon(2024, 3, 1))
            .await
            .unwrap();
        h.app.produce_recap().await.unwrap();

        let recaps = h.app.repository.recaps().await.unwrap();
        assert_eq!(recaps.len(), 1);
        assert_eq!(recaps[0].date, "03/01/2024");
        assert_eq!(recaps[0].totals, set(18.0, 140.0, 110.0, 1900.0));

        let messages = h.mailer.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "Macros Summary for 03/01/2024");
        let body = &messages[0].1;
        assert!(body.contains("Carbs: 18.00 (Perfect)"));
        assert!(body.contains("Fats: 140.00 (Perfect)"));
        assert!(body.contains("Proteins: 110.00 (Perfect)"));
        assert!(body.contains("Calories: 1900.00 (Perfect)"));
    }

    #[tokio::test]
    async fn recap_on_empty_log_is_a_noop() {
        let h = harness(vec![]).await;

        h.app.produce_recap().await.unwrap();

        assert!(h.app.repository.recaps().await.unwrap().is_empty());
        assert!(h.mailer.messages().is_empty());
    }
}
