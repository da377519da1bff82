use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{info, warn};
use uuid::Uuid;

use crate::app::deploy::redefiners::{select_redefiners, DebuggerRegistry, Device, RedefinerMap};
use crate::app::error::AppError;
use crate::app::models::{ApplyChangesReport, CodeSwapOutcome};

pub const APPLY_CODE_CHANGES_ID: &str = "APPLY_CODE_CHANGES";

/// Swaps changed classes into running processes. Processes missing from
/// `redefiners` are handled through the deployer's generic channel.
pub trait Deployer {
    fn code_swap(
        &self,
        application_id: &str,
        apks: &[String],
        redefiners: &RedefinerMap,
    ) -> Result<CodeSwapOutcome, AppError>;
}

pub struct ApplyCodeChangesTask {
    packages: BTreeMap<String, Vec<PathBuf>>,
}

impl ApplyCodeChangesTask {
    /// `packages` maps application ids to the APKs to deploy for them.
    pub fn new(packages: BTreeMap<String, Vec<PathBuf>>) -> Self {
        Self { packages }
    }

    pub fn id(&self) -> &'static str {
        APPLY_CODE_CHANGES_ID
    }

    pub fn description(&self) -> &'static str {
        "Apply Code Changes"
    }

    pub fn failure_title(&self) -> &'static str {
        "Changes were not applied."
    }

    pub fn skipped_apk_install_message(&self, skipped: &[String], all: bool) -> String {
        if all {
            "No code changes detected.".to_string()
        } else {
            format!(
                "No code changes detected. The following APK(s) are not installed: {}",
                skipped.join(", ")
            )
        }
    }

    pub fn perform(
        &self,
        project: &dyn DebuggerRegistry,
        device: &dyn Device,
        deployer: &dyn Deployer,
        application_id: &str,
        files: &[PathBuf],
        trace_id: &str,
    ) -> Result<CodeSwapOutcome, AppError> {
        info!(
            trace_id = %trace_id,
            application_id = %application_id,
            serial = %device.serial(),
            "Applying code changes to application"
        );
        let redefiners = select_redefiners(project, device);
        let apks = files
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect::<Vec<_>>();
        deployer.code_swap(application_id, &apks, &redefiners)
    }

    /// Applies changes for every package in application-id order; stops at the first failure.
    pub fn run(
        &self,
        project: &dyn DebuggerRegistry,
        device: &dyn Device,
        deployer: &dyn Deployer,
    ) -> Result<ApplyChangesReport, AppError> {
        let trace_id = Uuid::new_v4().to_string();
        let mut outcomes = Vec::with_capacity(self.packages.len());
        for (application_id, files) in &self.packages {
            let outcome = self
                .perform(project, device, deployer, application_id, files, &trace_id)
                .map_err(|err| {
                    warn!(
                        trace_id = %trace_id,
                        application_id = %application_id,
                        code = %err.code,
                        error = %err.error,
                        "{}",
                        self.failure_title()
                    );
                    err
                })?;
            outcomes.push(outcome);
        }

        let skipped = outcomes
            .iter()
            .filter(|outcome| outcome.skipped_install)
            .map(|outcome| outcome.application_id.clone())
            .collect::<Vec<_>>();
        let message = (!skipped.is_empty())
            .then(|| self.skipped_apk_install_message(&skipped, skipped.len() == outcomes.len()));

        Ok(ApplyChangesReport {
            trace_id,
            outcomes,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::deploy::redefiners::tests::{client, FakeDevice, FakeProject};
    use std::cell::RefCell;
    use std::collections::HashSet;

    #[derive(Default)]
    struct RecordingDeployer {
        calls: RefCell<Vec<(String, Vec<String>, RedefinerMap)>>,
        skip: HashSet<String>,
        fail_on: Option<String>,
    }

    impl Deployer for RecordingDeployer {
        fn code_swap(
            &self,
            application_id: &str,
            apks: &[String],
            redefiners: &RedefinerMap,
        ) -> Result<CodeSwapOutcome, AppError> {
            self.calls
                .borrow_mut()
                .push((application_id.to_string(), apks.to_vec(), redefiners.clone()));
            if self.fail_on.as_deref() == Some(application_id) {
                return Err(AppError::dependency("swap rejected", "t"));
            }
            Ok(CodeSwapOutcome {
                application_id: application_id.to_string(),
                skipped_install: self.skip.contains(application_id),
            })
        }
    }

    fn task(ids: &[&str]) -> ApplyCodeChangesTask {
        let packages = ids
            .iter()
            .map(|id| (id.to_string(), vec![PathBuf::from(format!("/out/{id}.apk"))]))
            .collect();
        ApplyCodeChangesTask::new(packages)
    }

    fn attached_project() -> FakeProject {
        FakeProject {
            attached: true,
            ports: HashSet::from([8600]),
        }
    }

    #[test]
    fn exposes_task_metadata() {
        let task = task(&["com.example"]);
        assert_eq!(task.id(), "APPLY_CODE_CHANGES");
        assert_eq!(task.description(), "Apply Code Changes");
        assert_eq!(task.failure_title(), "Changes were not applied.");
    }

    #[test]
    fn skipped_message_lists_apks_unless_all_skipped() {
        let task = task(&[]);
        let skipped = vec!["a.apk".to_string(), "b.apk".to_string()];
        assert_eq!(task.skipped_apk_install_message(&skipped, true), "No code changes detected.");
        assert_eq!(
            task.skipped_apk_install_message(&skipped, false),
            "No code changes detected. The following APK(s) are not installed: a.apk, b.apk"
        );
    }

    #[test]
    fn perform_passes_selected_redefiners_to_deployer() {
        let device = FakeDevice::new(vec![client(100, Some(8600)), client(101, None)]);
        let deployer = RecordingDeployer::default();
        let task = task(&["com.example"]);

        task.perform(
            &attached_project(),
            &device,
            &deployer,
            "com.example",
            &[PathBuf::from("/out/app.apk")],
            "t",
        )
        .expect("swap");

        let calls = deployer.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec!["/out/app.apk".to_string()]);
        assert_eq!(calls[0].2.len(), 1);
        assert_eq!(calls[0].2.get(100).map(|r| r.port), Some(8600));
    }

    #[test]
    fn run_reports_partially_skipped_packages() {
        let device = FakeDevice::new(vec![client(100, Some(8600))]);
        let deployer = RecordingDeployer {
            skip: HashSet::from(["com.b".to_string()]),
            ..RecordingDeployer::default()
        };
        let task = task(&["com.a", "com.b"]);

        let report = task.run(&attached_project(), &device, &deployer).expect("run");

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].application_id, "com.a");
        assert_eq!(
            report.message.as_deref(),
            Some("No code changes detected. The following APK(s) are not installed: com.b")
        );
        assert!(!report.trace_id.is_empty());
    }

    #[test]
    fn run_without_skips_has_no_message() {
        let device = FakeDevice::new(Vec::new());
        let deployer = RecordingDeployer::default();
        let report = task(&["com.a"])
            .run(&attached_project(), &device, &deployer)
            .expect("run");
        assert!(report.message.is_none());
    }

    #[test]
    fn run_stops_at_first_failure() {
        let device = FakeDevice::new(Vec::new());
        let deployer = RecordingDeployer {
            fail_on: Some("com.a".to_string()),
            ..RecordingDeployer::default()
        };

        let err = task(&["com.a", "com.b"])
            .run(&attached_project(), &device, &deployer)
            .expect_err("expected failure");

        assert_eq!(err.code, "ERR_DEPENDENCY");
        assert_eq!(deployer.calls.borrow().len(), 1);
    }
}
