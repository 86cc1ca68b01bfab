use crate::infra::InMemoryNotifier;
use clap::Args;
use mod_intake::applications::{
    AgeInput, Application, ApplicationFields, InMemoryApplicationRepository,
    ModApplicationService, ReviewDecision, ReviewQuery, StatusFilter, WebhookNotifier,
};
use mod_intake::error::AppError;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Applicant key used for the walkthrough
    #[arg(long, default_value = "A#1")]
    pub(crate) applicant: String,
    /// Age submitted on the first application
    #[arg(long, default_value_t = 25)]
    pub(crate) age: i64,
    /// Print the webhook payload produced for the first submission
    #[arg(long)]
    pub(crate) show_webhook: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            applicant: "A#1".to_string(),
            age: 25,
            show_webhook: false,
        }
    }
}

fn demo_answers(age: AgeInput) -> ApplicationFields {
    ApplicationFields {
        age,
        experience: "Two years moderating a 5k member gaming server".to_string(),
        motivation: "The evening shift needs more coverage".to_string(),
        scenario: "Remove the messages, mute the user, and log it for the team".to_string(),
        timezone: Some("CET".to_string()),
        contact: None,
    }
}

fn print_counts(
    step: &str,
    service: &ModApplicationService<InMemoryApplicationRepository>,
) -> Result<(), AppError> {
    let counts = service.counts()?;
    println!(
        "  {step:<28} total={} pending={} approved={} rejected={}",
        counts.total, counts.pending, counts.approved, counts.rejected
    );
    Ok(())
}

fn describe(application: &Application) -> String {
    format!(
        "{} ({}, age {}, {})",
        application.applicant_key, application.id, application.age, application.status
    )
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        applicant,
        age,
        show_webhook,
    } = args;

    let notifier = InMemoryNotifier::default();
    let service = ModApplicationService::new(Arc::new(InMemoryApplicationRepository::default()))
        .with_notifier(Arc::new(notifier.clone()));

    println!("Moderator application demo");

    for rejected_age in [12, 100] {
        if let Err(err) = service.submit(&applicant, demo_answers(AgeInput::Number(rejected_age)))
        {
            println!("  rejected at intake: {err}");
        }
    }

    let submitted = service.submit(&applicant, demo_answers(AgeInput::Number(age)))?;
    println!("  submitted {}", describe(&submitted));
    print_counts("after submit", &service)?;

    let approved = service.set_status(&submitted.id, ReviewDecision::Approved)?;
    println!("  reviewer approved {}", describe(&approved));
    print_counts("after approval", &service)?;

    let resubmitted = service.submit(&applicant, demo_answers(AgeInput::Number(age)))?;
    println!("  resubmitted {}", describe(&resubmitted));
    print_counts("after resubmission", &service)?;

    let pending = service.list_for_review(&ReviewQuery::new().with_status(StatusFilter::Pending))?;
    println!("  pending queue: {} application(s)", pending.len());

    service.delete(&submitted.id)?;
    print_counts("after delete", &service)?;

    match service.set_status(&submitted.id, ReviewDecision::Rejected) {
        Ok(_) => println!("  unexpected: deleted application was updated"),
        Err(err) => println!("  status change after delete: {err}"),
    }

    // Notifications run as detached tasks; give them a moment to land.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = notifier.events();
    println!("\nNotifications sent: {}", events.len());
    for event in &events {
        println!(
            "  {} (age {}){}",
            event.applicant_key,
            event.age,
            if event.resubmission { " [updated]" } else { "" }
        );
    }

    if show_webhook {
        if let Some(first) = events.first() {
            let payload = WebhookNotifier::payload(first);
            let rendered = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|_| payload.to_string());
            println!("\nWebhook payload\n{rendered}");
        }
    }

    Ok(())
}
