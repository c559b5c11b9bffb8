use chrono::{DateTime, TimeZone, Utc};
use clap::Args;
use grantthrive::access::{Caller, OrganizationId, Role, UserId};
use grantthrive::clock::FixedClock;
use grantthrive::error::AppError;
use grantthrive::money::Amount;
use grantthrive::workflows::applications::{ApplicationReview, ApplicationStatus, NewApplication};
use grantthrive::workflows::features::{ComplianceTemplate, FeatureKey, CATALOG};
use grantthrive::workflows::grants::{GrantCategory, NewGrant};
use grantthrive::workflows::{ListingConfig, WorkflowError};
use std::sync::Arc;

use crate::infra::Services;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Organization that owns the demo grant
    #[arg(long, default_value_t = 7)]
    pub(crate) organization_id: u64,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let organization = OrganizationId(args.organization_id);
    let clock = Arc::new(FixedClock::new(demo_instant(2025, 1, 15)?));
    let services = Services::in_memory(clock, ListingConfig::default());

    let admin = Caller::new(UserId(100), Role::ClientAdmin, Some(organization));
    let alice = Caller::new(UserId(200), Role::Applicant, None);
    let bob = Caller::new(UserId(201), Role::Applicant, None);

    println!("GrantThrive lifecycle demo (organization {organization})");

    println!("\nGrant publication");
    let grant = services.grants.create(
        &admin,
        NewGrant {
            title: "Community Arts Fund".to_string(),
            description: "Small grants for local arts projects".to_string(),
            category: GrantCategory::ArtsCulture,
            tags: vec!["arts".to_string(), "community".to_string()],
            is_featured: false,
            total_funding: Amount::from_units(50_000),
            min_amount: Some(Amount::from_units(1_000)),
            max_amount: Some(Amount::from_units(5_000)),
            application_open_date: demo_instant(2025, 1, 1)?,
            application_close_date: demo_instant(2025, 1, 31)?,
            organization_id: organization,
        },
    )?;
    println!(
        "  Created '{}' ({}) as {}",
        grant.title,
        grant.slug,
        grant.status.label()
    );
    let published = services.grants.publish(&admin, grant.id)?;
    println!("  Published: status is now {}", published.status.label());
    print_refusal(
        "  Publishing again",
        services.grants.publish(&admin, grant.id),
    );

    println!("\nApplication intake");
    print_refusal(
        "  Requesting 6000.00",
        services.applications.create(
            &alice,
            NewApplication {
                grant_id: grant.id,
                project_title: "Mural trail".to_string(),
                project_description: String::new(),
                requested_amount: Amount::from_units(6_000),
            },
        ),
    );
    let application = services.applications.create(
        &alice,
        NewApplication {
            grant_id: grant.id,
            project_title: "Mural trail".to_string(),
            project_description: "Six murals along the river walk".to_string(),
            requested_amount: Amount::from_units(3_000),
        },
    )?;
    println!(
        "  Draft {} requesting {}",
        application.reference_number, application.requested_amount
    );
    let counted = services.grants.get(Some(&admin), grant.id)?;
    println!("  Grant application count: {}", counted.application_count);
    print_refusal(
        "  Second application from the same applicant",
        services.applications.create(
            &alice,
            NewApplication {
                grant_id: grant.id,
                project_title: "Another mural".to_string(),
                project_description: String::new(),
                requested_amount: Amount::from_units(2_000),
            },
        ),
    );

    println!("\nReview");
    let submitted = services.applications.submit(&alice, application.id)?;
    println!("  Submitted: status is now {}", submitted.status.label());
    let decision = ApplicationReview {
        status: ApplicationStatus::Approved,
        reviewer_notes: Some("Strong community benefit".to_string()),
        feedback: Some("Congratulations".to_string()),
        score: Some(90),
    };
    let approved = services
        .applications
        .review(&admin, application.id, decision.clone())?;
    println!(
        "  Reviewed: status is now {} with score {}",
        approved.status.label(),
        approved.score.unwrap_or_default()
    );
    print_refusal(
        "  Reviewing again",
        services.applications.review(&admin, application.id, decision),
    );

    println!("\nFeature toggles");
    let features = services
        .features
        .apply_template(&admin, organization, "standard")?;
    for key in [FeatureKey::Forums, FeatureKey::Networking] {
        let enabled = features.get(&key).is_some_and(|toggle| toggle.is_enabled);
        println!("  {key}: {}", if enabled { "enabled" } else { "disabled" });
    }

    println!("\nGrant retirement");
    services.applications.create(
        &bob,
        NewApplication {
            grant_id: grant.id,
            project_title: "Street theatre".to_string(),
            project_description: String::new(),
            requested_amount: Amount::from_units(1_500),
        },
    )?;
    let counted = services.grants.get(Some(&admin), grant.id)?;
    println!("  Grant application count: {}", counted.application_count);
    print_refusal("  Deleting", services.grants.delete(&admin, grant.id));
    let archived = services.grants.archive(&admin, grant.id)?;
    println!("  Archived: status is now {}", archived.status.label());

    Ok(())
}

pub(crate) fn print_templates() {
    println!("Feature catalog");
    for definition in CATALOG.iter() {
        println!(
            "  {:<26} tier {} {:?} risk{}",
            definition.key.as_str(),
            definition.tier,
            definition.risk_level,
            if definition.moderation_required {
                ", moderated"
            } else {
                ""
            }
        );
    }

    for template in ComplianceTemplate::ALL {
        println!("\nTemplate: {template}");
        for (key, setting) in template.describe().features {
            let state = if setting.is_enabled { "on " } else { "off" };
            if setting.configuration.is_empty() {
                println!("  {state} {key}");
            } else {
                let configuration = serde_json::to_string(&setting.configuration)
                    .unwrap_or_else(|_| "{}".to_string());
                println!("  {state} {key} {configuration}");
            }
        }
    }
}

fn print_refusal<T>(step: &str, outcome: Result<T, WorkflowError>) {
    match outcome {
        Ok(_) => println!("{step}: unexpectedly accepted"),
        Err(err) => println!("{step}: refused ({}: {err})", err.kind().label()),
    }
}

fn demo_instant(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>, AppError> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .ok_or_else(|| WorkflowError::validation("invalid demo date").into())
}
