use crate::access::{Caller, Role, UserId};
use crate::money::Amount;
use crate::workflows::grants::{GrantQuery, GrantStatus, GrantUpdate};
use crate::workflows::testing::{
    applicant, at, client_admin, client_user, new_application, new_grant, outsider_staff,
    super_admin, Harness, COUNCIL,
};
use crate::workflows::{ConflictReason, WorkflowError};

#[test]
fn create_drafts_a_grant_for_the_callers_organization() {
    let harness = Harness::new();
    let grant = harness.draft("Community Arts Fund");

    assert_eq!(grant.status, GrantStatus::Draft);
    assert_eq!(grant.slug, "community-arts-fund");
    assert_eq!(grant.organization_id, COUNCIL);
    assert_eq!(grant.created_by, UserId(2));
    assert_eq!(grant.application_count, 0);
    assert_eq!(grant.view_count, 0);
}

#[test]
fn create_rejects_callers_outside_the_organization() {
    let harness = Harness::new();
    for caller in [outsider_staff(), applicant(40)] {
        match harness.grants.create(&caller, new_grant("Youth Sport Fund")) {
            Err(WorkflowError::Forbidden(_)) => {}
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
    assert!(harness
        .grants
        .create(&super_admin(), new_grant("Youth Sport Fund"))
        .is_ok());
}

#[test]
fn create_validates_window_and_bounds() {
    let harness = Harness::new();

    let mut inverted = new_grant("Inverted");
    inverted.application_close_date = inverted.application_open_date;
    assert!(matches!(
        harness.grants.create(&client_admin(), inverted),
        Err(WorkflowError::Validation(_))
    ));

    let mut crossed = new_grant("Crossed");
    crossed.min_amount = Some(Amount::from_units(6_000));
    assert!(matches!(
        harness.grants.create(&client_admin(), crossed),
        Err(WorkflowError::Validation(_))
    ));

    let mut oversized = new_grant("Oversized");
    oversized.max_amount = Some(Amount::from_units(60_000));
    assert!(matches!(
        harness.grants.create(&client_admin(), oversized),
        Err(WorkflowError::Validation(_))
    ));
}

#[test]
fn colliding_titles_get_numbered_slugs() {
    let harness = Harness::new();
    let first = harness.draft("Green Streets!");
    let second = harness.draft("Green Streets");
    let third = harness.draft("green  streets");

    assert_eq!(first.slug, "green-streets");
    assert_eq!(second.slug, "green-streets-1");
    assert_eq!(third.slug, "green-streets-2");
}

#[test]
fn publishing_twice_is_an_invalid_transition() {
    let harness = Harness::new();
    let grant = harness.draft("Community Arts Fund");

    let published = harness
        .grants
        .publish(&client_admin(), grant.id)
        .expect("draft publishes");
    assert_eq!(published.status, GrantStatus::Published);

    match harness.grants.publish(&client_admin(), grant.id) {
        Err(WorkflowError::InvalidTransition { status, .. }) => assert_eq!(status, "published"),
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn lifecycle_mutations_require_organization_authority() {
    let harness = Harness::new();
    let grant = harness.draft("Community Arts Fund");

    assert!(matches!(
        harness.grants.publish(&outsider_staff(), grant.id),
        Err(WorkflowError::Forbidden(_))
    ));
    let published = harness
        .grants
        .publish(&client_user(), grant.id)
        .expect("staff of the organization may publish");
    assert_eq!(published.status, GrantStatus::Published);
}

#[test]
fn delete_with_applications_conflicts_but_archive_succeeds() {
    let harness = Harness::new();
    let grant = harness.published("Community Arts Fund");
    for applicant_id in [40, 41] {
        harness
            .applications
            .create(&applicant(applicant_id), new_application(grant.id, 3_000))
            .expect("application within bounds");
    }

    match harness.grants.delete(&client_admin(), grant.id) {
        Err(WorkflowError::Conflict(ConflictReason::GrantHasApplications { count, .. })) => {
            assert_eq!(count, 2)
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let archived = harness
        .grants
        .archive(&client_admin(), grant.id)
        .expect("archive is always allowed");
    assert_eq!(archived.status, GrantStatus::Archived);
    assert_eq!(archived.application_count, 2);
}

#[test]
fn delete_archives_grants_without_applications() {
    let harness = Harness::new();
    let grant = harness.published("Community Arts Fund");
    let deleted = harness
        .grants
        .delete(&client_admin(), grant.id)
        .expect("no applications yet");
    assert_eq!(deleted.status, GrantStatus::Archived);
}

#[test]
fn unpublished_grants_are_hidden_or_denied() {
    let harness = Harness::new();
    let grant = harness.draft("Community Arts Fund");

    assert!(matches!(
        harness.grants.get(None, grant.id),
        Err(WorkflowError::NotFound { .. })
    ));
    assert!(matches!(
        harness.grants.get(Some(&applicant(40)), grant.id),
        Err(WorkflowError::Forbidden(_))
    ));
    assert!(matches!(
        harness.grants.get(Some(&outsider_staff()), grant.id),
        Err(WorkflowError::Forbidden(_))
    ));
    let seen = harness
        .grants
        .get(Some(&client_user()), grant.id)
        .expect("members see drafts");
    assert_eq!(seen.view_count, 0, "draft reads are not counted");
}

#[test]
fn applicant_roles_never_see_drafts_even_with_an_organization() {
    let harness = Harness::new();
    let grant = harness.draft("Community Arts Fund");

    for role in [Role::Applicant, Role::Professional] {
        let resident = Caller::new(UserId(77), role, Some(COUNCIL));
        assert!(matches!(
            harness.grants.get(Some(&resident), grant.id),
            Err(WorkflowError::Forbidden(_))
        ));
        assert!(matches!(
            harness.grants.get_by_slug(Some(&resident), &grant.slug),
            Err(WorkflowError::Forbidden(_))
        ));
        let page = harness
            .grants
            .list(Some(&resident), GrantQuery::default())
            .expect("list");
        assert_eq!(page.total, 0);
    }
}

#[test]
fn reads_of_published_grants_count_views() {
    let harness = Harness::new();
    let grant = harness.published("Community Arts Fund");

    harness.grants.get(None, grant.id).expect("public read");
    harness
        .grants
        .get_by_slug(Some(&applicant(40)), &grant.slug)
        .expect("slug read");
    let third = harness.grants.get(None, grant.id).expect("public read");
    assert_eq!(third.view_count, 3);
}

#[test]
fn public_listings_only_show_published_grants() {
    let harness = Harness::new();
    harness.draft("Draft Fund");
    harness.published("Open Fund");

    let public = harness
        .grants
        .list(None, GrantQuery::default())
        .expect("list");
    assert_eq!(public.total, 1);
    assert_eq!(public.items[0].title, "Open Fund");

    let asked_for_drafts = GrantQuery {
        status: Some(GrantStatus::Draft),
        ..GrantQuery::default()
    };
    let forced = harness
        .grants
        .list(Some(&applicant(40)), asked_for_drafts.clone())
        .expect("list");
    assert!(forced
        .items
        .iter()
        .all(|grant| grant.status == GrantStatus::Published));

    let staff = harness
        .grants
        .list(Some(&client_admin()), asked_for_drafts)
        .expect("list");
    assert_eq!(staff.total, 1);
    assert_eq!(staff.items[0].title, "Draft Fund");
}

#[test]
fn listings_filter_search_and_paginate_newest_first() {
    let harness = Harness::new();
    for index in 0..5 {
        harness.published(&format!("Heritage Fund {index}"));
    }
    harness.published("Sports Fund");

    let query = GrantQuery {
        search: Some("  HERITAGE ".to_string()),
        limit: Some(2),
        skip: 2,
        ..GrantQuery::default()
    };
    let page = harness.grants.list(None, query).expect("list");
    assert_eq!(page.total, 5);
    assert_eq!(page.pages, 3);
    assert_eq!(page.page, 2);
    let titles: Vec<_> = page.items.iter().map(|grant| grant.title.as_str()).collect();
    assert_eq!(titles, vec!["Heritage Fund 2", "Heritage Fund 1"]);

    let open_now = GrantQuery {
        is_open: Some(true),
        ..GrantQuery::default()
    };
    harness.clock.set(at(2025, 3, 1));
    assert_eq!(harness.grants.list(None, open_now).expect("list").total, 0);
}

#[test]
fn updates_revalidate_terms_and_freeze_archived_grants() {
    let harness = Harness::new();
    let grant = harness.draft("Community Arts Fund");

    let renamed = harness
        .grants
        .update(
            &client_admin(),
            grant.id,
            GrantUpdate {
                title: Some("Community Arts Fund 2025".to_string()),
                ..GrantUpdate::default()
            },
        )
        .expect("rename");
    assert_eq!(renamed.title, "Community Arts Fund 2025");
    assert_eq!(renamed.slug, grant.slug, "slug is fixed at creation");

    let inverted = GrantUpdate {
        application_close_date: Some(at(2024, 12, 1)),
        ..GrantUpdate::default()
    };
    assert!(matches!(
        harness.grants.update(&client_admin(), grant.id, inverted),
        Err(WorkflowError::Validation(_))
    ));
    let stored = harness
        .grants
        .get(Some(&client_admin()), grant.id)
        .expect("read back");
    assert_eq!(stored.application_close_date, grant.application_close_date);

    harness
        .grants
        .archive(&client_admin(), grant.id)
        .expect("archive");
    assert!(matches!(
        harness
            .grants
            .update(&client_admin(), grant.id, GrantUpdate::default()),
        Err(WorkflowError::InvalidTransition { .. })
    ));
}

#[test]
fn updates_trim_titles_and_can_clear_bounds() {
    let harness = Harness::new();
    let grant = harness.draft("Community Arts Fund");

    let update: GrantUpdate = serde_json::from_str(
        r#"{ "title": "  Arts Fund Renewed  ", "max_amount": null }"#,
    )
    .expect("update payload");
    assert_eq!(update.max_amount, Some(None));
    assert_eq!(update.min_amount, None);

    let updated = harness
        .grants
        .update(&client_admin(), grant.id, update)
        .expect("update");
    assert_eq!(updated.title, "Arts Fund Renewed");
    assert_eq!(updated.max_amount, None);
    assert_eq!(updated.min_amount, grant.min_amount);

    let raised = harness
        .grants
        .update(
            &client_admin(),
            grant.id,
            GrantUpdate {
                min_amount: Some(Some(Amount::from_units(2_000))),
                ..GrantUpdate::default()
            },
        )
        .expect("raise minimum");
    assert_eq!(raised.min_amount, Some(Amount::from_units(2_000)));
}
