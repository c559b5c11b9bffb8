use std::thread;

use crate::store::{Store, StoreTransaction};
use crate::workflows::applications::ApplicationFilter;
use crate::workflows::testing::{applicant, new_application, Harness};
use crate::workflows::{ErrorKind, WorkflowError};

const APPLICANTS: u64 = 16;

#[test]
fn concurrent_creations_are_all_counted() {
    let harness = Harness::new();
    let grant = harness.published("Community Arts Fund");

    thread::scope(|scope| {
        for applicant_id in 100..100 + APPLICANTS {
            let applications = &harness.applications;
            scope.spawn(move || {
                applications
                    .create(&applicant(applicant_id), new_application(grant.id, 2_500))
                    .expect("distinct applicants never conflict")
            });
        }
    });

    let stored = harness.grants.get(None, grant.id).expect("grant");
    assert_eq!(u64::from(stored.application_count), APPLICANTS);

    let rows = harness
        .store
        .transaction(|tx: &mut dyn StoreTransaction| {
            tx.applications(&ApplicationFilter {
                grant_id: Some(grant.id),
                ..ApplicationFilter::default()
            })
        })
        .expect("read");
    let mut references: Vec<_> = rows
        .iter()
        .map(|application| application.reference_number.clone())
        .collect();
    references.sort_by(|left, right| left.as_str().cmp(right.as_str()));
    references.dedup();
    assert_eq!(references.len() as u64, APPLICANTS);
}

#[test]
fn racing_duplicates_leave_exactly_one_application() {
    let harness = Harness::new();
    let grant = harness.published("Community Arts Fund");

    let outcomes: Vec<Result<_, WorkflowError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let applications = &harness.applications;
                scope.spawn(move || {
                    applications.create(&applicant(40), new_application(grant.id, 3_000))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err())
        .all(|err| err.kind() == ErrorKind::Conflict));

    let stored = harness.grants.get(None, grant.id).expect("grant");
    assert_eq!(stored.application_count, 1);
}

#[test]
fn racing_submissions_apply_once() {
    let harness = Harness::new();
    let grant = harness.published("Community Arts Fund");
    let application = harness
        .applications
        .create(&applicant(40), new_application(grant.id, 3_000))
        .expect("create");

    let outcomes: Vec<Result<_, WorkflowError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let applications = &harness.applications;
                scope.spawn(move || applications.submit(&applicant(40), application.id))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err())
        .all(|err| err.kind() == ErrorKind::InvalidTransition));
}
