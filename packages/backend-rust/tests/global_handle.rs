//! The process-wide prediction service. Kept in its own test binary so no
//! other test initialises the global first.

use std::sync::Arc;

use nsm_backend::prediction::{init_prediction_service, HandlePhase};

#[test]
fn first_initialisation_wins() {
    let first_dir = tempfile::tempdir().unwrap();
    let other_dir = tempfile::tempdir().unwrap();

    let first = init_prediction_service(first_dir.path());
    let again = init_prediction_service(first_dir.path());
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(first.model_dir(), Some(first_dir.path()));

    let conflicting = init_prediction_service(other_dir.path());
    assert!(Arc::ptr_eq(&first, &conflicting));
    assert_eq!(conflicting.model_dir(), Some(first_dir.path()));
    assert_eq!(conflicting.phase(), HandlePhase::Uninitialized);
}
