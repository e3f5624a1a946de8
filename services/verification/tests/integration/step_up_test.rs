use chrono::Duration;
use uuid::Uuid;

use welfare_domain::id::UserId;
use welfare_testing::clock::ManualClock;
use welfare_verification::domain::types::CodePayload;
use welfare_verification::error::VerificationServiceError;
use welfare_verification::usecase::step_up::{
    ConfirmStepUpInput, ConfirmStepUpUseCase, GatedActionUseCase,
};

use crate::helpers::{MockAccountRepo, code_store, step_up_gate, ttl};

fn user() -> UserId {
    UserId(Uuid::new_v4())
}

#[tokio::test]
async fn should_open_gate_for_exactly_one_consume() {
    let clock = ManualClock::default();
    let gate = step_up_gate(&clock);
    let user_id = user();

    gate.set_verified(user_id).await;

    assert!(gate.consume_if_verified(user_id).await);
    assert!(!gate.consume_if_verified(user_id).await);
}

#[tokio::test]
async fn should_stay_closed_without_verification() {
    let clock = ManualClock::default();
    let gate = step_up_gate(&clock);

    assert!(!gate.consume_if_verified(user()).await);
}

#[tokio::test]
async fn should_keep_gates_per_user() {
    let clock = ManualClock::default();
    let gate = step_up_gate(&clock);
    let (alice, bob) = (user(), user());

    gate.set_verified(alice).await;

    assert!(!gate.consume_if_verified(bob).await);
    assert!(gate.consume_if_verified(alice).await);
}

#[tokio::test]
async fn should_close_gate_after_expiry() {
    let clock = ManualClock::default();
    let gate = step_up_gate(&clock);
    let user_id = user();

    gate.set_verified(user_id).await;
    clock.advance(ttl() + Duration::milliseconds(1));

    assert!(!gate.consume_if_verified(user_id).await);
    assert_eq!(gate.sweep().await, 1);
}

#[tokio::test]
async fn should_restart_expiry_when_set_again() {
    let clock = ManualClock::default();
    let gate = step_up_gate(&clock);
    let user_id = user();

    gate.set_verified(user_id).await;
    clock.advance(Duration::minutes(4));
    gate.set_verified(user_id).await;
    clock.advance(Duration::minutes(4));

    assert!(gate.consume_if_verified(user_id).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_let_one_of_many_concurrent_consumers_through() {
    let clock = ManualClock::default();
    let gate = step_up_gate(&clock);
    let user_id = user();
    gate.set_verified(user_id).await;

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let gate = gate.clone();
        tasks.push(tokio::spawn(
            async move { gate.consume_if_verified(user_id).await },
        ));
    }

    let mut opened = 0;
    for task in tasks {
        if task.await.unwrap() {
            opened += 1;
        }
    }
    assert_eq!(opened, 1);
}

#[tokio::test]
async fn should_open_gate_with_step_up_code() {
    let clock = ManualClock::default();
    let codes = code_store(&clock, MockAccountRepo::empty());
    let gate = step_up_gate(&clock);
    let user_id = user();

    let issued = codes
        .generate_code(CodePayload::StepUpConfirmation { user_id }, "a@example.com")
        .await;

    let confirm = ConfirmStepUpUseCase {
        codes: codes.clone(),
        gate: gate.clone(),
    };
    let confirmed = confirm
        .execute(ConfirmStepUpInput {
            code: issued.code,
            email: "a@example.com".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(confirmed, user_id);

    let gated = GatedActionUseCase { gate };
    assert!(gated.execute(user_id).await.is_ok());
    assert!(matches!(
        gated.execute(user_id).await,
        Err(VerificationServiceError::StepUpRequired)
    ));
}

#[tokio::test]
async fn should_not_open_gate_with_activation_code() {
    let clock = ManualClock::default();
    let codes = code_store(&clock, MockAccountRepo::empty());
    let gate = step_up_gate(&clock);
    let user_id = user();

    let issued = codes
        .generate_code(CodePayload::AccountActivation { user_id }, "a@example.com")
        .await;

    let confirm = ConfirmStepUpUseCase {
        codes: codes.clone(),
        gate: gate.clone(),
    };
    let result = confirm
        .execute(ConfirmStepUpInput {
            code: issued.code.clone(),
            email: "a@example.com".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(VerificationServiceError::InvalidCode)));
    assert!(!gate.consume_if_verified(user_id).await);
    assert!(
        codes
            .verify_code(&issued.code, "a@example.com")
            .await
            .is_some(),
        "activation code survives the rejected confirm"
    );
}

#[tokio::test]
async fn should_reject_expired_step_up_code() {
    let clock = ManualClock::default();
    let codes = code_store(&clock, MockAccountRepo::empty());
    let gate = step_up_gate(&clock);
    let user_id = user();

    let issued = codes
        .generate_code(CodePayload::StepUpConfirmation { user_id }, "a@example.com")
        .await;
    clock.advance(ttl() + Duration::seconds(1));

    let confirm = ConfirmStepUpUseCase {
        codes,
        gate: gate.clone(),
    };
    let result = confirm
        .execute(ConfirmStepUpInput {
            code: issued.code,
            email: "a@example.com".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(VerificationServiceError::InvalidCode)));
    assert!(!gate.consume_if_verified(user_id).await);
}
