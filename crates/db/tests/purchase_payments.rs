//! Integration tests for package purchases, payments and appointments.
//!
//! Exercises the repository layer against a real database:
//! - Purchase creation serializes JSON list fields
//! - Split payments insert one row per method and bump `paid_amount`
//! - A payment validated against a stale balance writes nothing
//! - Bookings against a package never outnumber its unused sessions
//! - Completing an appointment counts a used session, up to the package size
//! - Conflict counting only sees overlapping, non-cancelled bookings

use babyspa_core::installments::{get_installments_detail, InstallmentStatus, PaymentPlan};
use babyspa_core::payments::{PaymentMethod, PaymentSplit};
use babyspa_core::schedule_preference::{parse_schedule_preferences, SchedulePreference};
use babyspa_core::slot_generator::GeneratedSlot;
use babyspa_db::models::appointment::{Completion, CreateAppointment};
use babyspa_db::models::package_purchase::CreatePackagePurchase;
use babyspa_db::models::payment::{Payment, RegisterPayment};
use babyspa_db::repositories::{AppointmentRepo, PackagePurchaseRepo, PaymentRepo};
use chrono::NaiveDate;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn installment_purchase() -> CreatePackagePurchase {
    CreatePackagePurchase {
        client_name: "Ana Rojas".to_string(),
        package_name: "Hidroterapia x9".to_string(),
        total_sessions: 9,
        total_price: 300.0,
        final_price: None,
        payment_plan: Some(PaymentPlan::Installments),
        installments: Some(3),
        installment_amount: Some(100.0),
        installments_pay_on_sessions: Some(vec![1, 4, 7]),
        schedule_preferences: Some(vec![SchedulePreference::new(1, "09:00")]),
    }
}

fn cash_payment(installment_number: u32, amount: f64) -> RegisterPayment {
    RegisterPayment {
        installment_number: Some(installment_number),
        amount: Some(amount),
        splits: vec![PaymentSplit {
            method: PaymentMethod::Cash,
            amount,
        }],
        notes: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn slot(day: NaiveDate, start: &str, end: &str) -> GeneratedSlot {
    GeneratedSlot {
        date: day,
        start_time: start.to_string(),
        end_time: end.to_string(),
        day_of_week: 1,
        preference_index: 0,
        has_conflict: false,
        conflict_count: 0,
    }
}

fn booking(purchase_id: Option<i64>, day: NaiveDate, start: &str) -> CreateAppointment {
    CreateAppointment {
        package_purchase_id: purchase_id,
        date: day,
        start_time: start.to_string(),
        duration_minutes: 60,
    }
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_purchase_stores_json_lists(pool: PgPool) {
    let purchase = PackagePurchaseRepo::create(&pool, &installment_purchase())
        .await
        .unwrap();

    assert_eq!(purchase.payment_plan, "installments");
    assert_eq!(purchase.installments, 3);
    assert_eq!(purchase.paid_amount, 0.0);
    assert_eq!(purchase.installments_pay_on_sessions.as_deref(), Some("[1,4,7]"));
    assert_eq!(
        parse_schedule_preferences(purchase.schedule_preferences.as_deref().unwrap()),
        vec![SchedulePreference::new(1, "09:00")]
    );

    let terms = purchase.terms();
    assert_eq!(terms.installment_count(), 3);
    assert_eq!(terms.pay_on_sessions(), vec![1, 4, 7]);

    let found = PackagePurchaseRepo::find_by_id(&pool, purchase.id)
        .await
        .unwrap()
        .expect("purchase should exist");
    assert_eq!(found.client_name, "Ana Rojas");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_single_plan_forces_one_installment(pool: PgPool) {
    let mut input = installment_purchase();
    input.payment_plan = None;
    input.installments = Some(4);
    let purchase = PackagePurchaseRepo::create(&pool, &input).await.unwrap();

    assert_eq!(purchase.payment_plan, "single");
    assert_eq!(purchase.installments, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_missing_purchase_returns_none(pool: PgPool) {
    assert!(PackagePurchaseRepo::find_by_id(&pool, 999_999)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_purchases_paginates(pool: PgPool) {
    for _ in 0..3 {
        PackagePurchaseRepo::create(&pool, &installment_purchase())
            .await
            .unwrap();
    }
    assert_eq!(PackagePurchaseRepo::list(&pool, 2, 0).await.unwrap().len(), 2);
    assert_eq!(PackagePurchaseRepo::list(&pool, 2, 2).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_split_payment_updates_paid_amount(pool: PgPool) {
    let purchase = PackagePurchaseRepo::create(&pool, &installment_purchase())
        .await
        .unwrap();

    let input = RegisterPayment {
        installment_number: Some(1),
        amount: Some(100.0),
        splits: vec![
            PaymentSplit {
                method: PaymentMethod::Cash,
                amount: 40.0,
            },
            PaymentSplit {
                method: PaymentMethod::Qr,
                amount: 60.0,
            },
        ],
        notes: Some("first installment".to_string()),
    };
    let rows = PaymentRepo::create_split(&pool, purchase.id, 1, 0.0, &input)
        .await
        .unwrap()
        .expect("balance unchanged, payment should be stored");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.installment_number == Some(1)));
    assert_eq!(rows[1].payment_method, "qr");

    let updated = PackagePurchaseRepo::find_by_id(&pool, purchase.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.paid_amount, 100.0);

    let payments = PaymentRepo::list_by_purchase(&pool, purchase.id)
        .await
        .unwrap();
    let as_installments: Vec<_> = payments.iter().map(Payment::as_installment_payment).collect();
    let details = get_installments_detail(&updated.terms(), &as_installments);
    assert_eq!(details[0].status, InstallmentStatus::Paid);
    assert_eq!(details[1].status, InstallmentStatus::Pending);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_payment_for_missing_purchase_writes_nothing(pool: PgPool) {
    let input = cash_payment(1, 100.0);
    let result = PaymentRepo::create_split(&pool, 424_242, 1, 0.0, &input)
        .await
        .unwrap();
    assert!(result.is_none());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_payment_against_stale_balance_is_rejected(pool: PgPool) {
    let purchase = PackagePurchaseRepo::create(&pool, &installment_purchase())
        .await
        .unwrap();
    let input = cash_payment(1, 100.0);

    // Both requests validated against the same untouched balance.
    let first = PaymentRepo::create_split(&pool, purchase.id, 1, purchase.paid_amount, &input)
        .await
        .unwrap();
    assert!(first.is_some());
    let second = PaymentRepo::create_split(&pool, purchase.id, 1, purchase.paid_amount, &input)
        .await
        .unwrap();
    assert!(second.is_none());

    let updated = PackagePurchaseRepo::find_by_id(&pool, purchase.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.paid_amount, 100.0);
    assert_eq!(
        PaymentRepo::list_by_purchase(&pool, purchase.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_completing_appointment_uses_a_session(pool: PgPool) {
    let purchase = PackagePurchaseRepo::create(&pool, &installment_purchase())
        .await
        .unwrap();
    let appointment =
        AppointmentRepo::create(&pool, &booking(Some(purchase.id), date(2024, 1, 1), "09:00"), "10:00")
            .await
            .unwrap();
    assert_eq!(appointment.status, "scheduled");

    let completed = match AppointmentRepo::mark_completed(&pool, appointment.id)
        .await
        .unwrap()
    {
        Completion::Completed(appointment) => appointment,
        other => panic!("scheduled appointment should complete, got {other:?}"),
    };
    assert_eq!(completed.status, "completed");

    let updated = PackagePurchaseRepo::find_by_id(&pool, purchase.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.used_sessions, 1);
    assert_eq!(updated.remaining_sessions(), 8);

    // Completing twice is a no-op.
    assert!(matches!(
        AppointmentRepo::mark_completed(&pool, appointment.id)
            .await
            .unwrap(),
        Completion::NotScheduled
    ));
    let again = PackagePurchaseRepo::find_by_id(&pool, purchase.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.used_sessions, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_package_bookings_stop_at_unused_sessions(pool: PgPool) {
    let mut input = installment_purchase();
    input.total_sessions = 1;
    input.installments = Some(1);
    input.installments_pay_on_sessions = Some(vec![1]);
    let purchase = PackagePurchaseRepo::create(&pool, &input).await.unwrap();

    let first = AppointmentRepo::create_within_package(
        &pool,
        purchase.id,
        &booking(Some(purchase.id), date(2024, 1, 8), "09:00"),
        "10:00",
    )
    .await
    .unwrap();
    assert!(first.is_some());

    let second = AppointmentRepo::create_within_package(
        &pool,
        purchase.id,
        &booking(Some(purchase.id), date(2024, 1, 15), "09:00"),
        "10:00",
    )
    .await
    .unwrap();
    assert!(second.is_none());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM appointments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_completion_never_exceeds_total_sessions(pool: PgPool) {
    let mut input = installment_purchase();
    input.total_sessions = 1;
    input.installments = Some(1);
    input.installments_pay_on_sessions = Some(vec![1]);
    let purchase = PackagePurchaseRepo::create(&pool, &input).await.unwrap();

    // Plain inserts skip the booking check, as legacy rows would.
    let first =
        AppointmentRepo::create(&pool, &booking(Some(purchase.id), date(2024, 1, 8), "09:00"), "10:00")
            .await
            .unwrap();
    let second =
        AppointmentRepo::create(&pool, &booking(Some(purchase.id), date(2024, 1, 15), "09:00"), "10:00")
            .await
            .unwrap();

    assert!(matches!(
        AppointmentRepo::mark_completed(&pool, first.id).await.unwrap(),
        Completion::Completed(_)
    ));
    assert!(matches!(
        AppointmentRepo::mark_completed(&pool, second.id).await.unwrap(),
        Completion::PackageExhausted
    ));

    let updated = PackagePurchaseRepo::find_by_id(&pool, purchase.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.used_sessions, 1);

    let untouched = AppointmentRepo::find_by_id(&pool, second.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, "scheduled");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_count_conflicts_sees_overlaps_only(pool: PgPool) {
    let monday = date(2024, 1, 8);
    AppointmentRepo::create(&pool, &booking(None, monday, "09:30"), "10:30")
        .await
        .unwrap();
    AppointmentRepo::create(&pool, &booking(None, monday, "09:00"), "10:00")
        .await
        .unwrap();
    let cancelled = AppointmentRepo::create(&pool, &booking(None, monday, "15:00"), "16:00")
        .await
        .unwrap();
    sqlx::query("UPDATE appointments SET status = 'cancelled' WHERE id = $1")
        .bind(cancelled.id)
        .execute(&pool)
        .await
        .unwrap();

    let slots = [
        slot(monday, "09:00", "10:00"),
        slot(monday, "10:30", "11:30"),
        slot(monday, "15:00", "16:00"),
        slot(date(2024, 1, 15), "09:00", "10:00"),
    ];
    let counts = AppointmentRepo::count_conflicts(&pool, &slots).await.unwrap();

    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].date, monday);
    assert_eq!(counts[0].start_time, "09:00");
    assert_eq!(counts[0].count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_count_conflicts_with_no_slots(pool: PgPool) {
    assert!(AppointmentRepo::count_conflicts(&pool, &[])
        .await
        .unwrap()
        .is_empty());
}
