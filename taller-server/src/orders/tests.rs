use sqlx::SqlitePool;

use super::*;
use crate::db::DbService;
use crate::db::repository::{
    client as client_repo, journal_day as journal_day_repo, order as order_repo,
    payment as payment_repo, service as service_repo,
};
use shared::models::{OrderCreate, OrderStatus, OrderUpdate, PaymentCreate, PaymentMethod};

async fn test_pool() -> SqlitePool {
    DbService::new_in_memory().await.expect("in-memory db").pool
}

fn pay(amount: f64, method: PaymentMethod) -> PaymentCreate {
    PaymentCreate {
        amount,
        payment_method: method,
        notes: None,
        date: None,
    }
}

async fn seed_order(pool: &SqlitePool, phone: &str, total: f64, deposit: f64) -> shared::models::Order {
    let (client, _) = client_repo::get_or_create_by_phone(pool, "Juan Pérez", phone)
        .await
        .expect("client");
    create_order_with_service_resolution(
        pool,
        OrderCreate {
            client_id: client.id,
            service_id: None,
            service_name: Some("Cambio de Aceite".to_string()),
            start_date: "2025-03-01".to_string(),
            expected_end_date: "2025-03-05".to_string(),
            details: "Toyota Corolla".to_string(),
            quantity: Some(1),
            total,
            deposit,
        },
    )
    .await
    .expect("order")
}

async fn reload(pool: &SqlitePool, id: i64) -> shared::models::Order {
    order_repo::find_by_id(pool, id).await.expect("query").expect("order exists")
}

fn assert_invariant(order: &shared::models::Order) {
    assert!(order.total >= 0.0);
    assert!(order.deposit >= 0.0);
    assert!(order.deposit <= order.total);
    // Stored values are Decimal-rounded; the f64 recomputation may be a
    // few ulps off
    let expected = (order.total - order.deposit).max(0.0);
    assert!(
        (order.balance - expected).abs() < 1e-9,
        "balance {} != max(0, total - deposit) {}",
        order.balance,
        expected
    );
    if order.balance == 0.0 {
        assert_eq!(order.status, OrderStatus::Completado);
    } else {
        assert_ne!(order.status, OrderStatus::Completado);
    }
}

#[tokio::test]
async fn test_full_payment_completes_order() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000001", 500.0, 0.0).await;
    assert_eq!(order.deposit, 0.0);
    assert_eq!(order.balance, 500.0);
    assert_eq!(order.status, OrderStatus::Pendiente);

    let payment = register_payment(&pool, order.id, pay(500.0, PaymentMethod::Efectivo))
        .await
        .expect("payment");
    assert_eq!(payment.amount, 500.0);

    let order = reload(&pool, order.id).await;
    assert_eq!(order.deposit, 500.0);
    assert_eq!(order.balance, 0.0);
    assert_eq!(order.status, OrderStatus::Completado);

    let ledger = payment_repo::find_by_order(&pool, order.id).await.expect("ledger");
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].amount, 500.0);
}

#[tokio::test]
async fn test_partial_payment_stays_pendiente() {
    // Initial deposit of 100 becomes a real payment at creation
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000002", 300.0, 100.0).await;
    assert_eq!(order.deposit, 100.0);
    assert_eq!(order.balance, 200.0);

    register_payment(&pool, order.id, pay(50.0, PaymentMethod::Qr))
        .await
        .expect("payment");

    let order = reload(&pool, order.id).await;
    assert_eq!(order.deposit, 150.0);
    assert_eq!(order.balance, 150.0);
    assert_eq!(order.status, OrderStatus::Pendiente);

    let ledger = payment_repo::find_by_order(&pool, order.id).await.expect("ledger");
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn test_exact_balance_drives_zero_not_negative() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000003", 200.0, 0.0).await;

    register_payment(&pool, order.id, pay(120.0, PaymentMethod::Transferencia))
        .await
        .expect("first");
    let mid = reload(&pool, order.id).await;
    assert_eq!(mid.balance, 80.0);

    // Exactly the outstanding balance
    register_payment(&pool, order.id, pay(80.0, PaymentMethod::Efectivo))
        .await
        .expect("second");
    let done = reload(&pool, order.id).await;
    assert_eq!(done.balance, 0.0);
    assert_eq!(done.deposit, 200.0);
    assert_eq!(done.status, OrderStatus::Completado);
}

#[tokio::test]
async fn test_overpayment_rejected_without_side_effects() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000004", 100.0, 0.0).await;

    let err = register_payment(&pool, order.id, pay(150.0, PaymentMethod::Efectivo))
        .await
        .expect_err("should reject");
    assert!(matches!(err, AppError::Validation(_)));

    let order = reload(&pool, order.id).await;
    assert_eq!(order.deposit, 0.0);
    assert!(payment_repo::find_by_order(&pool, order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_positive_amounts_rejected() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000005", 100.0, 0.0).await;

    for amount in [0.0, -5.0, f64::NAN] {
        let err = register_payment(&pool, order.id, pay(amount, PaymentMethod::Qr))
            .await
            .expect_err("should reject");
        assert!(matches!(err, AppError::Validation(_)));
    }
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let pool = test_pool().await;
    let err = register_payment(&pool, 424242, pay(10.0, PaymentMethod::Efectivo))
        .await
        .expect_err("should fail");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_invariant_holds_across_payment_sequences() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000006", 1000.0, 0.0).await;

    for amount in [100.5, 99.5, 0.01, 423.99, 376.0] {
        register_payment(&pool, order.id, pay(amount, PaymentMethod::Efectivo))
            .await
            .expect("payment");
        let current = reload(&pool, order.id).await;
        assert_invariant(&current);
    }

    let done = reload(&pool, order.id).await;
    assert_eq!(done.deposit, 1000.0);
    assert_eq!(done.balance, 0.0);
    assert_eq!(done.status, OrderStatus::Completado);
}

#[tokio::test]
async fn test_cancelled_order_refuses_payment() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000007", 200.0, 0.0).await;

    order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            start_date: None,
            expected_end_date: None,
            details: None,
            quantity: None,
            total: None,
            status: Some(OrderStatus::Cancelado),
        },
    )
    .await
    .expect("cancel");

    let err = register_payment(&pool, order.id, pay(50.0, PaymentMethod::Efectivo))
        .await
        .expect_err("should refuse");
    assert!(matches!(err, AppError::BusinessRule(_)));

    let order = reload(&pool, order.id).await;
    assert_eq!(order.status, OrderStatus::Cancelado);
    assert!(payment_repo::find_by_order(&pool, order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recalc_is_idempotent() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000008", 500.0, 100.0).await;
    register_payment(&pool, order.id, pay(150.0, PaymentMethod::Qr))
        .await
        .expect("payment");

    let first = recalc_order_from_payments(&pool, order.id).await.expect("recalc");
    assert_eq!(first.deposit, 250.0);
    assert_eq!(first.balance, 250.0);
    assert_eq!(first.status, OrderStatus::Pendiente);

    // No new payments in between: second run changes nothing
    let second = recalc_order_from_payments(&pool, order.id).await.expect("recalc");
    assert_eq!(second.deposit, first.deposit);
    assert_eq!(second.balance, first.balance);
    assert_eq!(second.status, first.status);
}

#[tokio::test]
async fn test_detached_payment_then_recalc() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000009", 400.0, 0.0).await;

    // Bypass: ledger grows, order stays stale
    register_payment_only(&pool, order.id, pay(250.0, PaymentMethod::Transferencia))
        .await
        .expect("detached");
    let stale = reload(&pool, order.id).await;
    assert_eq!(stale.deposit, 0.0);
    assert_eq!(stale.balance, 400.0);

    let repaired = recalc_order_from_payments(&pool, order.id).await.expect("recalc");
    assert_eq!(repaired.deposit, 250.0);
    assert_eq!(repaired.balance, 150.0);
    assert_eq!(repaired.status, OrderStatus::Pendiente);
}

#[tokio::test]
async fn test_forced_order_update_failure_leaves_no_payment() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000010", 500.0, 0.0).await;

    // Simulated store failure on the order-update step of the protocol
    sqlx::query(
        "CREATE TRIGGER fail_order_update BEFORE UPDATE ON orders BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
    )
    .execute(&pool)
    .await
    .expect("trigger");

    let result = register_payment(&pool, order.id, pay(100.0, PaymentMethod::Efectivo)).await;
    assert!(result.is_err());

    sqlx::query("DROP TRIGGER fail_order_update")
        .execute(&pool)
        .await
        .expect("drop trigger");

    // Neither the payment insert nor the order update survived
    assert!(payment_repo::find_by_order(&pool, order.id).await.unwrap().is_empty());
    let order = reload(&pool, order.id).await;
    assert_eq!(order.deposit, 0.0);
    assert_eq!(order.balance, 500.0);
    assert_eq!(order.status, OrderStatus::Pendiente);
}

#[tokio::test]
async fn test_service_resolver_dedup_across_case_and_accents() {
    let pool = test_pool().await;

    let (first, created) =
        service_repo::get_or_create_by_name(&pool, "Cambio de Aceite", Some(80.0))
            .await
            .expect("resolve");
    assert!(created);

    let (second, created) = service_repo::get_or_create_by_name(&pool, "cambio de aceite", None)
        .await
        .expect("resolve");
    assert!(!created);
    assert_eq!(first.id, second.id);

    let (third, created) = service_repo::get_or_create_by_name(&pool, "  CAMBIÓ DE ACEITE ", None)
        .await
        .expect("resolve");
    assert!(!created);
    assert_eq!(first.id, third.id);
}

#[tokio::test]
async fn test_client_resolver_dedup_by_phone() {
    let pool = test_pool().await;

    let (first, created) = client_repo::get_or_create_by_phone(&pool, "Ana", "70123456")
        .await
        .expect("resolve");
    assert!(created);

    let (second, created) = client_repo::get_or_create_by_phone(&pool, "Ana María", "70123456")
        .await
        .expect("resolve");
    assert!(!created);
    assert_eq!(first.id, second.id);
    // Existing match returned untouched
    assert_eq!(second.name, "Ana");
}

#[tokio::test]
async fn test_order_deletion_removes_ledger() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000011", 300.0, 100.0).await;
    register_payment(&pool, order.id, pay(50.0, PaymentMethod::Efectivo))
        .await
        .expect("payment");
    assert_eq!(payment_repo::find_by_order(&pool, order.id).await.unwrap().len(), 2);

    assert!(order_repo::delete(&pool, order.id).await.expect("delete"));

    assert!(order_repo::find_by_id(&pool, order.id).await.unwrap().is_none());
    assert!(payment_repo::find_by_order(&pool, order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_order_validations() {
    let pool = test_pool().await;
    let (client, _) = client_repo::get_or_create_by_phone(&pool, "Luis", "70000012")
        .await
        .expect("client");

    let base = OrderCreate {
        client_id: client.id,
        service_id: None,
        service_name: Some("Pintura".to_string()),
        start_date: "2025-03-01".to_string(),
        expected_end_date: "2025-03-10".to_string(),
        details: String::new(),
        quantity: Some(1),
        total: 100.0,
        deposit: 0.0,
    };

    // deposit > total
    let err = create_order_with_service_resolution(
        &pool,
        OrderCreate {
            deposit: 150.0,
            ..base.clone()
        },
    )
    .await
    .expect_err("deposit over total");
    assert!(matches!(err, AppError::Validation(_)));

    // quantity < 1
    let err = create_order_with_service_resolution(
        &pool,
        OrderCreate {
            quantity: Some(0),
            ..base.clone()
        },
    )
    .await
    .expect_err("zero quantity");
    assert!(matches!(err, AppError::Validation(_)));

    // neither serviceId nor serviceName
    let err = create_order_with_service_resolution(
        &pool,
        OrderCreate {
            service_name: None,
            ..base.clone()
        },
    )
    .await
    .expect_err("no service reference");
    assert!(matches!(err, AppError::Validation(_)));

    // unknown client
    let err = create_order_with_service_resolution(
        &pool,
        OrderCreate {
            client_id: 999_999,
            ..base
        },
    )
    .await
    .expect_err("unknown client");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_deposit_equal_to_total_completes_at_creation() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000013", 250.0, 250.0).await;
    assert_eq!(order.deposit, 250.0);
    assert_eq!(order.balance, 0.0);
    assert_eq!(order.status, OrderStatus::Completado);

    let ledger = payment_repo::find_by_order(&pool, order.id).await.expect("ledger");
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].notes.as_deref(), Some("Abono inicial"));
}

#[tokio::test]
async fn test_manual_status_rules() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000014", 200.0, 0.0).await;
    let no_edit = OrderUpdate {
        start_date: None,
        expected_end_date: None,
        details: None,
        quantity: None,
        total: None,
        status: None,
    };

    // Completado by hand while money is owed: refused
    let err = order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            status: Some(OrderStatus::Completado),
            ..no_edit.clone()
        },
    )
    .await
    .expect_err("manual completado");
    assert!(matches!(err, crate::db::repository::RepoError::Validation(_)));

    // Pay in full, then try to force it back to pendiente
    register_payment(&pool, order.id, pay(200.0, PaymentMethod::Efectivo))
        .await
        .expect("payment");
    let err = order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            status: Some(OrderStatus::Pendiente),
            ..no_edit
        },
    )
    .await
    .expect_err("paid order back to pendiente");
    assert!(matches!(err, crate::db::repository::RepoError::Validation(_)));
}

#[tokio::test]
async fn test_total_edit_recomputes_balance_holding_deposit() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000015", 500.0, 200.0).await;
    let no_edit = OrderUpdate {
        start_date: None,
        expected_end_date: None,
        details: None,
        quantity: None,
        total: None,
        status: None,
    };

    let updated = order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            total: Some(300.0),
            ..no_edit.clone()
        },
    )
    .await
    .expect("lower total");
    assert_eq!(updated.deposit, 200.0);
    assert_eq!(updated.balance, 100.0);
    assert_eq!(updated.status, OrderStatus::Pendiente);

    // Dropping the total to exactly the deposit completes the order
    let updated = order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            total: Some(200.0),
            ..no_edit.clone()
        },
    )
    .await
    .expect("total equals deposit");
    assert_eq!(updated.balance, 0.0);
    assert_eq!(updated.status, OrderStatus::Completado);

    // Below the recorded deposit: refused
    let err = order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            total: Some(150.0),
            ..no_edit
        },
    )
    .await
    .expect_err("total below deposit");
    assert!(matches!(err, crate::db::repository::RepoError::Validation(_)));
}

#[tokio::test]
async fn test_cancellation_survives_unrelated_edits() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000016", 300.0, 100.0).await;

    order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            start_date: None,
            expected_end_date: None,
            details: None,
            quantity: None,
            total: None,
            status: Some(OrderStatus::Cancelado),
        },
    )
    .await
    .expect("cancel");

    let updated = order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            start_date: None,
            expected_end_date: None,
            details: Some("Cliente no volvió".to_string()),
            quantity: None,
            total: None,
            status: None,
        },
    )
    .await
    .expect("edit details");
    assert_eq!(updated.status, OrderStatus::Cancelado);
}

#[tokio::test]
async fn test_quantity_null_defaults_to_one_at_read() {
    let pool = test_pool().await;
    let order = seed_order(&pool, "70000017", 100.0, 0.0).await;

    // Simulate a legacy document missing the field
    sqlx::query("UPDATE orders SET quantity = NULL WHERE id = ?")
        .bind(order.id)
        .execute(&pool)
        .await
        .expect("null quantity");

    let reloaded = reload(&pool, order.id).await;
    assert_eq!(reloaded.quantity, 1);
}

#[tokio::test]
async fn test_closed_day_rejects_second_closure() {
    let pool = test_pool().await;
    let tz = chrono_tz::America::La_Paz;
    let order = seed_order(&pool, "70000018", 300.0, 0.0).await;
    register_payment(&pool, order.id, pay(100.0, PaymentMethod::Efectivo))
        .await
        .expect("payment");

    let today = chrono::Utc::now().with_timezone(&tz).date_naive().format("%Y-%m-%d").to_string();
    let closure = crate::journal::close_day(&pool, &today, tz).await.expect("close");
    assert_eq!(closure.totals.ingresos, 100.0);

    let err = crate::journal::close_day(&pool, &today, tz).await.expect_err("second close");
    assert!(matches!(err, AppError::Conflict(_)));

    // Archived closure reads back intact
    let stored = journal_day_repo::find_by_date(&pool, &today).await.expect("query").expect("stored");
    assert_eq!(stored.ingresos.len(), 1);
    assert_eq!(stored.totals.neto, 100.0);
}
