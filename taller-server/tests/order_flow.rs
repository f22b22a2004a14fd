//! End-to-end order flow against a file-backed database.
//!
//! The in-memory pool serializes on a single connection, so the
//! concurrency scenarios here run on a real WAL database file where two
//! transactions can actually collide.

use sqlx::SqlitePool;

use shared::models::{OrderCreate, OrderStatus, PaymentCreate, PaymentMethod};
use taller_server::db::DbService;
use taller_server::db::repository::{client, order, payment, service};
use taller_server::{journal, orders, reports};

async fn file_pool(dir: &tempfile::TempDir) -> SqlitePool {
    let path = dir.path().join("taller.db");
    DbService::new(&path.to_string_lossy())
        .await
        .expect("file db")
        .pool
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
    let (c, _) = client::get_or_create_by_phone(pool, "Carla Rojas", phone)
        .await
        .expect("client");
    orders::create_order_with_service_resolution(
        pool,
        OrderCreate {
            client_id: c.id,
            service_id: None,
            service_name: Some("Reparación de Motor".to_string()),
            start_date: "2025-03-01".to_string(),
            expected_end_date: "2025-03-15".to_string(),
            details: "Nissan Sentra".to_string(),
            quantity: Some(1),
            total,
            deposit,
        },
    )
    .await
    .expect("order")
}

#[tokio::test]
async fn test_concurrent_payments_both_apply() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir).await;
    let seeded = seed_order(&pool, "71000001", 200.0, 0.0).await;

    // Two sessions race on the same order; the store transaction
    // serializes them and neither increment is lost
    let pool_a = pool.clone();
    let pool_b = pool.clone();
    let order_id = seeded.id;
    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            orders::register_payment(&pool_a, order_id, pay(100.0, PaymentMethod::Efectivo)).await
        }),
        tokio::spawn(async move {
            orders::register_payment(&pool_b, order_id, pay(100.0, PaymentMethod::Qr)).await
        }),
    );
    a.expect("join").expect("payment a");
    b.expect("join").expect("payment b");

    let final_order = order::find_by_id(&pool, order_id)
        .await
        .expect("query")
        .expect("order");
    assert_eq!(final_order.deposit, 200.0);
    assert_eq!(final_order.balance, 0.0);
    assert_eq!(final_order.status, OrderStatus::Completado);

    let ledger = payment::find_by_order(&pool, order_id).await.expect("ledger");
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn test_concurrent_service_resolution_single_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir).await;

    let mut handles = Vec::new();
    for raw in ["Alineación", "alineacion", "ALINEACIÓN", "  Alineacion "] {
        let p = pool.clone();
        handles.push(tokio::spawn(async move {
            service::get_or_create_by_name(&p, raw, Some(60.0)).await
        }));
    }
    let mut ids = Vec::new();
    for h in handles {
        let (svc, _) = h.await.expect("join").expect("resolve");
        ids.push(svc.id);
    }
    ids.dedup();
    assert_eq!(ids.iter().collect::<std::collections::HashSet<_>>().len(), 1);

    let all = service::find_all(&pool).await.expect("list");
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_back_office_day_flow() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir).await;
    let tz = chrono_tz::America::La_Paz;

    let seeded = seed_order(&pool, "71000002", 800.0, 300.0).await;
    orders::register_payment(&pool, seeded.id, pay(200.0, PaymentMethod::Transferencia))
        .await
        .expect("payment");

    // Manual cash movements for the same day
    let today = chrono::Utc::now()
        .with_timezone(&tz)
        .date_naive()
        .format("%Y-%m-%d")
        .to_string();
    taller_server::db::repository::journal::create(
        &pool,
        shared::models::JournalEntryCreate {
            entry_type: shared::models::JournalType::Ingreso,
            amount: 50.0,
            concept: "Venta de repuestos".to_string(),
            date: today.clone(),
            notes: None,
        },
    )
    .await
    .expect("ingreso");
    taller_server::db::repository::journal::create(
        &pool,
        shared::models::JournalEntryCreate {
            entry_type: shared::models::JournalType::Egreso,
            amount: 120.0,
            concept: "Compra de aceite".to_string(),
            date: today.clone(),
            notes: None,
        },
    )
    .await
    .expect("egreso");

    // The day reconciles payment income (300 + 200) + manual lines
    let summary = journal::day_summary(&pool, &today, tz).await.expect("summary");
    assert_eq!(summary.ingresos.len(), 3);
    assert_eq!(summary.egresos.len(), 1);
    assert_eq!(summary.totals.ingresos, 550.0);
    assert_eq!(summary.totals.egresos, 120.0);
    assert_eq!(summary.totals.neto, 430.0);

    let closure = journal::close_day(&pool, &today, tz).await.expect("close");
    assert_eq!(closure.totals.neto, 430.0);

    // Reports over the same range agree with the journal
    let report = reports::summary(&pool, &today, &today, tz).await.expect("report");
    assert_eq!(report.payments_total, 500.0);
    assert_eq!(report.payments_by_method.len(), 2);
    assert_eq!(report.journal.neto, -70.0); // manual only: 50 - 120
    assert_eq!(report.income_by_day.len(), 1);
    assert_eq!(report.income_by_day[0].amount, 500.0);

    let csv = reports::export_ledger_csv(&pool, &today, &today, tz)
        .await
        .expect("csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("date,kind,concept,method,amount,order_id,reference_id")
    );
    // 2 payments + 2 manual entries
    assert_eq!(lines.count(), 4);
    assert!(csv.contains("Compra de aceite"));
    assert!(csv.contains("Abono inicial"));
}
