//! Ledger history, reconciliation and reports fed by real engine flows.

mod common;

use canteen_core::{CoreError, CustomerCategory, LedgerDirection, SaleLineRequest};
use chrono::Utc;
use common::{customer, money, shop};

#[tokio::test]
async fn history_is_newest_first_and_reconciles() {
    let s = shop().await;
    let engine = s.pos.sales();

    let sale = engine
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 1)])
        .await
        .unwrap();
    engine
        .adjust_balance(&s.alice.id, "admin", money("7.50"), LedgerDirection::Credit, "cash top-up")
        .await
        .unwrap();
    engine.cancel_sale(&sale.id, "till-1").await.unwrap();

    let history = s.pos.ledger().history_for(&s.alice.id).await.unwrap();
    let reasons: Vec<_> = history.iter().map(|e| e.reason.as_str()).collect();
    assert_eq!(
        reasons,
        vec![
            format!("Cancellation of sale {}", sale.id).as_str(),
            "cash top-up",
            format!("Sale {}", sale.id).as_str(),
        ]
    );
    assert_eq!(history[0].balance_after(), money("27.50"));

    let recon = s.pos.ledger().reconcile(&s.alice.id).await.unwrap();
    assert!(recon.balanced);
    assert_eq!(recon.initial, money("20.00"));
    assert_eq!(recon.credits, money("12.50"));
    assert_eq!(recon.debits, money("5.00"));
    assert_eq!(recon.expected, money("27.50"));
    assert_eq!(recon.actual, money("27.50"));
    assert_eq!(recon.entry_count, 3);
}

#[tokio::test]
async fn ledger_lookups_reject_unknown_ids() {
    let s = shop().await;

    let err = s.pos.ledger().history_for("nobody").await.unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::CustomerNotFound(_))));

    let err = s.pos.ledger().entries_for_sale("nothing").await.unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::SaleNotFound(_))));

    let err = s.pos.ledger().reconcile("nobody").await.unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::CustomerNotFound(_))));
}

#[tokio::test]
async fn reports_follow_the_day_of_trading() {
    let s = shop().await;
    let bob = customer(&s.pos, "bob", CustomerCategory::Staff, "0.00").await;
    let engine = s.pos.sales();

    engine
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 2)])
        .await
        .unwrap();
    let bobs = engine
        .create_sale(
            &bob.id,
            "till-2",
            &[
                SaleLineRequest::new(&s.chips.id, 1),
                SaleLineRequest::new(&s.soda.id, 1),
            ],
        )
        .await
        .unwrap();
    let doomed = engine
        .create_sale(&bob.id, "till-2", &[SaleLineRequest::new(&s.chips.id, 8)])
        .await
        .unwrap();
    engine.cancel_sale(&doomed.id, "till-2").await.unwrap();

    let today = Utc::now().date_naive();
    let reports = s.pos.reports();

    let daily = reports.daily_summary(today).await.unwrap();
    assert_eq!(daily.sale_count, 2);
    assert_eq!(daily.revenue_cents, 1000 + bobs.total_cents);
    assert_eq!(daily.average_ticket_cents, (1000 + 2000) / 2);
    assert_eq!(daily.top_products[0].product_name, "soda");
    assert_eq!(daily.top_products[0].quantity_sold, 3);

    let negative = reports.negative_balance_customers().await.unwrap();
    assert_eq!(negative.len(), 1);
    assert_eq!(negative[0].id, bob.id);
    assert_eq!(negative[0].balance(), money("-20.00"));

    let chart = reports.sales_chart(today, 3).await.unwrap();
    assert_eq!(chart.len(), 3);
    assert_eq!(chart[2].date, today);
    assert_eq!(chart[2].sale_count, 2);
    assert_eq!(chart[0].sale_count, 0);

    let summary = reports
        .customer_sales_summary(&bob.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.sale_count, 1);
    assert_eq!(summary.total_spent_cents, 2000);
    assert_eq!(summary.balance_cents, -2000);

    let financial = reports.financial_summary(today).await.unwrap();
    assert_eq!(financial.cancelled_sale_count, 1);
    assert_eq!(financial.today_revenue_cents, 3000);

    // the cancelled 8 chips count neither as sold nor as missing stock
    let chips = reports.product_sales_stats(&s.chips.id).await.unwrap().unwrap();
    assert_eq!(chips.line_count, 1);
    assert_eq!(chips.quantity_sold, 1);
    assert_eq!(chips.revenue_cents, 1500);
    assert_eq!(chips.stock, 9);

    let catalog = reports.catalog_summary().await.unwrap();
    assert_eq!(catalog.total_products, 2);
    assert_eq!(catalog.inactive_products, 0);
    assert_eq!(catalog.low_stock_products, 2);
    assert_eq!(catalog.stock_value(), money("170.00"));
}

#[tokio::test]
async fn low_stock_reflects_sales_and_restocks() {
    let s = shop().await;
    let bob = customer(&s.pos, "bob", CustomerCategory::Staff, "0.00").await;

    // default reorder threshold is 10, so both start as low stock
    let low = s.pos.catalog().low_stock_products().await.unwrap();
    assert_eq!(low.len(), 2);

    s.pos.sales().restock_product(&s.soda.id, "admin", 20).await.unwrap();
    let low = s.pos.catalog().low_stock_products().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, s.chips.id);

    s.pos
        .sales()
        .create_sale(&bob.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 25)])
        .await
        .unwrap();
    let low = s.pos.catalog().low_stock_products().await.unwrap();
    assert_eq!(low.len(), 2);
    assert_eq!(low[0].id, s.soda.id);
    assert_eq!(low[0].stock, 5);
}
