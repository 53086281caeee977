//! End-to-end sale, cancellation and adjustment behaviour against an
//! in-memory store.

mod common;

use canteen_core::{
    CoreError, CustomerCategory, ErrorKind, LedgerDirection, ProductUpdate, Retirement,
    SaleFilter, SaleLineRequest, SaleStatus,
};
use canteen_engine::EngineError;
use common::{balance_of, customer, money, product, shop, stock_of};

#[tokio::test]
async fn alice_buys_two_sodas() {
    let s = shop().await;

    let sale = s
        .pos
        .sales()
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 2)])
        .await
        .unwrap();

    assert_eq!(sale.total(), money("10.00"));
    assert_eq!(sale.status, SaleStatus::Active);
    assert_eq!(sale.lines.len(), 1);
    assert_eq!(sale.lines[0].unit_price_cents, 500);
    assert_eq!(sale.lines[0].product_name, "soda");
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("10.00"));
    assert_eq!(stock_of(&s.pos, &s.soda.id).await, 8);

    let history = s.pos.ledger().history_for(&s.alice.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].direction, LedgerDirection::Debit);
    assert_eq!(history[0].amount(), money("10.00"));
    assert_eq!(history[0].sale_id.as_deref(), Some(sale.id.as_str()));
    assert_eq!(history[0].balance_after(), money("10.00"));

    let stored = s.pos.catalog().sale(&sale.id).await.unwrap();
    assert_eq!(stored.id, sale.id);
    assert_eq!(stored.total_cents, 1000);
    assert_eq!(stored.lines, sale.lines);
}

#[tokio::test]
async fn alice_cannot_afford_chips_afterwards() {
    let s = shop().await;
    s.pos
        .sales()
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 2)])
        .await
        .unwrap();

    let err = s
        .pos
        .sales()
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.chips.id, 1)])
        .await
        .unwrap_err();

    assert_eq!(
        err.rule(),
        Some(&CoreError::InsufficientBalance {
            available: money("10.00"),
            required: money("15.00"),
        })
    );
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("10.00"));
    assert_eq!(stock_of(&s.pos, &s.chips.id).await, 10);
    assert_eq!(s.pos.ledger().history_for(&s.alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failing_last_line_leaves_no_trace() {
    let s = shop().await;

    // 2 soda (10.00) fits, the chips line pushes the total to 25.00
    let err = s
        .pos
        .sales()
        .create_sale(
            &s.alice.id,
            "till-1",
            &[
                SaleLineRequest::new(&s.soda.id, 2),
                SaleLineRequest::new(&s.chips.id, 1),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err.rule(), Some(CoreError::InsufficientBalance { .. })));
    assert_eq!(stock_of(&s.pos, &s.soda.id).await, 10);
    assert_eq!(stock_of(&s.pos, &s.chips.id).await, 10);
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("20.00"));
    assert!(s.pos.ledger().history_for(&s.alice.id).await.unwrap().is_empty());
    assert!(s
        .pos
        .catalog()
        .sales(SaleFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cancellation_is_an_exact_inverse() {
    let s = shop().await;
    let bob = customer(&s.pos, "bob", CustomerCategory::Staff, "0.00").await;

    let sale = s
        .pos
        .sales()
        .create_sale(
            &bob.id,
            "till-1",
            &[
                SaleLineRequest::new(&s.soda.id, 3),
                SaleLineRequest::new(&s.chips.id, 1),
                SaleLineRequest::new(&s.soda.id, 1),
            ],
        )
        .await
        .unwrap();
    assert_eq!(sale.total(), money("35.00"));
    assert_eq!(stock_of(&s.pos, &s.soda.id).await, 6);
    assert_eq!(balance_of(&s.pos, &bob.id).await, money("-35.00"));

    let cancelled = s.pos.sales().cancel_sale(&sale.id, "manager").await.unwrap();
    assert_eq!(cancelled.status, SaleStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by.as_deref(), Some("manager"));
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(cancelled.lines.len(), 3);

    assert_eq!(stock_of(&s.pos, &s.soda.id).await, 10);
    assert_eq!(stock_of(&s.pos, &s.chips.id).await, 10);
    assert_eq!(balance_of(&s.pos, &bob.id).await, money("0.00"));

    let entries = s.pos.ledger().entries_for_sale(&sale.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].direction, LedgerDirection::Debit);
    assert_eq!(entries[1].direction, LedgerDirection::Credit);
    assert_eq!(entries[0].amount(), entries[1].amount());
    let net: i64 = entries.iter().map(|e| e.signed_amount().cents()).sum();
    assert_eq!(net, 0);
}

#[tokio::test]
async fn second_cancellation_is_rejected() {
    let s = shop().await;
    let sale = s
        .pos
        .sales()
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 2)])
        .await
        .unwrap();

    s.pos.sales().cancel_sale(&sale.id, "till-1").await.unwrap();
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("20.00"));
    assert_eq!(stock_of(&s.pos, &s.soda.id).await, 10);

    let err = s.pos.sales().cancel_sale(&sale.id, "till-1").await.unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::SaleAlreadyCancelled(id)) if *id == sale.id));
    assert_eq!(err.kind(), ErrorKind::Precondition);

    // still exactly one debit and one credit
    assert_eq!(s.pos.ledger().entries_for_sale(&sale.id).await.unwrap().len(), 2);
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("20.00"));
}

#[tokio::test]
async fn cancellation_works_after_deactivation() {
    let s = shop().await;
    let sale = s
        .pos
        .sales()
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 2)])
        .await
        .unwrap();

    assert_eq!(
        s.pos.catalog().retire_product(&s.soda.id).await.unwrap(),
        Retirement::Deactivated
    );
    assert_eq!(
        s.pos.catalog().retire_customer(&s.alice.id).await.unwrap(),
        Retirement::Deactivated
    );

    s.pos.sales().cancel_sale(&sale.id, "manager").await.unwrap();
    assert_eq!(stock_of(&s.pos, &s.soda.id).await, 10);
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("20.00"));
}

#[tokio::test]
async fn lookups_and_activity_are_checked_first() {
    let s = shop().await;
    let line = [SaleLineRequest::new(&s.soda.id, 1)];

    let err = s.pos.sales().create_sale("ghost", "till-1", &line).await.unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::CustomerNotFound(_))));
    assert_eq!(err.kind().http_status(), 404);

    let err = s
        .pos
        .sales()
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new("ghost", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::ProductNotFound(_))));

    s.pos
        .catalog()
        .update_product(
            &s.soda.id,
            ProductUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = s.pos.sales().create_sale(&s.alice.id, "till-1", &line).await.unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::ProductInactive(_))));
}

#[tokio::test]
async fn first_short_product_is_reported_with_summed_quantity() {
    let s = shop().await;
    let bob = customer(&s.pos, "bob", CustomerCategory::Staff, "0.00").await;
    let candy = product(&s.pos, "candy", "1.00", 1).await;

    let err = s
        .pos
        .sales()
        .create_sale(
            &bob.id,
            "till-1",
            &[
                SaleLineRequest::new(&s.soda.id, 6),
                SaleLineRequest::new(&candy.id, 2),
                SaleLineRequest::new(&s.soda.id, 6),
            ],
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.rule(),
        Some(&CoreError::InsufficientStock {
            product_id: s.soda.id.clone(),
            available: 10,
            requested: 12,
        })
    );
    assert_eq!(stock_of(&s.pos, &candy.id).await, 1);
}

#[tokio::test]
async fn explicit_unit_price_overrides_catalog() {
    let s = shop().await;

    let sale = s
        .pos
        .sales()
        .create_sale(
            &s.alice.id,
            "till-1",
            &[SaleLineRequest::new(&s.soda.id, 2).with_unit_price(money("4.25"))],
        )
        .await
        .unwrap();
    assert_eq!(sale.total(), money("8.50"));
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("11.50"));

    let err = s
        .pos
        .sales()
        .create_sale(
            &s.alice.id,
            "till-1",
            &[SaleLineRequest::new(&s.soda.id, 1).with_unit_price(money("0.00"))],
        )
        .await
        .unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::InvalidAmount { .. })));
}

#[tokio::test]
async fn staff_may_go_negative_standard_may_not() {
    let s = shop().await;
    let eva = customer(&s.pos, "eva", CustomerCategory::Staff, "5.00").await;

    s.pos
        .sales()
        .create_sale(&eva.id, "till-1", &[SaleLineRequest::new(&s.chips.id, 2)])
        .await
        .unwrap();
    assert_eq!(balance_of(&s.pos, &eva.id).await, money("-25.00"));

    let err = s
        .pos
        .sales()
        .adjust_balance(&s.alice.id, "admin", money("20.01"), LedgerDirection::Debit, "fee")
        .await
        .unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::InsufficientBalance { .. })));

    let entry = s
        .pos
        .sales()
        .adjust_balance(&eva.id, "admin", money("30.00"), LedgerDirection::Credit, "payday top-up")
        .await
        .unwrap();
    assert_eq!(entry.balance_after(), money("5.00"));
    assert_eq!(entry.reason, "payday top-up");
    assert!(entry.sale_id.is_none());
}

#[tokio::test]
async fn inactive_customers_cannot_buy_or_be_debited() {
    let s = shop().await;
    let bob = customer(&s.pos, "bob", CustomerCategory::Standard, "10.00").await;
    assert_eq!(
        s.pos.catalog().retire_customer(&bob.id).await.unwrap(),
        Retirement::Deleted
    );

    // alice has ledger history after an adjustment, so she is only deactivated
    s.pos
        .sales()
        .adjust_balance(&s.alice.id, "admin", money("1.00"), LedgerDirection::Credit, "gift")
        .await
        .unwrap();
    assert_eq!(
        s.pos.catalog().retire_customer(&s.alice.id).await.unwrap(),
        Retirement::Deactivated
    );

    let err = s
        .pos
        .sales()
        .adjust_balance(&s.alice.id, "admin", money("1.00"), LedgerDirection::Debit, "fee")
        .await
        .unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::CustomerInactive(_))));

    let err = s
        .pos
        .sales()
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err.rule(), Some(CoreError::CustomerInactive(_))));
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("21.00"));
}

#[tokio::test]
async fn retired_staff_debt_can_still_be_settled() {
    let s = shop().await;
    let farid = customer(&s.pos, "farid", CustomerCategory::Staff, "0.00").await;

    s.pos
        .sales()
        .adjust_balance(&farid.id, "admin", money("12.50"), LedgerDirection::Debit, "lunch tab")
        .await
        .unwrap();
    assert_eq!(
        s.pos.catalog().retire_customer(&farid.id).await.unwrap(),
        Retirement::Deactivated
    );

    let owing = s.pos.reports().negative_balance_customers().await.unwrap();
    assert_eq!(owing.len(), 1);
    assert_eq!(owing[0].id, farid.id);

    let entry = s
        .pos
        .sales()
        .adjust_balance(&farid.id, "admin", money("12.50"), LedgerDirection::Credit, "paid cash")
        .await
        .unwrap();
    assert_eq!(entry.balance_after(), money("0.00"));
    assert_eq!(entry.reason, "paid cash");

    assert_eq!(balance_of(&s.pos, &farid.id).await, money("0.00"));
    assert!(s.pos.reports().negative_balance_customers().await.unwrap().is_empty());
    assert!(s.pos.ledger().reconcile(&farid.id).await.unwrap().balanced);
}

#[tokio::test]
async fn blank_adjustment_reason_gets_a_default() {
    let s = shop().await;

    let credit = s
        .pos
        .sales()
        .adjust_balance(&s.alice.id, "admin", money("5.00"), LedgerDirection::Credit, "")
        .await
        .unwrap();
    assert_eq!(credit.reason, "Balance top-up");

    let debit = s
        .pos
        .sales()
        .adjust_balance(&s.alice.id, "admin", money("2.00"), LedgerDirection::Debit, "   ")
        .await
        .unwrap();
    assert_eq!(debit.reason, "Manual debit");

    let trimmed = s
        .pos
        .sales()
        .adjust_balance(&s.alice.id, "admin", money("1.00"), LedgerDirection::Credit, "  refund ")
        .await
        .unwrap();
    assert_eq!(trimmed.reason, "refund");
    assert_eq!(balance_of(&s.pos, &s.alice.id).await, money("24.00"));
}

#[tokio::test]
async fn large_sales_are_not_capped_by_default() {
    let s = shop().await;
    let cook = customer(&s.pos, "cook", CustomerCategory::Staff, "0.00").await;
    let water = product(&s.pos, "water", "1.00", 5000).await;

    let sale = s
        .pos
        .sales()
        .create_sale(&cook.id, "till-1", &[SaleLineRequest::new(&water.id, 1000)])
        .await
        .unwrap();
    assert_eq!(sale.total(), money("1000.00"));
    assert_eq!(stock_of(&s.pos, &water.id).await, 4000);

    let lines: Vec<_> = (0..101).map(|_| SaleLineRequest::new(&water.id, 1)).collect();
    let sale = s.pos.sales().create_sale(&cook.id, "till-1", &lines).await.unwrap();
    assert_eq!(sale.lines.len(), 101);
    assert_eq!(sale.total(), money("101.00"));
    assert_eq!(stock_of(&s.pos, &water.id).await, 3899);
    assert_eq!(balance_of(&s.pos, &cook.id).await, money("-1101.00"));
}

#[tokio::test]
async fn restock_adds_stock_and_keeps_history() {
    let s = shop().await;

    let soda = s.pos.sales().restock_product(&s.soda.id, "admin", 14).await.unwrap();
    assert_eq!(soda.stock, 24);

    let history = s.pos.catalog().restock_history(&s.soda.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].quantity, 14);
    assert_eq!(history[0].stock_after, 24);
    assert_eq!(history[0].actor_id, "admin");

    let err = s.pos.sales().restock_product(&s.soda.id, "admin", -3).await.unwrap_err();
    assert!(matches!(err, EngineError::Rule(CoreError::InvalidQuantity(-3))));
}

#[tokio::test]
async fn sale_listing_filters() {
    let s = shop().await;
    let bob = customer(&s.pos, "bob", CustomerCategory::Staff, "0.00").await;

    let first = s
        .pos
        .sales()
        .create_sale(&s.alice.id, "till-1", &[SaleLineRequest::new(&s.soda.id, 1)])
        .await
        .unwrap();
    s.pos
        .sales()
        .create_sale(&bob.id, "till-2", &[SaleLineRequest::new(&s.soda.id, 1)])
        .await
        .unwrap();
    s.pos.sales().cancel_sale(&first.id, "till-1").await.unwrap();

    let cancelled = s
        .pos
        .catalog()
        .sales(SaleFilter {
            status: Some(SaleStatus::Cancelled),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, first.id);

    let by_till = s
        .pos
        .catalog()
        .sales(SaleFilter {
            actor_id: Some("till-2".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_till.len(), 1);
    assert_eq!(by_till[0].customer_id, bob.id);
}
