//! Random operation sequences must never break stock, balance or ledger
//! invariants, checked after every single operation.

mod common;

use canteen_core::{CustomerCategory, ErrorKind, LedgerDirection, Money, SaleLineRequest};
use canteen_engine::Canteen;
use common::{customer, memory_canteen, product};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Sell {
        customer: usize,
        lines: Vec<(usize, i64)>,
    },
    Cancel {
        nth: usize,
    },
    Restock {
        product: usize,
        quantity: i64,
    },
    Adjust {
        customer: usize,
        cents: i64,
        credit: bool,
    },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..3usize, prop::collection::vec((0..3usize, 1..6i64), 1..4))
            .prop_map(|(customer, lines)| Op::Sell { customer, lines }),
        2 => (0..8usize).prop_map(|nth| Op::Cancel { nth }),
        1 => (0..3usize, 1..10i64).prop_map(|(product, quantity)| Op::Restock { product, quantity }),
        2 => (0..3usize, 1..2_000i64, any::<bool>())
            .prop_map(|(customer, cents, credit)| Op::Adjust { customer, cents, credit }),
    ]
}

struct World {
    pos: Canteen,
    customers: Vec<(String, CustomerCategory)>,
    products: Vec<String>,
    sales: Vec<String>,
}

async fn world() -> World {
    let pos = memory_canteen().await;

    let customers = vec![
        (
            customer(&pos, "std-a", CustomerCategory::Standard, "30.00").await,
            CustomerCategory::Standard,
        ),
        (
            customer(&pos, "std-b", CustomerCategory::Standard, "5.00").await,
            CustomerCategory::Standard,
        ),
        (
            customer(&pos, "staff", CustomerCategory::Staff, "0.00").await,
            CustomerCategory::Staff,
        ),
    ]
    .into_iter()
    .map(|(c, cat)| (c.id, cat))
    .collect();

    let products = vec![
        product(&pos, "bun", "1.50", 6).await.id,
        product(&pos, "juice", "3.00", 4).await.id,
        product(&pos, "plate", "8.00", 2).await.id,
    ];

    World {
        pos,
        customers,
        products,
        sales: Vec::new(),
    }
}

async fn apply(w: &mut World, op: &Op) {
    let outcome = match op {
        Op::Sell { customer, lines } => {
            let requests: Vec<_> = lines
                .iter()
                .map(|(p, q)| SaleLineRequest::new(&w.products[*p], *q))
                .collect();
            let result = w
                .pos
                .sales()
                .create_sale(&w.customers[*customer].0, "till", &requests)
                .await;
            result.map(|sale| w.sales.push(sale.id))
        }
        Op::Cancel { nth } => match w.sales.get(*nth) {
            Some(id) => w.pos.sales().cancel_sale(id, "till").await.map(|_| ()),
            None => Ok(()),
        },
        Op::Restock { product, quantity } => w
            .pos
            .sales()
            .restock_product(&w.products[*product], "admin", *quantity)
            .await
            .map(|_| ()),
        Op::Adjust {
            customer,
            cents,
            credit,
        } => {
            let direction = if *credit {
                LedgerDirection::Credit
            } else {
                LedgerDirection::Debit
            };
            w.pos
                .sales()
                .adjust_balance(
                    &w.customers[*customer].0,
                    "admin",
                    Money::from_cents(*cents),
                    direction,
                    "random adjustment",
                )
                .await
                .map(|_| ())
        }
    };

    if let Err(e) = outcome {
        // rejections are fine, storage failures are not
        assert!(
            matches!(e.kind(), ErrorKind::BusinessRule | ErrorKind::Precondition),
            "{op:?} failed with {e:?}"
        );
    }
}

async fn check(w: &World) {
    for id in &w.products {
        let p = w.pos.catalog().product(id).await.unwrap();
        assert!(p.stock >= 0, "negative stock on {}", p.name);
    }

    for (id, category) in &w.customers {
        let balance = w.pos.catalog().balance(id).await.unwrap();
        if *category == CustomerCategory::Standard {
            assert!(!balance.is_negative(), "standard customer at {balance}");
        }
        let recon = w.pos.ledger().reconcile(id).await.unwrap();
        assert!(recon.balanced, "{recon:?}");
    }

    for id in &w.sales {
        let sale = w.pos.catalog().sale(id).await.unwrap();
        let entries = w.pos.ledger().entries_for_sale(id).await.unwrap();
        let net: i64 = entries.iter().map(|e| e.signed_amount().cents()).sum();
        if sale.is_cancelled() {
            assert_eq!(entries.len(), 2);
            assert_eq!(net, 0);
        } else {
            assert_eq!(entries.len(), 1);
            assert_eq!(net, -sale.total_cents);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 16,
        ..ProptestConfig::default()
    })]

    #[test]
    fn invariants_hold_after_every_operation(ops in prop::collection::vec(op(), 1..30)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let mut w = world().await;
            for op in &ops {
                apply(&mut w, op).await;
                check(&w).await;
            }
        });
    }
}
