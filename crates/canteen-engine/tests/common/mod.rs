//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use canteen_core::{Customer, CustomerCategory, Money, NewCustomer, NewProduct, Product};
use canteen_db::DbConfig;
use canteen_engine::{Canteen, EngineConfig};

pub async fn memory_canteen() -> Canteen {
    Canteen::open(DbConfig::in_memory(), EngineConfig::default())
        .await
        .unwrap()
}

pub async fn product(pos: &Canteen, name: &str, price: &str, stock: i64) -> Product {
    let price: Money = price.parse().unwrap();
    pos.catalog()
        .create_product(NewProduct {
            name: name.to_string(),
            unit_price_cents: price.cents(),
            stock,
            reorder_threshold: None,
        })
        .await
        .unwrap()
}

pub async fn customer(
    pos: &Canteen,
    handle: &str,
    category: CustomerCategory,
    balance: &str,
) -> Customer {
    let balance: Money = balance.parse().unwrap();
    pos.catalog()
        .create_customer(NewCustomer {
            name: handle.to_uppercase(),
            handle: handle.to_string(),
            room: None,
            category,
            initial_balance_cents: balance.cents(),
        })
        .await
        .unwrap()
}

pub fn money(s: &str) -> Money {
    s.parse().unwrap()
}

/// Alice (Standard, 20.00), soda (5.00 x 10), chips (15.00 x 10).
pub struct Shop {
    pub pos: Canteen,
    pub alice: Customer,
    pub soda: Product,
    pub chips: Product,
}

pub async fn shop() -> Shop {
    let pos = memory_canteen().await;
    let alice = customer(&pos, "alice", CustomerCategory::Standard, "20.00").await;
    let soda = product(&pos, "soda", "5.00", 10).await;
    let chips = product(&pos, "chips", "15.00", 10).await;
    Shop {
        pos,
        alice,
        soda,
        chips,
    }
}

pub async fn stock_of(pos: &Canteen, product_id: &str) -> i64 {
    pos.catalog().product(product_id).await.unwrap().stock
}

pub async fn balance_of(pos: &Canteen, customer_id: &str) -> Money {
    pos.catalog().balance(customer_id).await.unwrap()
}
