//! # Catalog
//!
//! Product and customer management, plus the read helpers callers use to
//! show them. Nothing here changes stock or balance after creation; that
//! belongs to [`SaleEngine`](crate::SaleEngine).
//!
//! ## Name Collisions
//! Product names and customer handles are unique ignoring case. Each write
//! checks first so the caller gets the offending value back, and the
//! schema's `COLLATE NOCASE UNIQUE` catches the race where two writers pass
//! the check together.

use chrono::Utc;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use canteen_core::validation::{
    validate_customer_name, validate_handle, validate_price_cents, validate_product_name,
    validate_reorder_threshold, validate_room, validate_search_query, validate_stock,
};
use canteen_core::{
    CoreError, Customer, CustomerCategory, CustomerFilter, CustomerUpdate, Money, NewCustomer,
    NewProduct, Product, ProductFilter, ProductUpdate, Restock, Retirement, Sale, SaleFilter,
};
use canteen_db::{generate_id, Database, DbError};

#[derive(Debug, Clone)]
pub struct Catalog {
    db: Database,
    config: EngineConfig,
}

impl Catalog {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Catalog { db, config }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn create_product(&self, new: NewProduct) -> EngineResult<Product> {
        debug!(name = %new.name, "create_product");

        validate_product_name(&new.name)?;
        validate_price_cents(new.unit_price_cents)?;
        validate_stock(new.stock)?;
        let reorder_threshold = new
            .reorder_threshold
            .unwrap_or(self.config.default_reorder_threshold);
        validate_reorder_threshold(reorder_threshold)?;

        let name = new.name.trim().to_string();
        if self.db.products().name_exists(&name, None).await? {
            return Err(CoreError::DuplicateName(name).into());
        }

        let now = Utc::now();
        let product = self
            .db
            .products()
            .insert(&Product {
                id: generate_id(),
                name: name.clone(),
                unit_price_cents: new.unit_price_cents,
                stock: new.stock,
                reorder_threshold,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| with_value(e, &name))?;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Applies the fields that are `Some`. Stock is not updatable here.
    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> EngineResult<Product> {
        debug!(id = %id, ?update, "update_product");

        let existing = self.product(id).await?;
        if update.is_empty() {
            return Ok(existing);
        }

        if let Some(name) = &update.name {
            validate_product_name(name)?;
            if self.db.products().name_exists(name.trim(), Some(id)).await? {
                return Err(CoreError::DuplicateName(name.trim().to_string()).into());
            }
        }
        if let Some(cents) = update.unit_price_cents {
            validate_price_cents(cents)?;
        }
        if let Some(threshold) = update.reorder_threshold {
            validate_reorder_threshold(threshold)?;
        }

        let name = update.name.as_deref().map(str::trim).unwrap_or_default().to_string();
        let product = self
            .db
            .products()
            .update(id, &update)
            .await
            .map_err(|e| match e {
                DbError::NotFound { .. } => CoreError::ProductNotFound(id.to_string()).into(),
                e => with_value(e, &name),
            })?;

        info!(id = %id, "Product updated");
        Ok(product)
    }

    /// Deletes a product nothing refers to; deactivates one with history.
    pub async fn retire_product(&self, id: &str) -> EngineResult<Retirement> {
        debug!(id = %id, "retire_product");

        let outcome = self.db.products().retire(id).await.map_err(|e| match e {
            DbError::NotFound { .. } => CoreError::ProductNotFound(id.to_string()).into(),
            e => EngineError::from(e),
        })?;

        info!(id = %id, ?outcome, "Product retired");
        Ok(outcome)
    }

    pub async fn product(&self, id: &str) -> EngineResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    pub async fn products(&self, mut filter: ProductFilter) -> EngineResult<Vec<Product>> {
        filter.search = normalize_search(filter.search)?;
        Ok(self.db.products().list(&filter).await?)
    }

    /// Active products at or below their reorder threshold, emptiest first,
    /// capped at the configured limit.
    pub async fn low_stock_products(&self) -> EngineResult<Vec<Product>> {
        let mut products = self.db.reports().low_stock_products(None).await?;
        products.truncate(self.config.low_stock_report_limit);
        Ok(products)
    }

    pub async fn restock_history(&self, product_id: &str) -> EngineResult<Vec<Restock>> {
        self.product(product_id).await?;
        Ok(self.db.restocks().history_for(product_id).await?)
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn create_customer(&self, new: NewCustomer) -> EngineResult<Customer> {
        debug!(handle = %new.handle, category = new.category.as_str(), "create_customer");

        validate_customer_name(&new.name)?;
        validate_handle(&new.handle)?;
        if let Some(room) = &new.room {
            validate_room(room)?;
        }
        if new.category == CustomerCategory::Standard && new.initial_balance_cents < 0 {
            return Err(CoreError::InvalidAmount {
                reason: "a standard customer cannot open with a negative balance".to_string(),
            }
            .into());
        }

        let handle = new.handle.trim().to_string();
        if self.db.customers().handle_exists(&handle, None).await? {
            return Err(CoreError::DuplicateHandle(handle).into());
        }

        let now = Utc::now();
        let customer = self
            .db
            .customers()
            .insert(&Customer {
                id: generate_id(),
                name: new.name.trim().to_string(),
                handle: handle.clone(),
                room: new.room.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
                category: new.category,
                balance_cents: new.initial_balance_cents,
                initial_balance_cents: new.initial_balance_cents,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| with_value(e, &handle))?;

        info!(
            id = %customer.id,
            handle = %customer.handle,
            balance_cents = customer.balance_cents,
            "Customer created"
        );
        Ok(customer)
    }

    /// Applies the fields that are `Some`. Balance is not updatable here.
    ///
    /// ## Errors
    /// * `CategoryChangeBlocked` - moving a customer who owes money to
    ///   Standard, whose balance may not be negative
    pub async fn update_customer(
        &self,
        id: &str,
        mut update: CustomerUpdate,
    ) -> EngineResult<Customer> {
        debug!(id = %id, ?update, "update_customer");

        let existing = self.customer(id).await?;
        if update.is_empty() {
            return Ok(existing);
        }

        if let Some(name) = &update.name {
            validate_customer_name(name)?;
            update.name = Some(name.trim().to_string());
        }
        if let Some(handle) = &update.handle {
            validate_handle(handle)?;
            let handle = handle.trim().to_string();
            if self.db.customers().handle_exists(&handle, Some(id)).await? {
                return Err(CoreError::DuplicateHandle(handle).into());
            }
            update.handle = Some(handle);
        }
        if let Some(Some(room)) = &update.room {
            validate_room(room)?;
            let room = room.trim().to_string();
            update.room = Some(Some(room).filter(|r| !r.is_empty()));
        }
        if update.category == Some(CustomerCategory::Standard) && existing.balance_cents < 0 {
            return Err(CoreError::CategoryChangeBlocked {
                customer_id: id.to_string(),
                balance: existing.balance(),
            }
            .into());
        }

        let handle = update.handle.clone().unwrap_or_default();
        let customer = self
            .db
            .customers()
            .update(id, &update)
            .await
            .map_err(|e| match e {
                DbError::NotFound { .. } => CoreError::CustomerNotFound(id.to_string()).into(),
                e => with_value(e, &handle),
            })?;

        info!(id = %id, "Customer updated");
        Ok(customer)
    }

    /// Deletes a customer with no sales and no ledger entries; deactivates
    /// one with history.
    pub async fn retire_customer(&self, id: &str) -> EngineResult<Retirement> {
        debug!(id = %id, "retire_customer");

        let outcome = self.db.customers().retire(id).await.map_err(|e| match e {
            DbError::NotFound { .. } => CoreError::CustomerNotFound(id.to_string()).into(),
            e => EngineError::from(e),
        })?;

        info!(id = %id, ?outcome, "Customer retired");
        Ok(outcome)
    }

    pub async fn customer(&self, id: &str) -> EngineResult<Customer> {
        self.db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()).into())
    }

    pub async fn customer_by_handle(&self, handle: &str) -> EngineResult<Customer> {
        self.db
            .customers()
            .get_by_handle(handle.trim())
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(handle.to_string()).into())
    }

    pub async fn customers(&self, mut filter: CustomerFilter) -> EngineResult<Vec<Customer>> {
        filter.search = normalize_search(filter.search)?;
        Ok(self.db.customers().list(&filter).await?)
    }

    /// Balance as [`Money`], for display.
    pub async fn balance(&self, customer_id: &str) -> EngineResult<Money> {
        Ok(self.customer(customer_id).await?.balance())
    }

    // =========================================================================
    // Sales
    // =========================================================================

    pub async fn sale(&self, id: &str) -> EngineResult<Sale> {
        self.db
            .sales()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()).into())
    }

    pub async fn sales(&self, filter: SaleFilter) -> EngineResult<Vec<Sale>> {
        Ok(self.db.sales().list(&filter).await?)
    }
}

/// Blank searches mean "no filter".
fn normalize_search(search: Option<String>) -> EngineResult<Option<String>> {
    match search {
        Some(q) => {
            let q = validate_search_query(&q)?;
            Ok(Some(q).filter(|q| !q.is_empty()))
        }
        None => Ok(None),
    }
}

/// Puts the attempted value into a unique violation from a lost race.
fn with_value(err: DbError, value: &str) -> EngineError {
    match err {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, value).into(),
        e => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canteen_db::DbConfig;

    async fn catalog() -> Catalog {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Catalog::new(db, EngineConfig::default())
    }

    fn soda() -> NewProduct {
        NewProduct {
            name: "Soda".into(),
            unit_price_cents: 500,
            stock: 10,
            reorder_threshold: None,
        }
    }

    fn alice() -> NewCustomer {
        NewCustomer {
            name: "Alice".into(),
            handle: "alice".into(),
            room: Some("A-101".into()),
            category: CustomerCategory::Standard,
            initial_balance_cents: 2000,
        }
    }

    #[tokio::test]
    async fn test_create_product_defaults_and_duplicates() {
        let catalog = catalog().await;

        let product = catalog.create_product(soda()).await.unwrap();
        assert_eq!(product.reorder_threshold, 10);
        assert!(product.is_active);

        let err = catalog
            .create_product(NewProduct {
                name: "  SODA ".into(),
                ..soda()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.rule(), Some(CoreError::DuplicateName(n)) if n == "SODA"));
    }

    #[tokio::test]
    async fn test_create_product_validates() {
        let catalog = catalog().await;

        for bad in [
            NewProduct { name: " ".into(), ..soda() },
            NewProduct { unit_price_cents: 0, ..soda() },
            NewProduct { stock: -1, ..soda() },
            NewProduct { reorder_threshold: Some(-1), ..soda() },
        ] {
            let err = catalog.create_product(bad).await.unwrap_err();
            assert!(matches!(err.rule(), Some(CoreError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_update_product() {
        let catalog = catalog().await;
        let soda = catalog.create_product(soda()).await.unwrap();
        catalog
            .create_product(NewProduct {
                name: "Chips".into(),
                ..self::soda()
            })
            .await
            .unwrap();

        let updated = catalog
            .update_product(
                &soda.id,
                ProductUpdate {
                    unit_price_cents: Some(550),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.unit_price_cents, 550);
        assert_eq!(updated.stock, 10);

        // renaming to its own name in another case is fine
        catalog
            .update_product(
                &soda.id,
                ProductUpdate {
                    name: Some("SODA".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = catalog
            .update_product(
                &soda.id,
                ProductUpdate {
                    name: Some("chips".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err.rule(), Some(CoreError::DuplicateName(_))));

        let err = catalog
            .update_product("missing", ProductUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err.rule(), Some(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_retire_unused_product_deletes_it() {
        let catalog = catalog().await;
        let soda = catalog.create_product(soda()).await.unwrap();

        assert_eq!(catalog.retire_product(&soda.id).await.unwrap(), Retirement::Deleted);
        let err = catalog.product(&soda.id).await.unwrap_err();
        assert!(matches!(err.rule(), Some(CoreError::ProductNotFound(_))));

        let err = catalog.retire_product(&soda.id).await.unwrap_err();
        assert!(matches!(err.rule(), Some(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_customer_rules() {
        let catalog = catalog().await;

        let customer = catalog.create_customer(alice()).await.unwrap();
        assert_eq!(customer.balance_cents, 2000);
        assert_eq!(customer.initial_balance_cents, 2000);

        let err = catalog
            .create_customer(NewCustomer {
                handle: "ALICE".into(),
                ..alice()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.rule(), Some(CoreError::DuplicateHandle(_))));

        let err = catalog
            .create_customer(NewCustomer {
                handle: "bob".into(),
                initial_balance_cents: -100,
                ..alice()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.rule(), Some(CoreError::InvalidAmount { .. })));

        let staff = catalog
            .create_customer(NewCustomer {
                handle: "bob".into(),
                category: CustomerCategory::Staff,
                initial_balance_cents: -100,
                room: None,
                ..alice()
            })
            .await
            .unwrap();
        assert_eq!(staff.balance(), Money::from_cents(-100));
    }

    #[tokio::test]
    async fn test_category_change_blocked_while_owing() {
        let catalog = catalog().await;
        let bob = catalog
            .create_customer(NewCustomer {
                handle: "bob".into(),
                category: CustomerCategory::Staff,
                initial_balance_cents: -500,
                ..alice()
            })
            .await
            .unwrap();

        let err = catalog
            .update_customer(
                &bob.id,
                CustomerUpdate {
                    category: Some(CustomerCategory::Standard),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.rule(),
            Some(CoreError::CategoryChangeBlocked { balance, .. }) if *balance == Money::from_cents(-500)
        ));

        let moved = catalog
            .update_customer(
                &bob.id,
                CustomerUpdate {
                    room: Some(None),
                    handle: Some(" bobby ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.room, None);
        assert_eq!(moved.handle, "bobby");
        assert_eq!(catalog.customer_by_handle("BOBBY").await.unwrap().id, bob.id);
    }

    #[tokio::test]
    async fn test_blank_search_lists_everything() {
        let catalog = catalog().await;
        catalog.create_customer(alice()).await.unwrap();

        let all = catalog
            .customers(CustomerFilter {
                search: Some("   ".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);

        let none = catalog
            .products(ProductFilter {
                search: Some("nothing".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
