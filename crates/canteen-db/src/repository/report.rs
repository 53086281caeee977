//! # Report Repository
//!
//! Read-only aggregates for the dashboard and back-office screens.
//!
//! ## Rules Shared by Every Query
//! - Cancelled sales never count toward revenue, sale counts or rankings
//! - A "day" is the UTC calendar day of `created_at`
//! - Sums are `COALESCE`d so empty windows report zero, not NULL
//!
//! Nothing here takes a transaction. Figures are a snapshot of committed
//! state and may lag a concurrent sale by one commit.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::customer::CUSTOMER_COLUMNS;
use super::product::PRODUCT_COLUMNS;
use crate::error::DbResult;
use canteen_core::report::{
    CatalogSummary, CategoryCount, CustomerSalesSummary, CustomerSpend, DailySummary,
    DashboardStats, DayTotal, FinancialSummary, PeriodSummary, ProductSales, ProductSalesStats,
    SellerSales,
};
use canteen_core::{Customer, Money, Product};

/// Products listed in a [`DailySummary`].
const TOP_PRODUCTS_PER_DAY: i64 = 5;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    // =========================================================================
    // Sales over time
    // =========================================================================

    /// Count, revenue, average ticket and best sellers for one day.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let (sale_count, revenue_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE status = 'active' AND date(created_at) = ?1
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        let top_products = self
            .product_sales(Some(date), Some(date), TOP_PRODUCTS_PER_DAY)
            .await?;

        debug!(%date, sale_count, revenue_cents, "Built daily summary");

        Ok(DailySummary {
            date,
            sale_count,
            revenue_cents,
            average_ticket_cents: Money::mean(Money::from_cents(revenue_cents), sale_count).cents(),
            top_products,
        })
    }

    /// Totals over `from..=to` plus each day that had sales.
    pub async fn period_summary(&self, from: NaiveDate, to: NaiveDate) -> DbResult<PeriodSummary> {
        let days = self.day_totals(from, to).await?;

        let sale_count: i64 = days.iter().map(|d| d.sale_count).sum();
        let revenue_cents: i64 = days.iter().map(|d| d.revenue_cents).sum();

        Ok(PeriodSummary {
            from,
            to,
            sale_count,
            revenue_cents,
            average_ticket_cents: Money::mean(Money::from_cents(revenue_cents), sale_count).cents(),
            days,
        })
    }

    /// One entry per day for the `days` days ending at `end`, oldest first.
    /// Days without sales are present with zeros.
    pub async fn sales_chart(&self, end: NaiveDate, days: u32) -> DbResult<Vec<DayTotal>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let start = end - Duration::days(i64::from(days) - 1);

        let mut by_day: HashMap<NaiveDate, DayTotal> = self
            .day_totals(start, end)
            .await?
            .into_iter()
            .map(|d| (d.date, d))
            .collect();

        let chart = start
            .iter_days()
            .take(days as usize)
            .map(|date| {
                by_day.remove(&date).unwrap_or(DayTotal {
                    date,
                    sale_count: 0,
                    revenue_cents: 0,
                })
            })
            .collect();

        Ok(chart)
    }

    async fn day_totals(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<DayTotal>> {
        let rows: Vec<(NaiveDate, i64, i64)> = sqlx::query_as(
            r#"
            SELECT date(created_at) AS day, COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE status = 'active'
              AND date(created_at) >= ?1
              AND date(created_at) <= ?2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date, sale_count, revenue_cents)| DayTotal {
                date,
                sale_count,
                revenue_cents,
            })
            .collect())
    }

    // =========================================================================
    // Rankings
    // =========================================================================

    /// Best-selling products by quantity, optionally since a day.
    pub async fn top_products(
        &self,
        limit: i64,
        since: Option<NaiveDate>,
    ) -> DbResult<Vec<ProductSales>> {
        self.product_sales(since, None, limit).await
    }

    async fn product_sales(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: i64,
    ) -> DbResult<Vec<ProductSales>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                l.product_id AS product_id,
                p.name AS product_name,
                SUM(l.quantity) AS quantity_sold,
                COUNT(*) AS line_count,
                SUM(l.total_cents) AS revenue_cents
            FROM sale_lines l
            JOIN sales s ON s.id = l.sale_id
            JOIN products p ON p.id = l.product_id
            WHERE s.status = 'active'
            "#,
        );
        if let Some(from) = from {
            qb.push(" AND date(s.created_at) >= ").push_bind(from);
        }
        if let Some(to) = to {
            qb.push(" AND date(s.created_at) <= ").push_bind(to);
        }
        qb.push(
            " GROUP BY l.product_id, p.name \
              ORDER BY quantity_sold DESC, revenue_cents DESC, p.name LIMIT ",
        )
        .push_bind(limit);

        let rows = qb
            .build_query_as::<ProductSales>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Customers ranked by lifetime spend.
    pub async fn top_customers(&self, limit: i64) -> DbResult<Vec<CustomerSpend>> {
        let rows = sqlx::query_as::<_, CustomerSpend>(
            r#"
            SELECT
                c.id AS customer_id,
                c.name AS name,
                c.handle AS handle,
                COUNT(*) AS sale_count,
                SUM(s.total_cents) AS total_spent_cents
            FROM sales s
            JOIN customers c ON c.id = s.customer_id
            WHERE s.status = 'active'
            GROUP BY c.id, c.name, c.handle
            ORDER BY total_spent_cents DESC, c.name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Actors ranked by revenue rung up, optionally since a day.
    pub async fn top_sellers(
        &self,
        since: Option<NaiveDate>,
        limit: i64,
    ) -> DbResult<Vec<SellerSales>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT actor_id, COUNT(*) AS sale_count, SUM(total_cents) AS revenue_cents \
             FROM sales WHERE status = 'active'",
        );
        if let Some(since) = since {
            qb.push(" AND date(created_at) >= ").push_bind(since);
        }
        qb.push(" GROUP BY actor_id ORDER BY revenue_cents DESC, actor_id LIMIT ")
            .push_bind(limit);

        let rows = qb
            .build_query_as::<SellerSales>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // =========================================================================
    // Attention lists
    // =========================================================================

    /// Customers who owe money, most indebted first.
    pub async fn negative_balance_customers(&self) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE balance_cents < 0 ORDER BY balance_cents, name"
        );
        let rows = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Active products at or below `threshold`, or their own reorder
    /// threshold when `None`. Emptiest first.
    pub async fn low_stock_products(&self, threshold: Option<i64>) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND stock <= COALESCE(?1, reorder_threshold) \
             ORDER BY stock, name"
        );
        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Lines, units and revenue of one product over active sales, with its
    /// stock figures. `None` for an unknown product.
    pub async fn product_sales_stats(
        &self,
        product_id: &str,
    ) -> DbResult<Option<ProductSalesStats>> {
        let row = sqlx::query_as::<_, ProductSalesStats>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                p.unit_price_cents AS unit_price_cents,
                p.stock AS stock,
                p.reorder_threshold AS reorder_threshold,
                p.is_active AS is_active,
                COUNT(s.id) AS line_count,
                COALESCE(SUM(CASE WHEN s.id IS NOT NULL THEN l.quantity ELSE 0 END), 0) AS quantity_sold,
                COALESCE(SUM(CASE WHEN s.id IS NOT NULL THEN l.total_cents ELSE 0 END), 0) AS revenue_cents
            FROM products p
            LEFT JOIN sale_lines l ON l.product_id = p.id
            LEFT JOIN sales s ON s.id = l.sale_id AND s.status = 'active'
            WHERE p.id = ?1
            GROUP BY p.id
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn catalog_summary(&self) -> DbResult<CatalogSummary> {
        let (total_products, active_products, low_stock_products, stock_value_cents): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(is_active), 0),
                    COALESCE(SUM(CASE WHEN is_active = 1 AND stock <= reorder_threshold THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(unit_price_cents * stock), 0)
                FROM products
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(CatalogSummary {
            total_products,
            active_products,
            inactive_products: total_products - active_products,
            low_stock_products,
            stock_value_cents,
        })
    }

    // =========================================================================
    // Dashboards
    // =========================================================================

    pub async fn dashboard_stats(&self, today: NaiveDate) -> DbResult<DashboardStats> {
        let (active_customers, standard_customers, staff_customers, negative_balance_customers, total_balance_cents): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COALESCE(SUM(is_active), 0),
                    COALESCE(SUM(CASE WHEN is_active = 1 AND category = 'standard' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN is_active = 1 AND category = 'staff' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN balance_cents < 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN is_active = 1 THEN balance_cents ELSE 0 END), 0)
                FROM customers
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let (active_products, low_stock_products): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(is_active), 0),
                COALESCE(SUM(CASE WHEN is_active = 1 AND stock <= reorder_threshold THEN 1 ELSE 0 END), 0)
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let (today_sale_count, today_revenue_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE status = 'active' AND date(created_at) = ?1
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            active_customers,
            standard_customers,
            staff_customers,
            active_products,
            low_stock_products,
            today_sale_count,
            today_revenue_cents,
            negative_balance_customers,
            total_balance_cents,
        })
    }

    pub async fn financial_summary(&self, today: NaiveDate) -> DbResult<FinancialSummary> {
        let (total_balance_cents, positive_balance_cents, negative_balance_cents): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COALESCE(SUM(balance_cents), 0),
                    COALESCE(SUM(CASE WHEN balance_cents > 0 THEN balance_cents ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN balance_cents < 0 THEN balance_cents ELSE 0 END), 0)
                FROM customers
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let month = today.format("%Y-%m").to_string();
        let (total_revenue_cents, today_revenue_cents, month_revenue_cents, cancelled_sale_count): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COALESCE(SUM(CASE WHEN status = 'active' THEN total_cents ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'active' AND date(created_at) = ?1
                                      THEN total_cents ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'active' AND strftime('%Y-%m', created_at) = ?2
                                      THEN total_cents ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0)
                FROM sales
                "#,
            )
            .bind(today)
            .bind(month)
            .fetch_one(&self.pool)
            .await?;

        Ok(FinancialSummary {
            total_balance_cents,
            positive_balance_cents,
            negative_balance_cents,
            total_revenue_cents,
            today_revenue_cents,
            month_revenue_cents,
            cancelled_sale_count,
        })
    }

    /// Purchase summary for one customer, `None` if the customer is unknown.
    pub async fn customer_sales_summary(
        &self,
        customer_id: &str,
    ) -> DbResult<Option<CustomerSalesSummary>> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance_cents FROM customers WHERE id = ?1")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(balance_cents) = balance else {
            return Ok(None);
        };

        let (sale_count, total_spent_cents, last_sale_at): (i64, i64, Option<DateTime<Utc>>) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*), COALESCE(SUM(total_cents), 0), MAX(created_at)
                FROM sales
                WHERE customer_id = ?1 AND status = 'active'
                "#,
            )
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(CustomerSalesSummary {
            customer_id: customer_id.to_string(),
            sale_count,
            total_spent_cents,
            average_ticket_cents: Money::mean(Money::from_cents(total_spent_cents), sale_count)
                .cents(),
            last_sale_at,
            balance_cents,
        }))
    }

    /// Active customers per category.
    pub async fn customers_by_category(&self) -> DbResult<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT
                category,
                COUNT(*) AS customer_count,
                COALESCE(SUM(balance_cents), 0) AS total_balance_cents
            FROM customers
            WHERE is_active = 1
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
