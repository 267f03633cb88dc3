//! Checkout planning: validate a cart against current stock
//!
//! The sequencer runs in two phases. This module holds the pure validation
//! phase: given the cart lines and the products fetched for them, it either
//! stages the stock decrements or rejects the whole cart with every
//! per-line problem accumulated. No write happens until every line has
//! passed, so a rejection leaves all stocks untouched.
//!
//! The commit phase lives in [`crate::repositories::ProductRepository::checkout`],
//! which runs both phases inside one transaction holding row locks, so
//! concurrent checkouts against the same product serialize instead of
//! racing on a stale read.

use thiserror::Error;

use crate::models::{CartLine, Product};

/// A staged stock decrement for one cart line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedLine {
    pub product_id: i64,
    pub remaining: i32,
}

/// Checkout failure
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// One or more cart lines failed validation; nothing was written
    #[error("{}", .problems.join("; "))]
    Rejected { problems: Vec<String> },

    /// Database error
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Validate every cart line and stage the resulting stock values
///
/// Each line is paired with the product fetched for it (`None` when the id
/// matched nothing). All problems are accumulated; there is no
/// fail-fast and no partial-success mode. Duplicate lines for the same
/// product draw down a single running remainder, so splitting a quantity
/// across lines cannot buy more than the stock, and each product stages
/// exactly one decrement.
pub fn plan(lines: &[(CartLine, Option<Product>)]) -> Result<Vec<StagedLine>, Vec<String>> {
    let mut problems = Vec::new();
    let mut staged: Vec<StagedLine> = Vec::new();

    for (line, product) in lines {
        let Some(product) = product else {
            problems.push(format!("Product with id {} not found", line.id));
            continue;
        };

        if line.qty < 1 {
            problems.push(format!("Invalid quantity for {}", product.name));
            continue;
        }

        let earlier = staged.iter().position(|s| s.product_id == product.id);
        let available = match earlier {
            Some(i) => staged[i].remaining,
            None => product.stock,
        };

        let remaining = available - line.qty;
        if remaining < 0 {
            problems.push(format!("Insufficient stock for {}", product.name));
            continue;
        }

        match earlier {
            Some(i) => staged[i].remaining = remaining,
            None => staged.push(StagedLine {
                product_id: product.id,
                remaining,
            }),
        }
    }

    if problems.is_empty() {
        Ok(staged)
    } else {
        Err(problems)
    }
}
