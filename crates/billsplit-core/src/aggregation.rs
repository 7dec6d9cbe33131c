//! # Aggregation Module
//!
//! Rolls bill line items up into one subtotal per person.
//!
//! ## Ordering
//! ```text
//! Input:  John/Pasta 12.0, Mary/Salad 9.0, John/Soda 1.5, Mary/Soda 1.5
//!
//! Output: John → [Pasta, Soda] 13.50      (first seen)
//!         Mary → [Salad, Soda] 10.50      (second seen)
//! ```
//! Identical input order always yields identical output order; the item
//! order feeds the expense description.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{AggregatedPersonTotal, BillLineItem};

/// Per-person totals in first-seen-person order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    totals: Vec<AggregatedPersonTotal>,
    index: HashMap<String, usize>,
}

impl Aggregation {
    /// Looks up a person's rollup by exact name.
    pub fn get(&self, person: &str) -> Option<&AggregatedPersonTotal> {
        self.index.get(person).map(|&i| &self.totals[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregatedPersonTotal> {
        self.totals.iter()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Person names in first-seen order.
    pub fn persons(&self) -> impl Iterator<Item = &str> {
        self.totals.iter().map(|t| t.person.as_str())
    }

    /// Sum of every person's total.
    pub fn grand_total(&self) -> CoreResult<Money> {
        Money::checked_sum(self.totals.iter().map(|t| t.total))
            .ok_or_else(|| ValidationError::overflow("total").into())
    }

    /// Item names of every person, person by person, in insertion order.
    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.totals
            .iter()
            .flat_map(|t| t.items.iter().map(String::as_str))
    }

    fn add(&mut self, person: &str, item: &BillLineItem) -> CoreResult<()> {
        let slot = match self.index.get(person) {
            Some(&i) => i,
            None => {
                self.totals.push(AggregatedPersonTotal {
                    person: person.to_string(),
                    items: Vec::new(),
                    total: Money::zero(),
                });
                self.index.insert(person.to_string(), self.totals.len() - 1);
                self.totals.len() - 1
            }
        };
        let entry = &mut self.totals[slot];
        entry.total = entry
            .total
            .checked_add(item.cost)
            .ok_or_else(|| ValidationError::overflow("cost"))?;
        entry.items.push(item.item_name.clone());
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Aggregation {
    type Item = &'a AggregatedPersonTotal;
    type IntoIter = std::slice::Iter<'a, AggregatedPersonTotal>;

    fn into_iter(self) -> Self::IntoIter {
        self.totals.iter()
    }
}

/// Groups line items by person.
///
/// ## Errors
/// `MissingAttribution` if any item has no person or a blank one; the
/// whole aggregation fails, there is no partial result.
pub fn aggregate(items: &[BillLineItem]) -> CoreResult<Aggregation> {
    let mut aggregation = Aggregation::default();

    for item in items {
        let person = item
            .person
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoreError::MissingAttribution {
                item_name: item.item_name.clone(),
            })?;
        aggregation.add(person, item)?;
    }

    Ok(aggregation)
}

// =============================================================================
// Unit Tests
// =============================================================================
