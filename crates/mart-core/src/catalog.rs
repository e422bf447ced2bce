//! # Catalog, Offers and Customers
//!
//! The lookup contracts the bill depends on, plus owned in-memory
//! implementations of each.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Who Touches What                                    │
//! │                                                                         │
//! │  Bill ──── adjust_stock() ────► Catalog        (only stock writer)     │
//! │    │                                                                    │
//! │    └────── resolve() ─────────► OfferResolver  (read only)             │
//! │                                                                         │
//! │  checkout ─ add_loyalty_points() ► CustomerStore                        │
//! │                                                                         │
//! │  Each store is an explicit value with its own lifecycle; nothing is    │
//! │  global. mart-store wraps these in flat-file tables.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Customer, CustomerId, Offer, OfferId, Product, ProductId};

// =============================================================================
// Contracts
// =============================================================================

/// Product lookup plus the single stock mutation point.
pub trait Catalog {
    /// Finds a product by id.
    fn lookup(&self, id: ProductId) -> Option<&Product>;

    /// Adds `delta` to a product's stock and returns the new level.
    ///
    /// Refuses (and changes nothing) if the result would be negative.
    fn adjust_stock(&mut self, id: ProductId, delta: i64) -> CoreResult<i64>;

    /// All products in insertion order.
    fn products(&self) -> &[Product];

    /// Products at or below their low-stock threshold.
    fn low_stock(&self) -> Vec<&Product> {
        self.products().iter().filter(|p| p.is_low_stock()).collect()
    }
}

/// Maps a product to its active offer.
pub trait OfferResolver {
    /// First offer registered for `product_id`, if any.
    fn resolve(&self, product_id: ProductId) -> Option<&Offer>;
}

/// Customer lookup and loyalty accrual.
pub trait CustomerStore {
    fn lookup(&self, id: CustomerId) -> Option<&Customer>;

    /// Adds points and returns the customer's new balance.
    fn add_loyalty_points(&mut self, id: CustomerId, points: i64) -> CoreResult<i64>;
}

// =============================================================================
// Product Catalog
// =============================================================================

/// In-memory product table, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product; ids must be unique.
    pub fn insert(&mut self, product: Product) -> CoreResult<()> {
        if self.lookup(product.id).is_some() {
            return Err(ValidationError::Duplicate {
                field: "product id".to_string(),
                value: product.id.to_string(),
            }
            .into());
        }
        self.products.push(product);
        Ok(())
    }

    /// Removes a product, keeping the order of the rest.
    pub fn remove(&mut self, id: ProductId) -> Option<Product> {
        let index = self.products.iter().position(|p| p.id == id)?;
        Some(self.products.remove(index))
    }

    /// Mutable access for catalog maintenance (rename, reprice).
    ///
    /// Stock changes during a sale go through [`Catalog::adjust_stock`].
    pub fn get_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    /// Next free id: one past the largest in use.
    pub fn next_id(&self) -> ProductId {
        self.products.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<Product> for ProductCatalog {
    /// Later duplicates of an id are dropped.
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut catalog = ProductCatalog::new();
        for product in iter {
            // first row for an id wins
            let _duplicate = catalog.insert(product);
        }
        catalog
    }
}

impl Catalog for ProductCatalog {
    fn lookup(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn adjust_stock(&mut self, id: ProductId, delta: i64) -> CoreResult<i64> {
        let product = self
            .get_mut(id)
            .ok_or(CoreError::ProductNotFound(id))?;

        let updated = product.stock + delta;
        if updated < 0 {
            return Err(CoreError::InsufficientStock {
                product_id: id,
                available: product.stock,
                requested: -delta,
            });
        }

        product.stock = updated;
        Ok(updated)
    }

    fn products(&self) -> &[Product] {
        &self.products
    }
}

// =============================================================================
// Offer Book
// =============================================================================

/// In-memory offer list.
///
/// Several offers may target the same product; [`OfferResolver::resolve`]
/// returns the first one registered and ignores the rest.
#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    offers: Vec<Offer>,
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, offer: Offer) {
        self.offers.push(offer);
    }

    /// Deletes an offer by its own id.
    pub fn remove(&mut self, id: OfferId) -> Option<Offer> {
        let index = self.offers.iter().position(|o| o.id == id)?;
        Some(self.offers.remove(index))
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn next_id(&self) -> OfferId {
        self.offers.iter().map(|o| o.id).max().unwrap_or(0) + 1
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl FromIterator<Offer> for OfferBook {
    fn from_iter<I: IntoIterator<Item = Offer>>(iter: I) -> Self {
        OfferBook {
            offers: iter.into_iter().collect(),
        }
    }
}

impl OfferResolver for OfferBook {
    fn resolve(&self, product_id: ProductId) -> Option<&Offer> {
        self.offers.iter().find(|o| o.product_id == product_id)
    }
}

// =============================================================================
// Customer Book
// =============================================================================

/// In-memory customer list.
#[derive(Debug, Clone, Default)]
pub struct CustomerBook {
    customers: Vec<Customer>,
}

impl CustomerBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, customer: Customer) -> CoreResult<()> {
        if self.lookup(customer.id).is_some() {
            return Err(ValidationError::Duplicate {
                field: "customer id".to_string(),
                value: customer.id.to_string(),
            }
            .into());
        }
        self.customers.push(customer);
        Ok(())
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn next_id(&self) -> CustomerId {
        self.customers.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

impl FromIterator<Customer> for CustomerBook {
    fn from_iter<I: IntoIterator<Item = Customer>>(iter: I) -> Self {
        let mut book = CustomerBook::new();
        for customer in iter {
            let _duplicate = book.insert(customer);
        }
        book
    }
}

impl CustomerStore for CustomerBook {
    fn lookup(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    fn add_loyalty_points(&mut self, id: CustomerId, points: i64) -> CoreResult<i64> {
        let customer = self
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CoreError::CustomerNotFound(id))?;
        customer.loyalty_points += points;
        Ok(customer.loyalty_points)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Percent;

    fn catalog() -> ProductCatalog {
        [
            Product::new(1, "Rice", Money::from_cents(6000), 10),
            Product::new(2, "Salt", Money::from_cents(2000), 3),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_adjust_stock() {
        let mut catalog = catalog();
        assert_eq!(catalog.adjust_stock(1, -4).unwrap(), 6);
        assert_eq!(catalog.adjust_stock(1, 2).unwrap(), 8);
    }

    #[test]
    fn test_adjust_stock_never_goes_negative() {
        let mut catalog = catalog();
        let err = catalog.adjust_stock(2, -4).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: 2,
                available: 3,
                requested: 4
            }
        );
        assert_eq!(catalog.lookup(2).unwrap().stock, 3);
    }

    #[test]
    fn test_adjust_unknown_product() {
        let mut catalog = catalog();
        assert_eq!(
            catalog.adjust_stock(99, 1).unwrap_err(),
            CoreError::ProductNotFound(99)
        );
    }

    #[test]
    fn test_duplicate_product_rejected() {
        let mut catalog = catalog();
        let err = catalog
            .insert(Product::new(1, "Other", Money::from_cents(1), 1))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.next_id(), 3);
    }

    #[test]
    fn test_low_stock_listing() {
        let catalog = catalog();
        let low: Vec<ProductId> = catalog.low_stock().iter().map(|p| p.id).collect();
        assert_eq!(low, vec![2]);
    }

    #[test]
    fn test_first_offer_wins() {
        let book: OfferBook = [
            Offer::percent(1, 7, Percent::from_whole(10)),
            Offer::buy_x_get_y(2, 7, 2, 1),
        ]
        .into_iter()
        .collect();

        assert_eq!(book.resolve(7).unwrap().id, 1);
        assert!(book.resolve(8).is_none());
    }

    #[test]
    fn test_offer_removal_exposes_next_match() {
        let mut book: OfferBook = [
            Offer::percent(1, 7, Percent::from_whole(10)),
            Offer::buy_x_get_y(2, 7, 2, 1),
        ]
        .into_iter()
        .collect();

        assert!(book.remove(1).is_some());
        assert_eq!(book.resolve(7).unwrap().id, 2);
        assert!(book.remove(1).is_none());
    }

    #[test]
    fn test_loyalty_points() {
        let mut book: CustomerBook = [Customer::new(1, "Asha")].into_iter().collect();
        assert_eq!(book.add_loyalty_points(1, 3).unwrap(), 3);
        assert_eq!(book.add_loyalty_points(1, 2).unwrap(), 5);
        assert_eq!(
            book.add_loyalty_points(2, 1).unwrap_err(),
            CoreError::CustomerNotFound(2)
        );
    }
}
