//! Collaborator contracts the pipeline depends on.
//!
//! Each trait covers one capability of the backing store. The pipeline only
//! needs a [`Store`] that is also [`Transactional`]; any storage engine can
//! provide one. [`MemoryStore`](super::MemoryStore) is the in-process
//! reference implementation.

use std::ops::{Deref, DerefMut};

use rust_decimal::Decimal;

use crate::core::*;

/// Trading partners keyed by VAT id.
pub trait CompanyDirectory {
    fn find_company_by_vat_id(&self, vat_id: &str) -> Result<Option<Company>, StoreError>;

    fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;

    /// All companies flagged as the operating company.
    fn operating_companies(&self) -> Result<Vec<Company>, StoreError>;

    fn create_company(&mut self, party: PartyData) -> Result<Company, StoreError>;
}

/// Catalog products and their per-supplier aliases.
pub trait ProductCatalog {
    fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;

    fn product(&self, id: ProductId) -> Result<Product, StoreError>;

    fn create_product(&mut self, product: NewProduct) -> Result<Product, StoreError>;

    /// First alias registered for `(supplier, alias_name)`, if any.
    fn find_alias(
        &self,
        supplier: CompanyId,
        alias_name: &str,
    ) -> Result<Option<ProductAlias>, StoreError>;

    fn create_alias(&mut self, alias: NewProductAlias) -> Result<ProductAlias, StoreError>;
}

/// Discounts deduplicated by percentage.
pub trait DiscountRegistry {
    fn find_discount_by_percentage(
        &self,
        percentage: Decimal,
    ) -> Result<Option<Discount>, StoreError>;

    fn create_discount(&mut self, discount: NewDiscount) -> Result<Discount, StoreError>;
}

/// Invoice headers and lines.
pub trait InvoiceLedger {
    fn find_invoice(
        &self,
        number: &str,
        issuer: CompanyId,
        direction: Direction,
    ) -> Result<Option<Invoice>, StoreError>;

    fn create_invoice(&mut self, invoice: NewInvoice) -> Result<Invoice, StoreError>;

    fn create_line(&mut self, line: NewInvoiceLine) -> Result<InvoiceLine, StoreError>;

    /// Lines of an invoice ordered by line number.
    fn invoice_lines(&self, invoice: InvoiceId) -> Result<Vec<InvoiceLine>, StoreError>;
}

/// Everything the pipeline reads and writes.
pub trait Store: CompanyDirectory + ProductCatalog + DiscountRegistry + InvoiceLedger {}

impl<T> Store for T where T: CompanyDirectory + ProductCatalog + DiscountRegistry + InvoiceLedger {}

/// A store able to group writes into one atomic unit.
pub trait Transactional: Store {
    fn begin(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard every write since `begin`. Must not fail.
    fn rollback(&mut self);
}

/// Scoped transaction: rolls back on drop unless [`commit`](Self::commit) succeeded.
pub struct UnitOfWork<'a, S: Transactional> {
    store: &'a mut S,
    open: bool,
}

impl<'a, S: Transactional> UnitOfWork<'a, S> {
    pub fn begin(store: &'a mut S) -> Result<Self, StoreError> {
        store.begin()?;
        Ok(Self { store, open: true })
    }

    pub fn commit(mut self) -> Result<(), StoreError> {
        self.open = false;
        let result = self.store.commit();
        if result.is_err() {
            self.store.rollback();
        }
        result
    }
}

impl<S: Transactional> Deref for UnitOfWork<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: Transactional> DerefMut for UnitOfWork<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: Transactional> Drop for UnitOfWork<'_, S> {
    fn drop(&mut self) {
        if self.open {
            tracing::debug!("unit of work dropped without commit, rolling back");
            self.store.rollback();
        }
    }
}
