use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::repository::*;
use crate::core::*;

/// In-process store implementing every collaborator trait.
///
/// Transactions snapshot the whole table set on `begin` and restore it on
/// `rollback`, which is fine for the batch sizes a single operator uploads.
/// The tables can be saved to and loaded from a JSON file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    companies: Vec<Company>,
    products: Vec<Product>,
    aliases: Vec<ProductAlias>,
    discounts: Vec<Discount>,
    invoices: Vec<Invoice>,
    lines: Vec<InvoiceLine>,
    sequences: Sequences,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    company: u64,
    product: u64,
    alias: u64,
    discount: u64,
    invoice: u64,
    line: u64,
}

fn next(seq: &mut u64) -> u64 {
    *seq += 1;
    *seq
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON snapshot; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path)
            .map_err(|e| StoreError::Io(format!("reading {}: {e}", path.display())))?;
        let tables: Tables = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Io(format!("decoding {}: {e}", path.display())))?;
        Ok(Self {
            tables,
            snapshot: None,
        })
    }

    /// Write the committed tables as JSON.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction(
                "cannot save while a transaction is open".into(),
            ));
        }
        let bytes = serde_json::to_vec_pretty(&self.tables)
            .map_err(|e| StoreError::Io(format!("encoding snapshot: {e}")))?;
        std::fs::write(path, bytes)
            .map_err(|e| StoreError::Io(format!("writing {}: {e}", path.display())))
    }

    /// Flag the company with this VAT id as the operating company, creating it
    /// when it does not exist yet. Any previously flagged company loses the
    /// flag, so re-registering moves it rather than adding a second one.
    pub fn register_operating_company(&mut self, party: PartyData) -> Result<Company, StoreError> {
        if party.vat_id.trim().is_empty() {
            return Err(StoreError::Invalid {
                entity: "company",
                errors: vec![ValidationError::new("vat_id", "VAT id must not be empty")],
            });
        }
        for company in &mut self.tables.companies {
            company.is_operating = false;
        }
        if let Some(existing) = self
            .tables
            .companies
            .iter_mut()
            .find(|c| c.vat_id == party.vat_id)
        {
            existing.is_operating = true;
            return Ok(existing.clone());
        }
        let id = CompanyId(next(&mut self.tables.sequences.company));
        let company = Company::from_party(id, party, true);
        self.tables.companies.push(company.clone());
        Ok(company)
    }

    pub fn companies(&self) -> &[Company] {
        &self.tables.companies
    }

    pub fn products(&self) -> &[Product] {
        &self.tables.products
    }

    pub fn aliases(&self) -> &[ProductAlias] {
        &self.tables.aliases
    }

    pub fn discounts(&self) -> &[Discount] {
        &self.tables.discounts
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.tables.invoices
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.tables.lines
    }

    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.tables.companies.iter().find(|c| c.id == id)
    }

    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.tables.invoices.iter().find(|i| i.id == id)
    }

    /// Delete an invoice together with its lines.
    pub fn remove_invoice(&mut self, id: InvoiceId) -> Result<Invoice, StoreError> {
        let pos = self
            .tables
            .invoices
            .iter()
            .position(|i| i.id == id)
            .ok_or(StoreError::NotFound {
                entity: "invoice",
                id: id.0,
            })?;
        self.tables.lines.retain(|l| l.invoice_id != id);
        Ok(self.tables.invoices.remove(pos))
    }

    /// Delete a company that no invoice references.
    pub fn remove_company(&mut self, id: CompanyId) -> Result<Company, StoreError> {
        if self
            .tables
            .invoices
            .iter()
            .any(|i| i.issuer_id == id || i.receiver_id == id)
        {
            return Err(StoreError::Constraint(format!(
                "company #{id} is referenced by invoices"
            )));
        }
        let pos = self
            .tables
            .companies
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound {
                entity: "company",
                id: id.0,
            })?;
        self.tables.aliases.retain(|a| a.supplier_id != id);
        Ok(self.tables.companies.remove(pos))
    }

    fn require_company(&self, id: CompanyId) -> Result<(), StoreError> {
        if self.tables.companies.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "company",
                id: id.0,
            })
        }
    }
}

impl CompanyDirectory for MemoryStore {
    fn find_company_by_vat_id(&self, vat_id: &str) -> Result<Option<Company>, StoreError> {
        Ok(self
            .tables
            .companies
            .iter()
            .find(|c| c.vat_id == vat_id)
            .cloned())
    }

    fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.company(id).cloned())
    }

    fn operating_companies(&self) -> Result<Vec<Company>, StoreError> {
        Ok(self
            .tables
            .companies
            .iter()
            .filter(|c| c.is_operating)
            .cloned()
            .collect())
    }

    fn create_company(&mut self, party: PartyData) -> Result<Company, StoreError> {
        if party.vat_id.trim().is_empty() {
            return Err(StoreError::Invalid {
                entity: "company",
                errors: vec![ValidationError::new("vat_id", "VAT id must not be empty")],
            });
        }
        if self.tables.companies.iter().any(|c| c.vat_id == party.vat_id) {
            return Err(StoreError::Constraint(format!(
                "company with VAT id '{}' already exists",
                party.vat_id
            )));
        }
        let id = CompanyId(next(&mut self.tables.sequences.company));
        let company = Company::from_party(id, party, false);
        self.tables.companies.push(company.clone());
        Ok(company)
    }
}

impl ProductCatalog for MemoryStore {
    fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .tables
            .products
            .iter()
            .find(|p| p.name == name)
            .cloned())
    }

    fn product(&self, id: ProductId) -> Result<Product, StoreError> {
        self.tables
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "product",
                id: id.0,
            })
    }

    fn create_product(&mut self, product: NewProduct) -> Result<Product, StoreError> {
        let id = ProductId(next(&mut self.tables.sequences.product));
        let product = Product {
            id,
            name: product.name,
            description: product.description,
        };
        self.tables.products.push(product.clone());
        Ok(product)
    }

    fn find_alias(
        &self,
        supplier: CompanyId,
        alias_name: &str,
    ) -> Result<Option<ProductAlias>, StoreError> {
        Ok(self
            .tables
            .aliases
            .iter()
            .find(|a| a.supplier_id == supplier && a.alias_name == alias_name)
            .cloned())
    }

    fn create_alias(&mut self, alias: NewProductAlias) -> Result<ProductAlias, StoreError> {
        self.require_company(alias.supplier_id)?;
        self.product(alias.product_id)?;
        let id = AliasId(next(&mut self.tables.sequences.alias));
        let alias = ProductAlias {
            id,
            product_id: alias.product_id,
            supplier_id: alias.supplier_id,
            alias_name: alias.alias_name,
            external_code: alias.external_code,
            description: alias.description,
        };
        self.tables.aliases.push(alias.clone());
        Ok(alias)
    }
}

impl DiscountRegistry for MemoryStore {
    fn find_discount_by_percentage(
        &self,
        percentage: Decimal,
    ) -> Result<Option<Discount>, StoreError> {
        Ok(self
            .tables
            .discounts
            .iter()
            .find(|d| d.percentage == percentage)
            .cloned())
    }

    fn create_discount(&mut self, discount: NewDiscount) -> Result<Discount, StoreError> {
        let errors = validate_new_discount(&discount);
        if !errors.is_empty() {
            return Err(StoreError::Invalid {
                entity: "discount",
                errors,
            });
        }
        let id = DiscountId(next(&mut self.tables.sequences.discount));
        let discount = Discount {
            id,
            percentage: discount.percentage,
            description: discount.description,
        };
        self.tables.discounts.push(discount.clone());
        Ok(discount)
    }
}

impl InvoiceLedger for MemoryStore {
    fn find_invoice(
        &self,
        number: &str,
        issuer: CompanyId,
        direction: Direction,
    ) -> Result<Option<Invoice>, StoreError> {
        Ok(self
            .tables
            .invoices
            .iter()
            .find(|i| i.number == number && i.issuer_id == issuer && i.direction == direction)
            .cloned())
    }

    fn create_invoice(&mut self, invoice: NewInvoice) -> Result<Invoice, StoreError> {
        let errors = validate_new_invoice(&invoice);
        let Some(issue_date) = invoice.issue_date.filter(|_| errors.is_empty()) else {
            return Err(StoreError::Invalid {
                entity: "invoice",
                errors,
            });
        };
        self.require_company(invoice.issuer_id)?;
        self.require_company(invoice.receiver_id)?;
        if self.find_invoice(&invoice.number, invoice.issuer_id, invoice.direction)?.is_some() {
            return Err(StoreError::Constraint(format!(
                "invoice {} from company #{} ({}) already exists",
                invoice.number,
                invoice.issuer_id,
                invoice.direction.code()
            )));
        }

        let id = InvoiceId(next(&mut self.tables.sequences.invoice));
        let invoice = Invoice {
            id,
            number: invoice.number,
            direction: invoice.direction,
            issue_date,
            currency: invoice.currency,
            issuer_id: invoice.issuer_id,
            receiver_id: invoice.receiver_id,
            taxable_amount: invoice.taxable_amount,
            vat_amount: invoice.vat_amount,
            total_amount: invoice.total_amount,
            notes: invoice.notes,
            source_file: invoice.source_file,
        };
        self.tables.invoices.push(invoice.clone());
        Ok(invoice)
    }

    fn create_line(&mut self, line: NewInvoiceLine) -> Result<InvoiceLine, StoreError> {
        if self.invoice(line.invoice_id).is_none() {
            return Err(StoreError::NotFound {
                entity: "invoice",
                id: line.invoice_id.0,
            });
        }
        self.product(line.product_id)?;
        if let Some(discount_id) = line.discount_id {
            if !self.tables.discounts.iter().any(|d| d.id == discount_id) {
                return Err(StoreError::NotFound {
                    entity: "discount",
                    id: discount_id.0,
                });
            }
        }
        let errors = validate_new_line(&line, &self.tables.lines);
        if !errors.is_empty() {
            return Err(StoreError::Invalid {
                entity: "invoice line",
                errors,
            });
        }

        let id = InvoiceLineId(next(&mut self.tables.sequences.line));
        let line = InvoiceLine {
            id,
            invoice_id: line.invoice_id,
            line_number: line.line_number,
            product_id: line.product_id,
            external_product_code: line.external_product_code,
            description: line.description,
            quantity: line.quantity,
            unit_of_measure: line.unit_of_measure,
            unit_price: line.unit_price,
            vat_rate: line.vat_rate,
            line_total: line.line_total,
            discount_id: line.discount_id,
        };
        self.tables.lines.push(line.clone());
        Ok(line)
    }

    fn invoice_lines(&self, invoice: InvoiceId) -> Result<Vec<InvoiceLine>, StoreError> {
        let mut lines: Vec<InvoiceLine> = self
            .tables
            .lines
            .iter()
            .filter(|l| l.invoice_id == invoice)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.line_number);
        Ok(lines)
    }
}

impl Transactional for MemoryStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction(
                "nested transactions are not supported".into(),
            ));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| StoreError::Transaction("commit without begin".into()))
    }

    fn rollback(&mut self) {
        if let Some(tables) = self.snapshot.take() {
            self.tables = tables;
        }
    }
}
