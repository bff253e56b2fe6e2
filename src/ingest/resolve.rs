//! Find-or-create resolution of the master records an invoice refers to.

use super::repository::{CompanyDirectory, DiscountRegistry, ProductCatalog};
use crate::core::*;
use crate::fatturapa::{DiscountData, ExtractedLine};

/// Outcome of a find-or-create lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    Found(T),
    Created(T),
}

impl<T> Resolved<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Found(t) | Self::Created(t) => t,
        }
    }

    pub fn get(&self) -> &T {
        match self {
            Self::Found(t) | Self::Created(t) => t,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Product identity as seen on one supplier's invoice line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRequest {
    /// Name used for alias and catalog lookup (the line description).
    pub name: String,
    pub description: String,
    pub external_code: String,
}

impl From<&ExtractedLine> for ProductRequest {
    fn from(line: &ExtractedLine) -> Self {
        Self {
            name: line.description.clone(),
            description: line.description.clone(),
            external_code: line.external_product_code.clone(),
        }
    }
}

/// Look a company up by VAT id, creating it from the extracted data if absent.
///
/// An existing company is returned as stored; newer data on the invoice does
/// not overwrite it.
pub fn resolve_company<S>(store: &mut S, party: &PartyData) -> Result<Resolved<Company>, StoreError>
where
    S: CompanyDirectory + ?Sized,
{
    if let Some(company) = store.find_company_by_vat_id(&party.vat_id)? {
        return Ok(Resolved::Found(company));
    }
    let company = store.create_company(party.clone())?;
    tracing::info!(company = %company.id, vat_id = %company.vat_id, name = %company.name, "created company");
    Ok(Resolved::Created(company))
}

/// Resolve the catalog product for a supplier's line.
///
/// Order: the supplier's alias for this exact name, then a product with this
/// exact name, then a new product. When the alias lookup missed and the line
/// carries a code or description, an alias is registered so the next invoice
/// from the same supplier takes the alias path.
pub fn resolve_product<S>(
    store: &mut S,
    supplier: CompanyId,
    request: &ProductRequest,
) -> Result<Resolved<Product>, StoreError>
where
    S: ProductCatalog + ?Sized,
{
    if let Some(alias) = store.find_alias(supplier, &request.name)? {
        let product = store.product(alias.product_id)?;
        tracing::debug!(product = %product.id, alias = %alias.id, "product resolved via supplier alias");
        return Ok(Resolved::Found(product));
    }

    let resolved = match store.find_product_by_name(&request.name)? {
        Some(product) => Resolved::Found(product),
        None => {
            let product = store.create_product(NewProduct {
                name: request.name.clone(),
                description: request.description.clone(),
            })?;
            tracing::info!(product = %product.id, name = %product.name, "created product");
            Resolved::Created(product)
        }
    };

    if !request.external_code.is_empty() || !request.description.is_empty() {
        let alias = store.create_alias(NewProductAlias {
            product_id: resolved.get().id,
            supplier_id: supplier,
            alias_name: request.name.clone(),
            external_code: request.external_code.clone(),
            description: request.description.clone(),
        })?;
        tracing::debug!(alias = %alias.id, supplier = %supplier, "registered product alias");
    }

    Ok(resolved)
}

/// Reuse the discount with this exact percentage or create one.
pub fn resolve_discount<S>(
    store: &mut S,
    discount: &DiscountData,
) -> Result<Resolved<Discount>, StoreError>
where
    S: DiscountRegistry + ?Sized,
{
    if let Some(existing) = store.find_discount_by_percentage(discount.percentage)? {
        return Ok(Resolved::Found(existing));
    }
    let created = store.create_discount(NewDiscount {
        percentage: discount.percentage,
        description: discount.description.clone(),
    })?;
    tracing::info!(discount = %created.id, percentage = %created.percentage, "created discount");
    Ok(Resolved::Created(created))
}
