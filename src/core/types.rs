use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Primary key of a [`Company`].
    CompanyId
);
entity_id!(
    /// Primary key of a [`Product`].
    ProductId
);
entity_id!(
    /// Primary key of a [`ProductAlias`].
    AliasId
);
entity_id!(
    /// Primary key of a [`Discount`].
    DiscountId
);
entity_id!(
    /// Primary key of an [`Invoice`].
    InvoiceId
);
entity_id!(
    /// Primary key of an [`InvoiceLine`].
    InvoiceLineId
);

/// Whether the operating company issued or received the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Inbound: a supplier billed the operating company (fattura passiva).
    Purchase,
    /// Outbound: the operating company billed a customer (fattura attiva).
    Sale,
}

impl Direction {
    /// Short storage code, `IN` or `OUT`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Purchase => "IN",
            Self::Sale => "OUT",
        }
    }

    /// Parse from the storage code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "IN" => Some(Self::Purchase),
            "OUT" => Some(Self::Sale),
            _ => None,
        }
    }

    /// Italian display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Purchase => "Acquisto",
            Self::Sale => "Vendita",
        }
    }
}

/// Identity of a trading partner as read from an invoice header.
///
/// Used both as the extraction result and as the payload for creating a
/// [`Company`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyData {
    pub name: String,
    /// VAT id (`IdFiscaleIVA/IdCodice`), or the fiscal code when no VAT id is present.
    pub vat_id: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub email: String,
}

/// A trading partner, keyed by VAT id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub vat_id: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub email: String,
    /// Marks the company running this system.
    pub is_operating: bool,
}

impl Company {
    pub fn from_party(id: CompanyId, party: PartyData, is_operating: bool) -> Self {
        Self {
            id,
            name: party.name,
            vat_id: party.vat_id,
            address: party.address,
            city: party.city,
            postal_code: party.postal_code,
            country: party.country,
            phone: party.phone,
            email: party.email,
            is_operating,
        }
    }
}

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
}

/// Supplier-specific name for a catalog [`Product`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAlias {
    pub id: AliasId,
    pub product_id: ProductId,
    pub supplier_id: CompanyId,
    pub alias_name: String,
    pub external_code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductAlias {
    pub product_id: ProductId,
    pub supplier_id: CompanyId,
    pub alias_name: String,
    pub external_code: String,
    pub description: String,
}

/// A reusable discount, deduplicated by percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub percentage: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDiscount {
    pub percentage: Decimal,
    pub description: String,
}

/// A persisted invoice header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Supplier-assigned number; unique only together with issuer and direction.
    pub number: String,
    pub direction: Direction,
    pub issue_date: NaiveDate,
    pub currency: String,
    pub issuer_id: CompanyId,
    pub receiver_id: CompanyId,
    pub taxable_amount: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: String,
    /// Name of the uploaded file the invoice was read from.
    pub source_file: String,
}

/// Header payload handed to the ledger. `issue_date` stays optional so the
/// store, not the parser, rejects documents without a usable date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub number: String,
    pub direction: Direction,
    pub issue_date: Option<NaiveDate>,
    pub currency: String,
    pub issuer_id: CompanyId,
    pub receiver_id: CompanyId,
    pub taxable_amount: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: String,
    pub source_file: String,
}

/// One billed item of a persisted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub invoice_id: InvoiceId,
    /// 1-based, distinct within the invoice.
    pub line_number: u32,
    pub product_id: ProductId,
    pub external_product_code: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_of_measure: String,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub line_total: Decimal,
    pub discount_id: Option<DiscountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub invoice_id: InvoiceId,
    pub line_number: u32,
    pub product_id: ProductId,
    pub external_product_code: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_of_measure: String,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub line_total: Decimal,
    pub discount_id: Option<DiscountId>,
}
