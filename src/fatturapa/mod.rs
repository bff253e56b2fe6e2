//! FatturaPA v1.2 XML extraction.
//!
//! Reads an Italian electronic invoice into an [`ExtractedInvoice`]: header
//! parties, general document data, detail lines with their discount blocks,
//! and the per-rate summary blocks reconciled into taxable/VAT totals.
//!
//! # Example
//!
//! ```no_run
//! use fattura::fatturapa::{self, ExtractOptions};
//!
//! let xml = std::fs::read("IT01234567890_FPA01.xml").unwrap();
//! let invoice = fatturapa::extract(&xml, &ExtractOptions::default()).unwrap();
//! println!("{} lines, taxable {}", invoice.lines.len(), invoice.taxable_amount);
//! ```

mod heuristics;
mod parse;
mod summary;

pub use heuristics::{
    DiscountDescriber, FixedDiscountDescription, ProductCodeHeuristic, UppercaseLeadingToken,
    DEFAULT_DISCOUNT_DESCRIPTION,
};
pub use parse::{DiscountData, ExtractOptions, ExtractedInvoice, ExtractedLine, extract};
pub use summary::{SummaryBlock, Totals, reconcile_totals};

/// FatturaPA v1.2 namespace URI.
pub const FATTURAPA_NS: &str = "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2";

/// Discount/surcharge type code marking a discount (`SC`); `MG` is a surcharge.
pub const DISCOUNT_TYPE: &str = "SC";

/// Element local names.
pub mod tags {
    pub const ROOT: &str = "FatturaElettronica";
    pub const HEADER: &str = "FatturaElettronicaHeader";
    pub const BODY: &str = "FatturaElettronicaBody";
    pub const ISSUER: &str = "CedentePrestatore";
    pub const RECEIVER: &str = "CessionarioCommittente";
    pub const REGISTRY: &str = "DatiAnagrafici";
    pub const SEAT: &str = "Sede";
    pub const VAT_ID: &str = "IdFiscaleIVA";
    pub const GENERAL: &str = "DatiGenerali";
    pub const GENERAL_DOCUMENT: &str = "DatiGeneraliDocumento";
    pub const LINE: &str = "DettaglioLinee";
    pub const SUMMARY: &str = "DatiRiepilogo";
    pub const ADJUSTMENT: &str = "ScontoMaggiorazione";
    pub const CONTACTS: &str = "Contatti";
}
