//! Invoice ingestion pipeline.
//!
//! Turns uploaded FatturaPA documents into persisted records: extraction,
//! purchase/sale classification against the operating company, find-or-create
//! resolution of companies, products and discounts, and an atomic write of the
//! invoice header with its lines. Re-uploading an invoice already on file is
//! reported as a duplicate and writes nothing.
//!
//! ```
//! use fattura::core::PartyBuilder;
//! use fattura::ingest::{IngestOptions, Ingestor, MemoryStore, OperatingCompany, Upload};
//!
//! let mut store = MemoryStore::new();
//! store
//!     .register_operating_company(PartyBuilder::new("Cantina Rossi", "00000000099").build())
//!     .unwrap();
//! let operating = OperatingCompany::resolve(&store).unwrap();
//!
//! let mut ingestor = Ingestor::new(store, operating, IngestOptions::default());
//! let outcome = ingestor.ingest(&Upload::new("fattura.pdf", b"%PDF"));
//! assert_eq!(outcome.message(), "Il file deve essere in formato XML");
//! ```

mod classify;
mod memory;
mod messages;
mod pipeline;
mod repository;
mod resolve;
mod settings;

pub use classify::{OperatingCompany, classify, normalize_vat_id};
pub use memory::MemoryStore;
pub use messages::Locale;
pub use pipeline::{IngestOutcome, IngestReport, Ingestor, InvoiceDraft, OutcomeKind, Upload};
pub use repository::{
    CompanyDirectory, DiscountRegistry, InvoiceLedger, ProductCatalog, Store, Transactional,
    UnitOfWork,
};
pub use resolve::{ProductRequest, Resolved, resolve_company, resolve_discount, resolve_product};
pub use settings::{IngestConfig, IngestOptions};
