//! # fattura
//!
//! Ingestion of Italian FatturaPA v1.2 electronic invoices: XML extraction,
//! purchase/sale classification, reconciliation of companies, products and
//! discounts against what is already on file, and deduplicated, atomic
//! persistence of invoice headers with their lines.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use fattura::core::*;
//! use fattura::ingest::{IngestOptions, Ingestor, MemoryStore, OperatingCompany, Upload};
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <p:FatturaElettronica versione="FPR12"
//!     xmlns:p="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
//!   <FatturaElettronicaHeader>
//!     <CedentePrestatore>
//!       <DatiAnagrafici>
//!         <IdFiscaleIVA><IdPaese>IT</IdPaese><IdCodice>01234567890</IdCodice></IdFiscaleIVA>
//!         <Anagrafica><Denominazione>Fornitore S.p.A.</Denominazione></Anagrafica>
//!       </DatiAnagrafici>
//!       <Sede><Indirizzo>Via Po</Indirizzo><CAP>10100</CAP><Comune>Torino</Comune><Nazione>IT</Nazione></Sede>
//!     </CedentePrestatore>
//!     <CessionarioCommittente>
//!       <DatiAnagrafici>
//!         <IdFiscaleIVA><IdPaese>IT</IdPaese><IdCodice>00000000099</IdCodice></IdFiscaleIVA>
//!         <Anagrafica><Denominazione>Cantina Rossi S.r.l.</Denominazione></Anagrafica>
//!       </DatiAnagrafici>
//!       <Sede><Indirizzo>Via Roma</Indirizzo><CAP>53100</CAP><Comune>Siena</Comune><Nazione>IT</Nazione></Sede>
//!     </CessionarioCommittente>
//!   </FatturaElettronicaHeader>
//!   <FatturaElettronicaBody>
//!     <DatiGenerali>
//!       <DatiGeneraliDocumento>
//!         <TipoDocumento>TD01</TipoDocumento><Divisa>EUR</Divisa>
//!         <Data>2024-05-02</Data><Numero>17</Numero>
//!         <ImportoTotaleDocumento>122.00</ImportoTotaleDocumento>
//!       </DatiGeneraliDocumento>
//!     </DatiGenerali>
//!     <DatiBeniServizi>
//!       <DettaglioLinee>
//!         <NumeroLinea>1</NumeroLinea><Descrizione>Tappi sughero</Descrizione>
//!         <Quantita>100</Quantita><PrezzoUnitario>1.00</PrezzoUnitario>
//!         <PrezzoTotale>100.00</PrezzoTotale><AliquotaIVA>22.00</AliquotaIVA>
//!       </DettaglioLinee>
//!       <DatiRiepilogo>
//!         <AliquotaIVA>22.00</AliquotaIVA><ImponibileImporto>100.00</ImponibileImporto><Imposta>22.00</Imposta>
//!       </DatiRiepilogo>
//!     </DatiBeniServizi>
//!   </FatturaElettronicaBody>
//! </p:FatturaElettronica>"#;
//!
//! let mut store = MemoryStore::new();
//! store
//!     .register_operating_company(PartyBuilder::new("Cantina Rossi S.r.l.", "00000000099").build())
//!     .unwrap();
//! let operating = OperatingCompany::resolve(&store).unwrap();
//! let mut ingestor = Ingestor::new(store, operating, IngestOptions::default());
//!
//! let outcome = ingestor.ingest(&Upload::new("IT01234567890_00017.xml", xml.as_bytes()));
//! let invoice = outcome.invoice().unwrap();
//! assert_eq!(invoice.direction, Direction::Purchase);
//! assert_eq!(outcome.message(), "Fattura n. 17 di Fornitore S.p.A. caricata con successo!");
//!
//! let again = ingestor.ingest(&Upload::new("IT01234567890_00017.xml", xml.as_bytes()));
//! assert_eq!(again.kind(), fattura::ingest::OutcomeKind::Duplicate);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Record types, amount parsing, persistence validation |
//! | `fatturapa` | FatturaPA v1.2 XML extraction |
//! | `ingest` (default) | Classification, resolution, transactional persistence, configuration |
//! | `cli` | The `fattura` command line tool |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "fatturapa")]
pub mod fatturapa;

#[cfg(feature = "ingest")]
pub mod ingest;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
