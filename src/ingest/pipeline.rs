use serde::Serialize;

use super::classify::{OperatingCompany, classify};
use super::settings::IngestOptions;
use super::repository::{CompanyDirectory, InvoiceLedger, Transactional, UnitOfWork};
use super::resolve::{ProductRequest, resolve_company, resolve_discount, resolve_product};
use crate::core::*;
use crate::fatturapa::{self, ExtractedInvoice};

/// One uploaded document.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub file_name: &'a str,
    pub content: &'a [u8],
}

impl<'a> Upload<'a> {
    pub fn new(file_name: &'a str, content: &'a [u8]) -> Self {
        Self { file_name, content }
    }
}

/// An extracted invoice tagged with its direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub extracted: ExtractedInvoice,
    pub direction: Direction,
}

/// Result of ingesting one document. Exactly one per upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Success { invoice: Invoice, message: String },
    Duplicate { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Duplicate,
    Error,
}

impl IngestOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success { .. } => OutcomeKind::Success,
            Self::Duplicate { .. } => OutcomeKind::Duplicate,
            Self::Error { .. } => OutcomeKind::Error,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. }
            | Self::Duplicate { message }
            | Self::Error { message } => message,
        }
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        match self {
            Self::Success { invoice, .. } => Some(invoice),
            _ => None,
        }
    }

    pub fn report(&self, file_name: &str) -> IngestReport {
        IngestReport {
            filename: file_name.to_string(),
            status: self.kind(),
            invoice_id: self.invoice().map(|i| i.id),
            message: self.message().to_string(),
        }
    }
}

/// Per-file summary handed back to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub filename: String,
    pub status: OutcomeKind,
    pub invoice_id: Option<InvoiceId>,
    pub message: String,
}

enum Persisted {
    Created { invoice: Invoice, issuer: Company },
    Duplicate { number: String, issuer: Company },
}

/// Runs the extraction → classification → resolution → persistence pipeline
/// for one document at a time.
///
/// The ingestor owns its store exclusively, so documents are always processed
/// one after the other; each commits before the next begins.
pub struct Ingestor<S> {
    store: S,
    operating: OperatingCompany,
    options: IngestOptions,
}

impl<S: Transactional> Ingestor<S> {
    pub fn new(store: S, operating: OperatingCompany, options: IngestOptions) -> Self {
        Self {
            store,
            operating,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn operating_company(&self) -> &OperatingCompany {
        &self.operating
    }

    /// Ingest one document. Never fails: every error becomes
    /// [`IngestOutcome::Error`] naming the file.
    #[tracing::instrument(skip_all, fields(file = %upload.file_name))]
    pub fn ingest(&mut self, upload: &Upload<'_>) -> IngestOutcome {
        let locale = self.options.locale;
        match self.try_ingest(upload) {
            Ok(Persisted::Created { invoice, issuer }) => {
                tracing::info!(
                    invoice = %invoice.id,
                    number = %invoice.number,
                    direction = invoice.direction.code(),
                    "invoice ingested"
                );
                IngestOutcome::Success {
                    message: locale.success(&invoice.number, &issuer.name),
                    invoice,
                }
            }
            Ok(Persisted::Duplicate { number, issuer }) => {
                tracing::info!(%number, issuer = %issuer.id, "duplicate invoice skipped");
                IngestOutcome::Duplicate {
                    message: locale.duplicate(&number, &issuer.name),
                }
            }
            Err(FatturaError::Rejected(reason)) => {
                tracing::warn!(%reason, "upload rejected");
                IngestOutcome::Error { message: reason }
            }
            Err(e) => {
                tracing::error!(error = %e, "invoice ingestion failed");
                IngestOutcome::Error {
                    message: locale.error(upload.file_name, &e.to_string()),
                }
            }
        }
    }

    /// Ingest documents strictly in order, one report per upload.
    pub fn ingest_batch<'a>(
        &mut self,
        uploads: impl IntoIterator<Item = Upload<'a>>,
    ) -> Vec<IngestReport> {
        uploads
            .into_iter()
            .map(|upload| self.ingest(&upload).report(upload.file_name))
            .collect()
    }

    /// Extract and classify without touching the store.
    pub fn draft(&self, upload: &Upload<'_>) -> Result<InvoiceDraft, FatturaError> {
        if self.options.require_xml_extension && !has_xml_extension(upload.file_name) {
            return Err(FatturaError::Rejected(self.options.locale.not_xml()));
        }
        let extracted = fatturapa::extract(upload.content, &self.options.extract)?;
        let direction = classify(&extracted.issuer.vat_id, &self.operating);
        Ok(InvoiceDraft {
            extracted,
            direction,
        })
    }

    fn try_ingest(&mut self, upload: &Upload<'_>) -> Result<Persisted, FatturaError> {
        let InvoiceDraft {
            extracted,
            direction,
        } = self.draft(upload)?;

        let mut uow = UnitOfWork::begin(&mut self.store)?;

        // A duplicate can only exist for an issuer already on file; checking
        // before any find-or-create keeps the duplicate path write-free.
        let known_issuer = if direction == Direction::Sale {
            Some(operating_record(&*uow, &self.operating)?)
        } else {
            uow.find_company_by_vat_id(&extracted.issuer.vat_id)?
        };
        if let Some(issuer) = known_issuer {
            if uow
                .find_invoice(&extracted.number, issuer.id, direction)?
                .is_some()
            {
                return Ok(Persisted::Duplicate {
                    number: extracted.number,
                    issuer,
                });
            }
        }

        let issuer = resolve_party(&mut *uow, &extracted.issuer, &self.operating)?;
        let receiver = resolve_party(&mut *uow, &extracted.receiver, &self.operating)?;

        let invoice = uow.create_invoice(NewInvoice {
            number: extracted.number.clone(),
            direction,
            issue_date: extracted.issue_date,
            currency: extracted.currency.clone(),
            issuer_id: issuer.id,
            receiver_id: receiver.id,
            taxable_amount: extracted.taxable_amount,
            vat_amount: extracted.vat_amount,
            total_amount: extracted.total_amount,
            notes: extracted.notes.clone(),
            source_file: upload.file_name.to_string(),
        })?;

        let mut lines = extracted.lines;
        lines.sort_by_key(|l| l.line_number);
        for line in &lines {
            let product = resolve_product(&mut *uow, issuer.id, &ProductRequest::from(line))?
                .into_inner();
            let discount = match &line.discount {
                Some(d) => Some(resolve_discount(&mut *uow, d)?.into_inner().id),
                None => None,
            };
            uow.create_line(NewInvoiceLine {
                invoice_id: invoice.id,
                line_number: line.line_number,
                product_id: product.id,
                external_product_code: line.external_product_code.clone(),
                description: line.description.clone(),
                quantity: line.quantity,
                unit_of_measure: line.unit_of_measure.clone(),
                unit_price: line.unit_price,
                vat_rate: line.vat_rate,
                line_total: line.line_total,
                discount_id: discount,
            })?;
        }

        uow.commit()?;
        Ok(Persisted::Created { invoice, issuer })
    }
}

/// The stored record of the operating company.
fn operating_record<S>(store: &S, operating: &OperatingCompany) -> Result<Company, FatturaError>
where
    S: CompanyDirectory + ?Sized,
{
    store
        .find_company(operating.id)?
        .ok_or_else(|| FatturaError::UnknownOperatingCompany(operating.vat_id.clone()))
}

/// A party naming the operating company, with or without country prefix,
/// maps onto its record; any other party is found or created by VAT id.
fn resolve_party<S>(
    store: &mut S,
    party: &PartyData,
    operating: &OperatingCompany,
) -> Result<Company, FatturaError>
where
    S: CompanyDirectory + ?Sized,
{
    if operating.matches(&party.vat_id) {
        return operating_record(&*store, operating);
    }
    Ok(resolve_company(store, party)?.into_inner())
}

fn has_xml_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}
