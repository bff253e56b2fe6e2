use serde::Serialize;

use super::repository::CompanyDirectory;
use crate::core::{Company, CompanyId, Direction, FatturaError};

/// The company running the system, resolved once and passed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatingCompany {
    pub id: CompanyId,
    pub name: String,
    pub vat_id: String,
}

impl From<Company> for OperatingCompany {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            vat_id: company.vat_id,
        }
    }
}

impl OperatingCompany {
    /// The single company flagged as operating company.
    pub fn resolve(directory: &impl CompanyDirectory) -> Result<Self, FatturaError> {
        let mut candidates = directory.operating_companies()?;
        match candidates.len() {
            0 => Err(FatturaError::OperatingCompanyMissing),
            1 => Ok(candidates.remove(0).into()),
            n => Err(FatturaError::OperatingCompanyAmbiguous(n)),
        }
    }

    /// The company registered under `vat_id`, whether flagged or not.
    pub fn by_vat_id(directory: &impl CompanyDirectory, vat_id: &str) -> Result<Self, FatturaError> {
        directory
            .find_company_by_vat_id(vat_id)?
            .map(Self::from)
            .ok_or_else(|| FatturaError::UnknownOperatingCompany(vat_id.to_string()))
    }

    /// Whether `vat_id` names this company once both sides are normalized.
    pub fn matches(&self, vat_id: &str) -> bool {
        normalize_vat_id(vat_id) == normalize_vat_id(&self.vat_id)
    }
}

/// Sale when the operating company issued the document, Purchase otherwise.
pub fn classify(issuer_vat_id: &str, operating: &OperatingCompany) -> Direction {
    if operating.matches(issuer_vat_id) {
        Direction::Sale
    } else {
        Direction::Purchase
    }
}

/// Upper-case, drop whitespace and a two-letter country prefix followed by a
/// digit, so `IT 00000000099` and `00000000099` compare equal while fiscal
/// codes such as `RSSMRA80A01H501U` stay intact.
pub fn normalize_vat_id(vat_id: &str) -> String {
    let compact: String = vat_id
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();
    let bytes = compact.as_bytes();
    if bytes.len() > 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1].is_ascii_alphabetic()
        && bytes[2].is_ascii_digit()
    {
        compact[2..].to_string()
    } else {
        compact
    }
}
