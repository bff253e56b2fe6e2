use thiserror::Error;

/// Errors that can occur while extracting, classifying or persisting an invoice.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FatturaError {
    /// The payload is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// The document root is not a FatturaPA v1.2 `FatturaElettronica` element.
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    /// A structural section required to read the invoice is absent.
    #[error("missing required element {0}")]
    MissingElement(&'static str),

    /// A party carries neither a VAT id nor a fiscal code.
    #[error("{0} has no VAT id or fiscal code")]
    MissingIdentifier(&'static str),

    /// No company is flagged as the operating company.
    #[error("no operating company is configured")]
    OperatingCompanyMissing,

    /// More than one company is flagged as the operating company.
    #[error("{0} companies are flagged as operating company, expected exactly one")]
    OperatingCompanyAmbiguous(usize),

    /// The configured operating VAT id does not match any company.
    #[error("operating company with VAT id '{0}' not found")]
    UnknownOperatingCompany(String),

    /// Summing the amounts of an element left the representable range.
    #[error("amount overflow while summing {0}")]
    AmountOverflow(&'static str),

    /// The upload was refused before parsing (e.g. wrong file extension).
    #[error("{0}")]
    Rejected(String),

    /// The backing store refused or failed an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A record failed persistence validation.
    #[error("invalid {entity}: {}", join_errors(.errors))]
    Invalid {
        entity: &'static str,
        errors: Vec<ValidationError>,
    },

    /// A uniqueness or reference constraint was violated.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A referenced record does not exist.
    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// Transaction bookkeeping error (e.g. nested begin, commit without begin).
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Snapshot read/write failure.
    #[error("storage I/O error: {0}")]
    Io(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "lines[2].line_number").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
