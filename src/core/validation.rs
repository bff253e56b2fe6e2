use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::types::*;

/// Validate an invoice header before it is written.
/// Returns all validation errors found (not just the first).
pub fn validate_new_invoice(invoice: &NewInvoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if invoice.number.trim().is_empty() {
        errors.push(ValidationError::new(
            "number",
            "invoice number must not be empty",
        ));
    }

    if invoice.issue_date.is_none() {
        errors.push(ValidationError::new(
            "issue_date",
            "issue date is missing or not in YYYY-MM-DD format",
        ));
    }

    errors
}

/// Validate a line against the lines already stored for the same invoice.
pub fn validate_new_line(line: &NewInvoiceLine, existing: &[InvoiceLine]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if line.line_number == 0 {
        errors.push(ValidationError::new(
            "line_number",
            "line numbers are 1-based",
        ));
    } else if existing
        .iter()
        .any(|l| l.invoice_id == line.invoice_id && l.line_number == line.line_number)
    {
        errors.push(ValidationError::new(
            "line_number",
            format!(
                "line number {} already used on invoice #{}",
                line.line_number, line.invoice_id
            ),
        ));
    }

    if line.unit_price.scale() > super::amounts::UNIT_PRICE_SCALE {
        errors.push(ValidationError::new(
            "unit_price",
            format!(
                "unit price {} has more than {} decimal places",
                line.unit_price,
                super::amounts::UNIT_PRICE_SCALE
            ),
        ));
    }

    errors
}

/// Validate a discount: the percentage must lie in `[0, 100]`.
pub fn validate_new_discount(discount: &NewDiscount) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if discount.percentage < Decimal::ZERO || discount.percentage > dec!(100) {
        errors.push(ValidationError::new(
            "percentage",
            format!("discount {}% is outside 0..=100", discount.percentage),
        ));
    }
    errors
}
