use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::FatturaError;

/// One `DatiRiepilogo` block: the subtotal for a single VAT rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBlock {
    /// `AliquotaIVA`.
    pub vat_rate: Decimal,
    /// `ImponibileImporto`.
    pub taxable_amount: Decimal,
    /// `Imposta`.
    pub vat_amount: Decimal,
}

/// Document-level taxable and VAT amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub taxable_amount: Decimal,
    pub vat_amount: Decimal,
    /// True when the summary blocks summed to zero and the totals were
    /// rebuilt from the line totals.
    pub derived_from_lines: bool,
}

/// Sum the summary blocks; when the summed taxable amount is exactly zero,
/// fall back to the sum of line totals and `total - taxable` for VAT.
///
/// Fails with [`FatturaError::AmountOverflow`] when a sum leaves the
/// `Decimal` range.
pub fn reconcile_totals(
    summaries: &[SummaryBlock],
    line_totals: impl IntoIterator<Item = Decimal>,
    total_amount: Decimal,
) -> Result<Totals, FatturaError> {
    let (taxable, vat) = summaries.iter().try_fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(taxable, vat), block| {
            let taxable = taxable
                .checked_add(block.taxable_amount)
                .ok_or(FatturaError::AmountOverflow("ImponibileImporto"))?;
            let vat = vat
                .checked_add(block.vat_amount)
                .ok_or(FatturaError::AmountOverflow("Imposta"))?;
            Ok::<_, FatturaError>((taxable, vat))
        },
    )?;

    if !taxable.is_zero() {
        return Ok(Totals {
            taxable_amount: taxable,
            vat_amount: vat,
            derived_from_lines: false,
        });
    }

    let taxable = line_totals
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or(FatturaError::AmountOverflow("PrezzoTotale"))?;
    let vat = total_amount
        .checked_sub(taxable)
        .ok_or(FatturaError::AmountOverflow("ImportoTotaleDocumento"))?;
    tracing::debug!(
        blocks = summaries.len(),
        %taxable,
        "summary blocks sum to zero, deriving totals from lines"
    );
    Ok(Totals {
        taxable_amount: taxable,
        vat_amount: vat,
        derived_from_lines: true,
    })
}
