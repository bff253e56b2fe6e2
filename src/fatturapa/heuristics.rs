use rust_decimal::Decimal;

/// Description given to discounts discovered in an electronic invoice.
pub const DEFAULT_DISCOUNT_DESCRIPTION: &str = "Sconto da fattura elettronica";

/// Derives a supplier product code from a line description.
pub trait ProductCodeHeuristic: Send + Sync {
    fn product_code(&self, description: &str) -> Option<String>;
}

impl<F> ProductCodeHeuristic for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn product_code(&self, description: &str) -> Option<String> {
        self(description)
    }
}

/// Treats the text before the first space as a code when it is all upper-case.
///
/// "BTGSANGIMIGNANO Vino Rosso 2020" yields `BTGSANGIMIGNANO`; "Vino Rosso"
/// and single-word descriptions yield nothing. Digits and punctuation do not
/// count as cased, so "A-12 bolt" yields `A-12` while "2020 vintage" yields
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseLeadingToken;

impl ProductCodeHeuristic for UppercaseLeadingToken {
    fn product_code(&self, description: &str) -> Option<String> {
        let (token, _) = description.split_once(' ')?;
        is_upper(token).then(|| token.to_string())
    }
}

fn is_upper(token: &str) -> bool {
    let mut cased = false;
    for c in token.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Produces the description stored with a newly discovered discount.
pub trait DiscountDescriber: Send + Sync {
    fn describe(&self, percentage: Decimal) -> String;
}

impl<F> DiscountDescriber for F
where
    F: Fn(Decimal) -> String + Send + Sync,
{
    fn describe(&self, percentage: Decimal) -> String {
        self(percentage)
    }
}

/// Same text for every discount.
#[derive(Debug, Clone)]
pub struct FixedDiscountDescription(pub String);

impl Default for FixedDiscountDescription {
    fn default() -> Self {
        Self(DEFAULT_DISCOUNT_DESCRIPTION.to_string())
    }
}

impl DiscountDescriber for FixedDiscountDescription {
    fn describe(&self, _percentage: Decimal) -> String {
        self.0.clone()
    }
}
