use super::types::PartyData;

/// Builder for [`PartyData`], used to seed companies (e.g. the operating
/// company) outside of invoice extraction.
///
/// ```
/// use fattura::core::*;
///
/// let own = PartyBuilder::new("Cantina Rossi S.r.l.", "00000000099")
///     .address("Via Roma", Some("12"))
///     .city("Siena", "53100", "IT")
///     .email("amministrazione@cantinarossi.it")
///     .build();
/// assert_eq!(own.address, "Via Roma 12");
/// ```
pub struct PartyBuilder {
    party: PartyData,
}

impl PartyBuilder {
    pub fn new(name: impl Into<String>, vat_id: impl Into<String>) -> Self {
        Self {
            party: PartyData {
                name: name.into(),
                vat_id: vat_id.into(),
                ..PartyData::default()
            },
        }
    }

    /// Street plus optional house number, joined the way the extractor joins
    /// `Indirizzo` and `NumeroCivico`.
    pub fn address(mut self, street: &str, number: Option<&str>) -> Self {
        self.party.address = join_address(street, number.unwrap_or(""));
        self
    }

    pub fn city(
        mut self,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        self.party.city = city.into();
        self.party.postal_code = postal_code.into();
        self.party.country = country.into();
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.party.phone = phone.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.party.email = email.into();
        self
    }

    pub fn build(self) -> PartyData {
        self.party
    }
}

/// Join street and house number with a single space, skipping empty parts.
pub fn join_address(street: &str, number: &str) -> String {
    [street.trim(), number.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
