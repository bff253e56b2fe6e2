use serde::{Deserialize, Serialize};

/// Language of the messages returned to the uploader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "en")]
    English,
}

impl Locale {
    pub fn success(&self, number: &str, issuer: &str) -> String {
        match self {
            Self::Italian => format!("Fattura n. {number} di {issuer} caricata con successo!"),
            Self::English => format!("Invoice no. {number} from {issuer} uploaded successfully!"),
        }
    }

    pub fn duplicate(&self, number: &str, issuer: &str) -> String {
        match self {
            Self::Italian => {
                format!("La fattura n. {number} di {issuer} è già presente nel sistema.")
            }
            Self::English => format!("Invoice no. {number} from {issuer} is already on file."),
        }
    }

    pub fn error(&self, file_name: &str, cause: &str) -> String {
        match self {
            Self::Italian => format!("Errore nel parsing del file {file_name}: {cause}"),
            Self::English => format!("Error parsing file {file_name}: {cause}"),
        }
    }

    pub fn not_xml(&self) -> String {
        match self {
            Self::Italian => "Il file deve essere in formato XML".to_string(),
            Self::English => "The file must be in XML format".to_string(),
        }
    }
}
