use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use rust_decimal::Decimal;
use serde::Serialize;

use super::heuristics::{
    DiscountDescriber, FixedDiscountDescription, ProductCodeHeuristic, UppercaseLeadingToken,
};
use super::summary::{SummaryBlock, reconcile_totals};
use super::{DISCOUNT_TYPE, FATTURAPA_NS, tags};
use crate::core::amounts::{
    parse_amount, parse_date, parse_line_number, parse_unit_price, try_parse_amount,
};
use crate::core::{FatturaError, PartyData, join_address};

/// Pluggable extraction strategies.
#[derive(Clone)]
pub struct ExtractOptions {
    pub product_code: Arc<dyn ProductCodeHeuristic>,
    pub discount_description: Arc<dyn DiscountDescriber>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            product_code: Arc::new(UppercaseLeadingToken),
            discount_description: Arc::new(FixedDiscountDescription::default()),
        }
    }
}

impl ExtractOptions {
    pub fn with_product_code(mut self, heuristic: impl ProductCodeHeuristic + 'static) -> Self {
        self.product_code = Arc::new(heuristic);
        self
    }

    pub fn with_discount_description(mut self, describer: impl DiscountDescriber + 'static) -> Self {
        self.discount_description = Arc::new(describer);
        self
    }
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions").finish_non_exhaustive()
    }
}

/// Everything the pipeline needs from one FatturaPA document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedInvoice {
    pub number: String,
    /// `TipoDocumento` (TD01 invoice, TD04 credit note, ...).
    pub document_type: String,
    pub issue_date: Option<NaiveDate>,
    pub currency: String,
    pub issuer: PartyData,
    pub receiver: PartyData,
    pub summaries: Vec<SummaryBlock>,
    pub taxable_amount: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    /// True when taxable/VAT were rebuilt from line totals.
    pub totals_from_lines: bool,
    /// `Causale` texts, newline separated.
    pub notes: String,
    pub lines: Vec<ExtractedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedLine {
    pub line_number: u32,
    pub description: String,
    /// Empty when the heuristic found no code.
    pub external_product_code: String,
    pub quantity: Decimal,
    pub unit_of_measure: String,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub line_total: Decimal,
    pub discount: Option<DiscountData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountData {
    pub percentage: Decimal,
    pub description: String,
}

/// Parse a FatturaPA v1.2 document.
///
/// Missing optional fields become empty strings or zero; a missing or
/// malformed issue date becomes `None`. Structural sections (header, both
/// parties with their registry and seat, body, general document data) are
/// required.
pub fn extract(xml: &[u8], options: &ExtractOptions) -> Result<ExtractedInvoice, FatturaError> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| FatturaError::Xml(format!("document is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut p = FatturaParsed::default();
    let mut path: Vec<String> = Vec::new();
    let mut foreign_depth = 0usize;
    let mut buf = String::new();

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let own = in_fatturapa_ns(&ns);
                if path.is_empty() {
                    check_root(&name, own)?;
                }
                path.push(name);
                buf.clear();
                if foreign_depth > 0 || !own {
                    foreign_depth += 1;
                } else {
                    p.open(&path);
                }
            }
            Ok((ns, Event::Empty(e))) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let own = in_fatturapa_ns(&ns);
                if path.is_empty() {
                    check_root(&name, own)?;
                }
                if foreign_depth == 0 && own {
                    path.push(name);
                    p.open(&path);
                    p.close(&path);
                    path.pop();
                }
            }
            Ok((_, Event::Text(e))) => {
                let t = e
                    .unescape()
                    .map_err(|err| FatturaError::Xml(format!("bad text content: {err}")))?;
                buf.push_str(&t);
            }
            Ok((_, Event::CData(e))) => {
                buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok((_, Event::End(_))) => {
                if foreign_depth > 0 {
                    foreign_depth -= 1;
                } else {
                    let value = buf.trim();
                    if !value.is_empty() {
                        p.handle_text(&path, value);
                    }
                    p.close(&path);
                }
                buf.clear();
                path.pop();
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => {
                return Err(FatturaError::Xml(format!("XML parse error: {e}")));
            }
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(FatturaError::Xml(format!(
            "unexpected end of document inside <{}>",
            path.join("/")
        )));
    }
    if !p.root_seen {
        return Err(FatturaError::UnsupportedDocument("document has no root element".into()));
    }

    p.into_extracted(options)
}

fn in_fatturapa_ns(ns: &ResolveResult<'_>) -> bool {
    match ns {
        ResolveResult::Unbound => true,
        ResolveResult::Bound(Namespace(uri)) => *uri == FATTURAPA_NS.as_bytes(),
        ResolveResult::Unknown(_) => false,
    }
}

fn check_root(name: &str, own: bool) -> Result<(), FatturaError> {
    if name != tags::ROOT {
        return Err(FatturaError::UnsupportedDocument(format!(
            "root element is <{name}>, expected <{}>",
            tags::ROOT
        )));
    }
    if !own {
        return Err(FatturaError::UnsupportedDocument(format!(
            "root element is not in the FatturaPA v1.2 namespace ({FATTURAPA_NS})"
        )));
    }
    Ok(())
}

#[derive(Default)]
struct FatturaParsed {
    root_seen: bool,
    header_seen: bool,
    bodies_seen: usize,
    general_seen: bool,

    number: Option<String>,
    document_type: Option<String>,
    issue_date: Option<String>,
    currency: Option<String>,
    total_amount: Option<String>,
    causali: Vec<String>,

    issuer: RawParty,
    receiver: RawParty,

    lines: Vec<RawLine>,
    current_line: Option<RawLine>,

    summaries: Vec<RawSummary>,
    current_summary: Option<RawSummary>,
}

#[derive(Default)]
struct RawParty {
    seen: bool,
    registry_seen: bool,
    seat_seen: bool,
    denominazione: Option<String>,
    nome: Option<String>,
    cognome: Option<String>,
    id_codice: Option<String>,
    codice_fiscale: Option<String>,
    indirizzo: Option<String>,
    numero_civico: Option<String>,
    cap: Option<String>,
    comune: Option<String>,
    nazione: Option<String>,
    telefono: Option<String>,
    email: Option<String>,
}

#[derive(Default)]
struct RawLine {
    numero: Option<String>,
    descrizione: Option<String>,
    quantita: Option<String>,
    unita_misura: Option<String>,
    prezzo_unitario: Option<String>,
    prezzo_totale: Option<String>,
    aliquota: Option<String>,
    adjustment: Option<RawAdjustment>,
    current_adjustment: Option<RawAdjustment>,
}

#[derive(Default)]
struct RawAdjustment {
    tipo: Option<String>,
    percentuale: Option<String>,
}

#[derive(Default)]
struct RawSummary {
    aliquota: Option<String>,
    imponibile: Option<String>,
    imposta: Option<String>,
}

/// Which header party a path points into, if any.
#[derive(Clone, Copy)]
enum Side {
    Issuer,
    Receiver,
}

fn header_side(path: &[String]) -> Option<Side> {
    if path.len() < 3 || path[1] != tags::HEADER {
        return None;
    }
    match path[2].as_str() {
        tags::ISSUER => Some(Side::Issuer),
        tags::RECEIVER => Some(Side::Receiver),
        _ => None,
    }
}

impl FatturaParsed {
    fn party_mut(&mut self, side: Side) -> &mut RawParty {
        match side {
            Side::Issuer => &mut self.issuer,
            Side::Receiver => &mut self.receiver,
        }
    }

    /// Only the first body of a multi-body transmission is read.
    fn in_first_body(&self, path: &[String]) -> bool {
        path.len() >= 2 && path[1] == tags::BODY && self.bodies_seen == 1
    }

    fn open(&mut self, path: &[String]) {
        let leaf = path.last().map(|s| s.as_str()).unwrap_or("");
        match path.len() {
            1 => self.root_seen = true,
            2 if leaf == tags::HEADER => self.header_seen = true,
            2 if leaf == tags::BODY => {
                self.bodies_seen += 1;
                if self.bodies_seen > 1 {
                    tracing::warn!(
                        body = self.bodies_seen,
                        "multi-body transmission, only the first body is ingested"
                    );
                }
            }
            _ => {}
        }

        if let Some(side) = header_side(path) {
            let party = self.party_mut(side);
            match (path.len(), leaf) {
                (3, _) => party.seen = true,
                (4, tags::REGISTRY) => party.registry_seen = true,
                (4, tags::SEAT) => party.seat_seen = true,
                _ => {}
            }
            return;
        }

        if !self.in_first_body(path) {
            return;
        }
        match leaf {
            tags::GENERAL_DOCUMENT if path.len() == 4 && path[2] == tags::GENERAL => {
                self.general_seen = true;
            }
            tags::LINE => self.current_line = Some(RawLine::default()),
            tags::ADJUSTMENT => {
                if let Some(line) = self.current_line.as_mut() {
                    line.current_adjustment = Some(RawAdjustment::default());
                }
            }
            tags::SUMMARY => self.current_summary = Some(RawSummary::default()),
            _ => {}
        }
    }

    fn close(&mut self, path: &[String]) {
        if !self.in_first_body(path) {
            return;
        }
        match path.last().map(|s| s.as_str()).unwrap_or("") {
            tags::LINE => {
                if let Some(line) = self.current_line.take() {
                    self.lines.push(line);
                }
            }
            tags::ADJUSTMENT => {
                if let Some(line) = self.current_line.as_mut() {
                    let block = line.current_adjustment.take();
                    // Only the first discount/surcharge block of a line counts.
                    if line.adjustment.is_none() {
                        line.adjustment = block;
                    }
                }
            }
            tags::SUMMARY => {
                if let Some(summary) = self.current_summary.take() {
                    self.summaries.push(summary);
                }
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, path: &[String], text: &str) {
        let leaf = path.last().map(|s| s.as_str()).unwrap_or("");
        let parent = if path.len() >= 2 {
            path[path.len() - 2].as_str()
        } else {
            ""
        };

        if let Some(side) = header_side(path) {
            let in_registry = path.len() > 4 && path[3] == tags::REGISTRY;
            let party = self.party_mut(side);
            let value = Some(text.to_string());
            match (parent, leaf) {
                ("Anagrafica", "Denominazione") if in_registry => party.denominazione = value,
                ("Anagrafica", "Nome") if in_registry => party.nome = value,
                ("Anagrafica", "Cognome") if in_registry => party.cognome = value,
                (tags::VAT_ID, "IdCodice") if in_registry => party.id_codice = value,
                (tags::REGISTRY, "CodiceFiscale") => party.codice_fiscale = value,
                (tags::SEAT, "Indirizzo") if path.len() == 5 => party.indirizzo = value,
                (tags::SEAT, "NumeroCivico") if path.len() == 5 => party.numero_civico = value,
                (tags::SEAT, "CAP") if path.len() == 5 => party.cap = value,
                (tags::SEAT, "Comune") if path.len() == 5 => party.comune = value,
                (tags::SEAT, "Nazione") if path.len() == 5 => party.nazione = value,
                (tags::CONTACTS, "Telefono") => party.telefono = value,
                (tags::CONTACTS, "Email") => party.email = value,
                _ => {}
            }
            return;
        }

        if !self.in_first_body(path) {
            return;
        }

        // DatiGenerali/DatiGeneraliDocumento direct children
        if path.len() == 5 && path[2] == tags::GENERAL && parent == tags::GENERAL_DOCUMENT {
            let value = Some(text.to_string());
            match leaf {
                "TipoDocumento" => self.document_type = value,
                "Divisa" => self.currency = value,
                "Data" => self.issue_date = value,
                "Numero" => self.number = value,
                "ImportoTotaleDocumento" => self.total_amount = value,
                "Causale" => self.causali.push(text.to_string()),
                _ => {}
            }
            return;
        }

        if let Some(line) = self.current_line.as_mut() {
            let value = Some(text.to_string());
            if parent == tags::LINE {
                match leaf {
                    "NumeroLinea" => line.numero = value,
                    "Descrizione" => line.descrizione = value,
                    "Quantita" => line.quantita = value,
                    "UnitaMisura" => line.unita_misura = value,
                    "PrezzoUnitario" => line.prezzo_unitario = value,
                    "PrezzoTotale" => line.prezzo_totale = value,
                    "AliquotaIVA" => line.aliquota = value,
                    _ => {}
                }
            } else if parent == tags::ADJUSTMENT {
                if let Some(adj) = line.current_adjustment.as_mut() {
                    match leaf {
                        "Tipo" => adj.tipo = value,
                        "Percentuale" => adj.percentuale = value,
                        _ => {}
                    }
                }
            }
            return;
        }

        if parent == tags::SUMMARY {
            if let Some(summary) = self.current_summary.as_mut() {
                let value = Some(text.to_string());
                match leaf {
                    "AliquotaIVA" => summary.aliquota = value,
                    "ImponibileImporto" => summary.imponibile = value,
                    "Imposta" => summary.imposta = value,
                    _ => {}
                }
            }
        }
    }

    fn into_extracted(self, options: &ExtractOptions) -> Result<ExtractedInvoice, FatturaError> {
        if !self.header_seen {
            return Err(FatturaError::MissingElement(tags::HEADER));
        }
        let issuer = self.issuer.into_party(
            "CedentePrestatore",
            "CedentePrestatore/DatiAnagrafici",
            "CedentePrestatore/Sede",
        )?;
        let receiver = self.receiver.into_party(
            "CessionarioCommittente",
            "CessionarioCommittente/DatiAnagrafici",
            "CessionarioCommittente/Sede",
        )?;
        if self.bodies_seen == 0 {
            return Err(FatturaError::MissingElement(tags::BODY));
        }
        if !self.general_seen {
            return Err(FatturaError::MissingElement(
                "DatiGenerali/DatiGeneraliDocumento",
            ));
        }

        let issue_date = self.issue_date.as_deref().and_then(parse_date);
        if issue_date.is_none() {
            tracing::warn!(raw = ?self.issue_date, "invoice has no usable issue date");
        }

        let lines: Vec<ExtractedLine> = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| raw.into_line(idx, options))
            .collect();

        let summaries: Vec<SummaryBlock> = self
            .summaries
            .into_iter()
            .map(|s| SummaryBlock {
                vat_rate: parse_amount(s.aliquota.as_deref().unwrap_or("")),
                taxable_amount: parse_amount(s.imponibile.as_deref().unwrap_or("")),
                vat_amount: parse_amount(s.imposta.as_deref().unwrap_or("")),
            })
            .collect();

        let total_amount = parse_amount(self.total_amount.as_deref().unwrap_or(""));
        let totals = reconcile_totals(
            &summaries,
            lines.iter().map(|l| l.line_total),
            total_amount,
        )?;

        Ok(ExtractedInvoice {
            number: self.number.unwrap_or_default(),
            document_type: self.document_type.unwrap_or_default(),
            issue_date,
            currency: self.currency.unwrap_or_else(|| "EUR".to_string()),
            issuer,
            receiver,
            summaries,
            taxable_amount: totals.taxable_amount,
            vat_amount: totals.vat_amount,
            total_amount,
            totals_from_lines: totals.derived_from_lines,
            notes: self.causali.join("\n"),
            lines,
        })
    }
}

impl RawParty {
    fn into_party(
        self,
        role: &'static str,
        registry: &'static str,
        seat: &'static str,
    ) -> Result<PartyData, FatturaError> {
        if !self.seen {
            return Err(FatturaError::MissingElement(role));
        }
        if !self.registry_seen {
            return Err(FatturaError::MissingElement(registry));
        }
        if !self.seat_seen {
            return Err(FatturaError::MissingElement(seat));
        }

        let vat_id = self
            .id_codice
            .or(self.codice_fiscale)
            .ok_or(FatturaError::MissingIdentifier(role))?;

        let name = match self.denominazione {
            Some(name) => name,
            None => join_address(
                self.nome.as_deref().unwrap_or(""),
                self.cognome.as_deref().unwrap_or(""),
            ),
        };

        Ok(PartyData {
            name,
            vat_id,
            address: join_address(
                self.indirizzo.as_deref().unwrap_or(""),
                self.numero_civico.as_deref().unwrap_or(""),
            ),
            city: self.comune.unwrap_or_default(),
            postal_code: self.cap.unwrap_or_default(),
            country: self.nazione.unwrap_or_default(),
            phone: self.telefono.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
        })
    }
}

impl RawLine {
    fn into_line(self, idx: usize, options: &ExtractOptions) -> ExtractedLine {
        let position = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let line_number = match self.numero.as_deref().and_then(parse_line_number) {
            Some(n) => n,
            None => {
                tracing::warn!(
                    raw = ?self.numero,
                    position,
                    "line has no usable NumeroLinea, numbering by position"
                );
                position
            }
        };

        let description = self.descrizione.unwrap_or_default();
        let external_product_code = options
            .product_code
            .product_code(&description)
            .unwrap_or_default();

        let discount = self.adjustment.and_then(|adj| {
            if adj.tipo.as_deref() != Some(DISCOUNT_TYPE) {
                return None;
            }
            let raw = adj.percentuale?;
            match try_parse_amount(&raw) {
                Some(percentage) => Some(DiscountData {
                    percentage,
                    description: options.discount_description.describe(percentage),
                }),
                None => {
                    tracing::warn!(token = %raw, line_number, "unreadable discount percentage, ignored");
                    None
                }
            }
        });

        ExtractedLine {
            line_number,
            description,
            external_product_code,
            quantity: parse_amount(self.quantita.as_deref().unwrap_or("")),
            unit_of_measure: self.unita_misura.unwrap_or_default(),
            unit_price: parse_unit_price(self.prezzo_unitario.as_deref().unwrap_or("")),
            vat_rate: parse_amount(self.aliquota.as_deref().unwrap_or("")),
            line_total: parse_amount(self.prezzo_totale.as_deref().unwrap_or("")),
            discount,
        }
    }
}
