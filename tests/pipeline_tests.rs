#![cfg(feature = "ingest")]

use std::path::Path;

use chrono::NaiveDate;
use fattura::core::*;
use fattura::ingest::*;
use rust_decimal_macros::dec;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

fn store_with_operating_company() -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .register_operating_company(
            PartyBuilder::new("Cantina Rossi S.r.l.", "IT00000000099")
                .address("Via Roma", Some("12"))
                .city("Siena", "53100", "IT")
                .build(),
        )
        .unwrap();
    store
}

fn ingestor_with(options: IngestOptions) -> Ingestor<MemoryStore> {
    let store = store_with_operating_company();
    let operating = OperatingCompany::resolve(&store).unwrap();
    Ingestor::new(store, operating, options)
}

fn ingestor() -> Ingestor<MemoryStore> {
    ingestor_with(IngestOptions::default())
}

/// Row counts of every table, for "nothing was written" assertions.
fn row_counts(store: &MemoryStore) -> [usize; 6] {
    [
        store.companies().len(),
        store.products().len(),
        store.aliases().len(),
        store.discounts().len(),
        store.invoices().len(),
        store.lines().len(),
    ]
}

// --- Happy path ---

#[test]
fn purchase_end_to_end() {
    let mut ing = ingestor();
    let xml = fixture("purchase_single_line.xml");

    let outcome = ing.ingest(&Upload::new("IT00000000001_2024-001.xml", xml.as_bytes()));

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert_eq!(
        outcome.message(),
        "Fattura n. 2024-001 di Vetreria Toscana S.p.A. caricata con successo!"
    );
    let invoice = outcome.invoice().unwrap().clone();
    assert_eq!(invoice.number, "2024-001");
    assert_eq!(invoice.direction, Direction::Purchase);
    assert_eq!(invoice.issue_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    assert_eq!(invoice.currency, "EUR");
    assert_eq!(invoice.taxable_amount, dec!(50.00));
    assert_eq!(invoice.vat_amount, dec!(11.00));
    assert_eq!(invoice.total_amount, dec!(61.00));
    assert_eq!(invoice.notes, "Fornitura bottiglie");
    assert_eq!(invoice.source_file, "IT00000000001_2024-001.xml");

    let store = ing.store();
    let issuer = store.find_company_by_vat_id("IT00000000001").unwrap().unwrap();
    assert_eq!(invoice.issuer_id, issuer.id);
    assert_eq!(issuer.address, "Via dei Vetrai 4");
    assert!(!issuer.is_operating);
    assert_eq!(invoice.receiver_id, ing.operating_company().id);
    // The receiver is the existing operating company, not a new record.
    assert_eq!(store.companies().len(), 2);

    let lines = store.invoice_lines(invoice.id).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_number, 1);
    assert_eq!(lines[0].quantity, dec!(10));
    assert_eq!(lines[0].unit_price, dec!(5.00));
    assert_eq!(lines[0].vat_rate, dec!(22));
    assert_eq!(lines[0].line_total, dec!(50.00));
    assert_eq!(lines[0].external_product_code, "BTG750");
    assert_eq!(lines[0].discount_id, None);

    assert_eq!(store.products().len(), 1);
    assert_eq!(store.aliases().len(), 1);
    assert_eq!(store.aliases()[0].supplier_id, issuer.id);
}

#[test]
fn sale_with_discount_and_unordered_lines() {
    let mut ing = ingestor();
    let xml = fixture("sale_multi_line.xml");

    let outcome = ing.ingest(&Upload::new("vendita.xml", xml.as_bytes()));
    assert_eq!(outcome.kind(), OutcomeKind::Success, "{}", outcome.message());

    let invoice = outcome.invoice().unwrap();
    assert_eq!(invoice.direction, Direction::Sale);
    assert_eq!(invoice.issuer_id, ing.operating_company().id);
    assert_eq!(invoice.taxable_amount, dec!(85.50));
    assert_eq!(invoice.vat_amount, dec!(16.65));
    assert_eq!(invoice.notes, "Vendita diretta\nRitiro in cantina");

    let store = ing.store();
    let customer = store.company(invoice.receiver_id).unwrap();
    assert_eq!(customer.name, "Mario Rossi");
    assert_eq!(customer.vat_id, "RSSMRA80A01H501U");

    // Lines are written in ascending line-number order.
    let written: Vec<u32> = store.lines().iter().map(|l| l.line_number).collect();
    assert_eq!(written, vec![1, 2]);

    let discounted = &store.lines()[0];
    let discount_id = discounted.discount_id.unwrap();
    let discount = store.discounts().iter().find(|d| d.id == discount_id).unwrap();
    assert_eq!(discount.percentage, dec!(10));
    assert_eq!(discount.description, "Sconto da fattura elettronica");
    assert_eq!(store.lines()[1].discount_id, None);
}

#[test]
fn sale_with_unprefixed_vat_is_issued_by_operating_company() {
    let mut ing = ingestor();
    let xml = fixture("sale_multi_line.xml").replacen(
        "<IdCodice>IT00000000099</IdCodice>",
        "<IdCodice>00000000099</IdCodice>",
        1,
    );
    let upload = Upload::new("vendita.xml", xml.as_bytes());

    let outcome = ing.ingest(&upload);
    assert_eq!(outcome.kind(), OutcomeKind::Success, "{}", outcome.message());
    let invoice = outcome.invoice().unwrap();
    assert_eq!(invoice.direction, Direction::Sale);
    assert_eq!(invoice.issuer_id, ing.operating_company().id);
    // Operating company plus the customer; no second record for 00000000099.
    assert_eq!(ing.store().companies().len(), 2);
    assert!(ing.store().find_company_by_vat_id("00000000099").unwrap().is_none());

    let before = row_counts(ing.store());
    assert_eq!(ing.ingest(&upload).kind(), OutcomeKind::Duplicate);
    assert_eq!(row_counts(ing.store()), before);
}

#[test]
fn purchase_to_unprefixed_vat_is_received_by_operating_company() {
    let mut ing = ingestor();
    let xml = fixture("purchase_single_line.xml").replace(
        "<IdCodice>IT00000000099</IdCodice>",
        "<IdCodice>00000000099</IdCodice>",
    );

    let outcome = ing.ingest(&Upload::new("acquisto.xml", xml.as_bytes()));
    assert_eq!(outcome.kind(), OutcomeKind::Success, "{}", outcome.message());
    assert_eq!(outcome.invoice().unwrap().receiver_id, ing.operating_company().id);
    assert_eq!(ing.store().companies().len(), 2);
}

// --- Duplicate guard ---

#[test]
fn reupload_is_duplicate_and_writes_nothing() {
    let mut ing = ingestor();
    let xml = fixture("purchase_single_line.xml");
    let upload = Upload::new("IT00000000001_2024-001.xml", xml.as_bytes());

    assert_eq!(ing.ingest(&upload).kind(), OutcomeKind::Success);
    let before = row_counts(ing.store());

    let again = ing.ingest(&upload);
    assert_eq!(again.kind(), OutcomeKind::Duplicate);
    assert_eq!(
        again.message(),
        "La fattura n. 2024-001 di Vetreria Toscana S.p.A. è già presente nel sistema."
    );
    assert_eq!(again.invoice(), None);
    assert_eq!(row_counts(ing.store()), before);
}

#[test]
fn same_number_from_other_issuer_is_not_duplicate() {
    let mut ing = ingestor();
    let xml = fixture("purchase_single_line.xml");
    let other = xml
        .replace("<IdCodice>IT00000000001</IdCodice>", "<IdCodice>IT00000000002</IdCodice>")
        .replace("Vetreria Toscana S.p.A.", "Vetreria Ligure S.r.l.");

    assert_eq!(ing.ingest(&Upload::new("a.xml", xml.as_bytes())).kind(), OutcomeKind::Success);
    assert_eq!(ing.ingest(&Upload::new("b.xml", other.as_bytes())).kind(), OutcomeKind::Success);
    assert_eq!(ing.store().invoices().len(), 2);
    // Same description, different supplier: one product, two aliases.
    assert_eq!(ing.store().products().len(), 1);
    assert_eq!(ing.store().aliases().len(), 2);
}

// --- Errors and atomicity ---

#[test]
fn missing_date_fails_and_rolls_back() {
    let mut ing = ingestor();
    let before = row_counts(ing.store());
    let xml = fixture("purchase_missing_date.xml");

    let outcome = ing.ingest(&Upload::new("purchase_missing_date.xml", xml.as_bytes()));

    assert_eq!(outcome.kind(), OutcomeKind::Error);
    assert!(
        outcome
            .message()
            .starts_with("Errore nel parsing del file purchase_missing_date.xml: "),
        "{}",
        outcome.message()
    );
    assert!(outcome.message().contains("issue_date"));
    // The issuer created before the header failed is gone too.
    assert_eq!(row_counts(ing.store()), before);
    assert!(ing.store().find_company_by_vat_id("IT00000000007").unwrap().is_none());
}

#[test]
fn failing_line_rolls_back_header_and_master_data() {
    let mut ing = ingestor();
    let before = row_counts(ing.store());
    let xml = fixture("purchase_single_line.xml");
    let start = xml.find("<DettaglioLinee>").unwrap();
    let end = xml.find("</DettaglioLinee>").unwrap() + "</DettaglioLinee>".len();
    let block = &xml[start..end];
    let doubled = xml.replacen(block, &format!("{block}{block}"), 1);

    let outcome = ing.ingest(&Upload::new("doppia.xml", doubled.as_bytes()));

    assert_eq!(outcome.kind(), OutcomeKind::Error);
    assert!(outcome.message().contains("line_number"), "{}", outcome.message());
    assert_eq!(row_counts(ing.store()), before);
}

#[test]
fn summary_overflow_is_an_error_not_a_panic() {
    let mut ing = ingestor();
    let before = row_counts(ing.store());
    let xml = fixture("purchase_single_line.xml");
    let start = xml.find("<DatiRiepilogo>").unwrap();
    let end = xml.find("</DatiRiepilogo>").unwrap() + "</DatiRiepilogo>".len();
    let huge = xml[start..end].replace(
        "<ImponibileImporto>50.00</ImponibileImporto>",
        "<ImponibileImporto>79228162514264337593543950335</ImponibileImporto>",
    );
    let overflowing = xml.replacen(&xml[start..end], &format!("{huge}{huge}"), 1);

    let outcome = ing.ingest(&Upload::new("enorme.xml", overflowing.as_bytes()));

    assert_eq!(outcome.kind(), OutcomeKind::Error);
    assert!(
        outcome.message().starts_with("Errore nel parsing del file enorme.xml: "),
        "{}",
        outcome.message()
    );
    assert!(outcome.message().contains("ImponibileImporto"));
    assert_eq!(row_counts(ing.store()), before);
}

#[test]
fn line_total_overflow_is_an_error_not_a_panic() {
    let mut ing = ingestor();
    let xml = fixture("purchase_zero_summary.xml")
        .replace("<PrezzoTotale>20.00</PrezzoTotale>", "<PrezzoTotale>79228162514264337593543950335</PrezzoTotale>")
        .replace("<PrezzoTotale>10.00</PrezzoTotale>", "<PrezzoTotale>79228162514264337593543950335</PrezzoTotale>");

    let outcome = ing.ingest(&Upload::new("righe.xml", xml.as_bytes()));

    assert_eq!(outcome.kind(), OutcomeKind::Error);
    assert!(outcome.message().contains("PrezzoTotale"), "{}", outcome.message());
}

#[test]
fn non_xml_file_name_is_rejected() {
    let mut ing = ingestor();
    let before = row_counts(ing.store());
    let xml = fixture("purchase_single_line.xml");

    let outcome = ing.ingest(&Upload::new("fattura.pdf", xml.as_bytes()));
    assert_eq!(outcome.kind(), OutcomeKind::Error);
    assert_eq!(outcome.message(), "Il file deve essere in formato XML");
    assert_eq!(row_counts(ing.store()), before);
}

#[test]
fn extension_gate_can_be_disabled() {
    let options = IngestConfig::from_toml("require_xml_extension = false")
        .unwrap()
        .options();
    let mut ing = ingestor_with(options);
    let xml = fixture("purchase_single_line.xml");

    let outcome = ing.ingest(&Upload::new("upload.bin", xml.as_bytes()));
    assert_eq!(outcome.kind(), OutcomeKind::Success);
}

#[test]
fn malformed_document_names_the_file() {
    let mut ing = ingestor();
    let outcome = ing.ingest(&Upload::new("rotta.xml", b"<FatturaElettronica><Header>"));
    assert_eq!(outcome.kind(), OutcomeKind::Error);
    assert!(outcome.message().starts_with("Errore nel parsing del file rotta.xml: "));
}

#[test]
fn english_messages() {
    let options = IngestConfig::from_toml("locale = \"en\"").unwrap().options();
    let mut ing = ingestor_with(options);
    let xml = fixture("purchase_single_line.xml");
    let upload = Upload::new("a.xml", xml.as_bytes());

    assert_eq!(
        ing.ingest(&upload).message(),
        "Invoice no. 2024-001 from Vetreria Toscana S.p.A. uploaded successfully!"
    );
    assert_eq!(
        ing.ingest(&upload).message(),
        "Invoice no. 2024-001 from Vetreria Toscana S.p.A. is already on file."
    );
    assert_eq!(
        ing.ingest(&Upload::new("a.txt", xml.as_bytes())).message(),
        "The file must be in XML format"
    );
}

// --- Batches ---

#[test]
fn batch_reports_one_entry_per_file_in_order() {
    let mut ing = ingestor();
    let purchase = fixture("purchase_single_line.xml");
    let sale = fixture("sale_multi_line.xml");

    let reports = ing.ingest_batch([
        Upload::new("acquisto.xml", purchase.as_bytes()),
        Upload::new("acquisto-bis.xml", purchase.as_bytes()),
        Upload::new("scansione.pdf", b"%PDF-1.7"),
        Upload::new("vendita.xml", sale.as_bytes()),
    ]);

    let statuses: Vec<OutcomeKind> = reports.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeKind::Success,
            OutcomeKind::Duplicate,
            OutcomeKind::Error,
            OutcomeKind::Success
        ]
    );
    let names: Vec<&str> = reports.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["acquisto.xml", "acquisto-bis.xml", "scansione.pdf", "vendita.xml"]);
    assert_eq!(reports[0].invoice_id, Some(InvoiceId(1)));
    assert_eq!(reports[1].invoice_id, None);
    assert_eq!(reports[3].invoice_id, Some(InvoiceId(2)));
}

#[test]
fn report_json() {
    let mut ing = ingestor();
    let xml = fixture("purchase_single_line.xml");
    let reports = ing.ingest_batch([Upload::new("IT00000000001_2024-001.xml", xml.as_bytes())]);

    let json = serde_json::to_string_pretty(&reports[0]).unwrap();
    insta::assert_snapshot!(json, @r#"
    {
      "filename": "IT00000000001_2024-001.xml",
      "status": "success",
      "invoice_id": 1,
      "message": "Fattura n. 2024-001 di Vetreria Toscana S.p.A. caricata con successo!"
    }
    "#);
}

// --- Snapshot persistence ---

#[test]
fn saved_store_keeps_duplicate_guard() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let xml = fixture("purchase_single_line.xml");
    let upload = Upload::new("a.xml", xml.as_bytes());

    let mut ing = ingestor();
    assert_eq!(ing.ingest(&upload).kind(), OutcomeKind::Success);
    let counts = row_counts(ing.store());
    ing.into_store().save(&path).unwrap();

    let store = MemoryStore::load(&path).unwrap();
    assert_eq!(row_counts(&store), counts);
    let operating = OperatingCompany::resolve(&store).unwrap();
    let mut ing = Ingestor::new(store, operating, IngestOptions::default());
    assert_eq!(ing.ingest(&upload).kind(), OutcomeKind::Duplicate);

    // Sequences survive the round trip: the next invoice gets a fresh id.
    let sale = fixture("sale_multi_line.xml");
    let outcome = ing.ingest(&Upload::new("b.xml", sale.as_bytes()));
    assert_eq!(outcome.invoice().unwrap().id, InvoiceId(2));
}

#[test]
fn missing_snapshot_is_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(row_counts(&store), [0; 6]);
}
