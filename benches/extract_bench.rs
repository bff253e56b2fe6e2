use criterion::{Criterion, black_box, criterion_group, criterion_main};

use fattura::core::PartyBuilder;
use fattura::fatturapa::{self, ExtractOptions};
use fattura::ingest::{IngestOptions, Ingestor, MemoryStore, OperatingCompany, Upload};

const NS: &str = "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2";

fn party(role: &str, vat: &str, name: &str) -> String {
    format!(
        "<{role}><DatiAnagrafici><IdFiscaleIVA><IdPaese>IT</IdPaese><IdCodice>{vat}</IdCodice></IdFiscaleIVA>\
         <Anagrafica><Denominazione>{name}</Denominazione></Anagrafica></DatiAnagrafici>\
         <Sede><Indirizzo>Via Roma</Indirizzo><NumeroCivico>1</NumeroCivico><CAP>53100</CAP>\
         <Comune>Siena</Comune><Nazione>IT</Nazione></Sede></{role}>"
    )
}

/// Purchase invoice `number` from `issuer_vat` with `lines` detail lines.
fn build_document(number: &str, issuer_vat: &str, lines: usize) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <p:FatturaElettronica versione=\"FPR12\" xmlns:p=\"{NS}\"><FatturaElettronicaHeader>{}{}\
         </FatturaElettronicaHeader><FatturaElettronicaBody><DatiGenerali><DatiGeneraliDocumento>\
         <TipoDocumento>TD01</TipoDocumento><Divisa>EUR</Divisa><Data>2024-06-15</Data>\
         <Numero>{number}</Numero><ImportoTotaleDocumento>{}.00</ImportoTotaleDocumento>\
         </DatiGeneraliDocumento></DatiGenerali><DatiBeniServizi>",
        party("CedentePrestatore", issuer_vat, "Fornitore Bench S.r.l."),
        party("CessionarioCommittente", "IT00000000099", "Cantina Rossi S.r.l."),
        lines as u64 * 122 / 10,
    );
    for i in 1..=lines {
        let discount = if i % 5 == 0 {
            "<ScontoMaggiorazione><Tipo>SC</Tipo><Percentuale>5.00</Percentuale></ScontoMaggiorazione>"
        } else {
            ""
        };
        xml.push_str(&format!(
            "<DettaglioLinee><NumeroLinea>{i}</NumeroLinea>\
             <Descrizione>ART{i:04} Articolo {i}</Descrizione><Quantita>2.00</Quantita>\
             <UnitaMisura>PZ</UnitaMisura><PrezzoUnitario>5.00000000</PrezzoUnitario>{discount}\
             <PrezzoTotale>10.00</PrezzoTotale><AliquotaIVA>22.00</AliquotaIVA></DettaglioLinee>"
        ));
    }
    xml.push_str(&format!(
        "<DatiRiepilogo><AliquotaIVA>22.00</AliquotaIVA><ImponibileImporto>{}.00</ImponibileImporto>\
         <Imposta>{}.00</Imposta></DatiRiepilogo></DatiBeniServizi></FatturaElettronicaBody>\
         </p:FatturaElettronica>",
        lines * 10,
        lines as u64 * 22 / 10,
    ));
    xml
}

fn bench_extract(c: &mut Criterion) {
    let xml = build_document("BENCH-001", "IT00000000001", 10);
    let options = ExtractOptions::default();
    c.bench_function("extract_10_lines", |b| {
        b.iter(|| black_box(fatturapa::extract(black_box(xml.as_bytes()), &options)));
    });
}

fn bench_extract_1000_lines(c: &mut Criterion) {
    let xml = build_document("BENCH-1000", "IT00000000001", 1000);
    let options = ExtractOptions::default();
    c.bench_function("extract_1000_lines", |b| {
        b.iter(|| black_box(fatturapa::extract(black_box(xml.as_bytes()), &options)));
    });
}

fn bench_ingest_100_invoices(c: &mut Criterion) {
    let documents: Vec<(String, String)> = (1..=100)
        .map(|n| {
            let issuer = format!("IT{:011}", n % 7 + 1);
            (
                format!("FT-{n:04}.xml"),
                build_document(&format!("FT-{n:04}"), &issuer, 5),
            )
        })
        .collect();

    c.bench_function("ingest_100_invoices", |b| {
        b.iter(|| {
            let mut store = MemoryStore::new();
            store
                .register_operating_company(
                    PartyBuilder::new("Cantina Rossi S.r.l.", "IT00000000099").build(),
                )
                .unwrap();
            let operating = OperatingCompany::resolve(&store).unwrap();
            let mut ingestor = Ingestor::new(store, operating, IngestOptions::default());
            let reports = ingestor.ingest_batch(
                documents
                    .iter()
                    .map(|(name, xml)| Upload::new(name, xml.as_bytes())),
            );
            black_box(reports)
        });
    });
}

criterion_group!(
    benches,
    bench_extract,
    bench_extract_1000_lines,
    bench_ingest_100_invoices,
);
criterion_main!(benches);
