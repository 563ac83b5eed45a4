//! Record rendering
//!
//! Formats a parsed driver record as the fixed-order text block the
//! downstream dispatch system expects. Missing fields become the display
//! sentinels here and nowhere else; the rest of the pipeline works with
//! plain `Option`s.

use super::parser::DriverRecord;

/// Shown when no driver name could be extracted.
const UNIDENTIFIED_NAME: &str = "NOME NÃO IDENTIFICADO";

/// Shown when a CPF or RG number is missing.
const UNKNOWN_DOCUMENT: &str = "Desconhecido";

/// Shown when a CNH number is missing (feminine agreement in Portuguese).
const UNKNOWN_LICENSE: &str = "Desconhecida";

/// Normalize a plate for display: strip everything but letters and digits,
/// uppercase, and for full-length reads (7+ characters) insert the
/// conventional dash after the third character. Shorter reads are partial
/// plates and pass through untouched rather than crashing the block.
pub fn format_plate(raw: &str) -> String {
    let cleaned: String = raw
        .to_uppercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();

    if cleaned.len() >= 7 {
        format!("{}-{}", &cleaned[..3], &cleaned[3..])
    } else {
        cleaned
    }
}

/// Render one driver record as its output block, blank-line terminated.
///
/// Line order is fixed: origin tag, destination code, name, CPF, CNH, RG,
/// then the vehicle lines. A row with a trailer renders CAVALO + CARRETA;
/// a single vehicle renders TRUCK. A missing tractor plate formats to an
/// empty value, matching the downstream template.
pub fn render_record(record: &DriverRecord, origin_tag: &str) -> String {
    let name = record.name.as_deref().unwrap_or(UNIDENTIFIED_NAME);
    let cpf = record.cpf.as_deref().unwrap_or(UNKNOWN_DOCUMENT);
    let cnh = record.cnh.as_deref().unwrap_or(UNKNOWN_LICENSE);
    let rg = record.rg.as_deref().unwrap_or(UNKNOWN_DOCUMENT);
    let tractor = record
        .tractor_plate
        .as_deref()
        .map(format_plate)
        .unwrap_or_default();

    let mut lines = vec![
        origin_tag.to_string(),
        record.destination.clone(),
        format!("MOT: {name}"),
        format!("CPF:{cpf}"),
        format!("CNH:{cnh}"),
        format!("RG:{rg}"),
    ];

    match record.trailer_plate.as_deref() {
        Some(trailer) => {
            lines.push(format!("CAVALO:{tractor}"));
            lines.push(format!("CARRETA:{}", format_plate(trailer)));
        }
        None => lines.push(format!("TRUCK:{tractor}")),
    }

    lines.join("\n") + "\n\n"
}
