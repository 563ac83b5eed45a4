//! Record parsing
//!
//! Turns one reconstructed table row into a typed driver record. The row
//! text is noisy OCR output, so every field comes out of layered
//! pattern-matching: match a known shape, claim it, strip it from the
//! working text, and derive the next field from what is left. The stage
//! order is load-bearing (see [`RecordParser::parse_row`]).

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::ParsingConfig;

use super::rows::Row;

/// Vehicle plates: Mercosul format (3 letters, digit, letter-or-digit,
/// 2 digits) first, legacy format (3 letters, 4 digits) second. Matched
/// against text with dashes already stripped.
static PLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{3}\d[A-Z0-9]\d{2}|[A-Z]{3}\d{4}").unwrap());

/// Document number candidates: any digit run of 5 or more.
static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5,}").unwrap());

/// A single digit standing alone as a word (the destination sequence number).
static LONE_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d)\b").unwrap());

/// Any digit run, for scrubbing leftovers before name extraction.
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Everything that cannot be part of an uppercased Portuguese name.
static NAME_NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-ZÁÉÍÓÚÃÕÂÊÎÔÛÇ\s]+").unwrap());

/// Destination state used when no state token matches.
const UNKNOWN_STATE: &str = "XX";

/// Destination sequence used when no lone digit is found.
const DEFAULT_SEQUENCE: &str = "1";

/// Document number lengths: a CPF is exactly 11 digits, a CNH at least 9.
const CPF_LEN: usize = 11;
const CNH_MIN_LEN: usize = 9;

/// A parsed driver entry. Missing fields stay `None` here; the display
/// sentinels are applied only when the record is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRecord {
    /// Destination code: state abbreviation plus sequence digit ("SP 2")
    pub destination: String,
    /// Driver name, at most two words
    pub name: Option<String>,
    /// 11-digit national ID
    pub cpf: Option<String>,
    /// Driver's license number (9+ digits)
    pub cnh: Option<String>,
    /// General registry document number
    pub rg: Option<String>,
    /// Tractor/truck plate
    pub tractor_plate: Option<String>,
    /// Trailer plate, when the row lists a second vehicle
    pub trailer_plate: Option<String>,
}

/// Document numbers claimed from a row's digit runs.
#[derive(Debug, Default)]
struct Documents {
    cpf: Option<String>,
    cnh: Option<String>,
    rg: Option<String>,
}

/// Row-to-record parser, configured once per extraction run.
pub struct RecordParser {
    /// Skip markers, uppercased for substring matching
    skip_keywords: Vec<String>,
    /// Whole-word state abbreviations (destination candidates)
    state_re: Regex,
    /// Whole-word state and city tokens stripped before name extraction
    strip_tokens_re: Regex,
}

impl RecordParser {
    /// Build a parser from the configured token sets.
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        let skip_keywords = config
            .skip_keywords
            .iter()
            .map(|k| k.to_uppercase())
            .collect();

        let state_re = Regex::new(&word_alternation(&config.state_tokens))?;

        let mut strip_tokens: Vec<String> = config.state_tokens.clone();
        strip_tokens.extend(config.city_tokens.iter().cloned());
        let strip_tokens_re = Regex::new(&word_alternation(&strip_tokens))?;

        Ok(Self {
            skip_keywords,
            state_re,
            strip_tokens_re,
        })
    }

    /// Parse one row into a driver record.
    ///
    /// Stages run in a fixed order, each feeding the next stage's working
    /// text: skip filter, plate extraction, document numbers, name,
    /// discard rule, destination. Destination alone runs against the
    /// original row text rather than the stripped text; that asymmetry is
    /// inherited from the field-proven heuristic and kept on purpose.
    ///
    /// Returns `None` for header/noise rows: either a skip keyword
    /// matched, or the row yielded neither a name nor a tractor plate.
    pub fn parse_row(&self, row: &Row) -> Option<DriverRecord> {
        let full_text = row.joined_text().to_uppercase();

        if let Some(keyword) = self.skip_keywords.iter().find(|k| full_text.contains(*k)) {
            debug!("skipping header row (matched {:?}): {}", keyword, full_text);
            return None;
        }

        let dashless = full_text.replace('-', "");
        let (tractor_plate, trailer_plate, plate_stripped) = extract_plates(&dashless);

        let documents = extract_documents(&plate_stripped);

        let name = self.extract_name(&plate_stripped, &documents);

        if name.is_none() && tractor_plate.is_none() {
            debug!("discarding row with no name and no plate: {}", full_text);
            return None;
        }

        let destination = self.extract_destination(&full_text);

        Some(DriverRecord {
            destination,
            name,
            cpf: documents.cpf,
            cnh: documents.cnh,
            rg: documents.rg,
            tractor_plate,
            trailer_plate,
        })
    }

    /// Derive the driver name from whatever text survives field stripping.
    ///
    /// Removes the claimed document numbers, known state/city tokens, and
    /// remaining digits, then keeps only name characters. Words of one
    /// character are stray OCR noise and dropped. At most the first two
    /// words are kept ("first-name last-name"); middle names are ignored.
    fn extract_name(&self, plate_stripped: &str, documents: &Documents) -> Option<String> {
        let mut text = plate_stripped.to_string();
        for number in [&documents.cpf, &documents.cnh, &documents.rg]
            .into_iter()
            .flatten()
        {
            text = text.replace(number.as_str(), "");
        }

        let text = self.strip_tokens_re.replace_all(&text, "");
        let text = DIGITS_RE.replace_all(&text, "");
        let text = NAME_NOISE_RE.replace_all(&text, "");

        let words: Vec<&str> = text
            .split_whitespace()
            .filter(|w| w.chars().count() > 1)
            .collect();

        match words.as_slice() {
            [] => None,
            [only] => Some((*only).to_string()),
            [first, second, ..] => Some(format!("{first} {second}")),
        }
    }

    /// Extract the destination code from the *original* row text.
    ///
    /// The destination state is conventionally listed after origin
    /// markers, so the last whole-word state match wins. The sequence
    /// number is the first single digit standing alone as a word.
    fn extract_destination(&self, full_text: &str) -> String {
        let state = self
            .state_re
            .find_iter(full_text)
            .last()
            .map_or(UNKNOWN_STATE, |m| m.as_str());

        let sequence = LONE_DIGIT_RE
            .captures(full_text)
            .and_then(|c| c.get(1))
            .map_or(DEFAULT_SEQUENCE, |m| m.as_str());

        format!("{state} {sequence}")
    }
}

/// Claim up to two vehicle plates from the dash-stripped row text, in
/// left-to-right order: first match is the tractor, second the trailer.
/// Returns the plates plus the text with every plate match removed.
fn extract_plates(dashless: &str) -> (Option<String>, Option<String>, String) {
    let mut matches = PLATE_RE.find_iter(dashless).map(|m| m.as_str().to_string());
    let tractor = matches.next();
    let trailer = matches.next();

    let stripped = PLATE_RE.replace_all(dashless, "").into_owned();
    (tractor, trailer, stripped)
}

/// Claim document numbers from the plate-stripped text.
///
/// Candidates are digit runs of 5+ digits, in reading order. The CPF has
/// a fixed length of exactly 11 digits, so it is claimed first (the last
/// such run) to keep it from being swallowed by the looser 9+-digit CNH
/// test. The first remaining 9+-digit run becomes the CNH, and the first
/// leftover run the RG. A number the OCR read twice is removed at its
/// first occurrence, leaving the later copy in the pool for the CNH test.
fn extract_documents(plate_stripped: &str) -> Documents {
    let mut runs: Vec<String> = DIGIT_RUN_RE
        .find_iter(plate_stripped)
        .map(|m| m.as_str().to_string())
        .collect();

    let cpf = runs.iter().rposition(|r| r.len() == CPF_LEN).map(|last| {
        let value = runs[last].clone();
        if let Some(first) = runs.iter().position(|r| *r == value) {
            runs.remove(first);
        }
        value
    });

    let cnh = runs
        .iter()
        .position(|r| r.len() >= CNH_MIN_LEN)
        .map(|i| runs.remove(i));

    let rg = if runs.is_empty() {
        None
    } else {
        Some(runs.remove(0))
    };

    Documents { cpf, cnh, rg }
}

/// Build a `\b(A|B|...)\b` whole-word alternation from configured tokens.
fn word_alternation(tokens: &[String]) -> String {
    let escaped: Vec<String> = tokens.iter().map(|t| regex::escape(t)).collect();
    format!(r"\b({})\b", escaped.join("|"))
}
