use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use daletou_db::rusqlite::Connection;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;

use daletou_db::db::insert_draw;
use daletou_db::models::{Draw, validate_draw};

const REQUIRED_COLUMNS: [&str; 9] = ["issue", "date", "f1", "f2", "f3", "f4", "f5", "b1", "b2"];

/// Positions des colonnes dans l'en-tête `issue,date,f1..f5,b1,b2,sales,pool`.
struct Columns {
    required: [usize; 9],
    sales: Option<usize>,
    pool: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name));
        let mut required = [0usize; 9];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = find(name).with_context(|| format!("Colonne manquante : '{}'", name))?;
        }
        Ok(Self {
            required,
            sales: find("sales"),
            pool: find("pool"),
        })
    }
}

pub fn parse_date(raw: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Format de date invalide: '{}'", raw))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

fn parse_record(record: &csv::StringRecord, columns: &Columns) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let [issue_idx, date_idx, f1, f2, f3, f4, f5, b1, b2] = columns.required;

    let issue = get(issue_idx)?;
    if issue.is_empty() {
        bail!("Numéro de tirage vide");
    }
    let date = parse_date(&get(date_idx)?)?;

    let front = [get_u8(f1)?, get_u8(f2)?, get_u8(f3)?, get_u8(f4)?, get_u8(f5)?];
    let back = [get_u8(b1)?, get_u8(b2)?];
    validate_draw(&front, &back)?;

    let optional = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(|s| s.trim().to_string()).unwrap_or_default();

    let mut draw = Draw::new(issue, date, front, back);
    draw.sales = optional(columns.sales);
    draw.pool = optional(columns.pool);
    Ok(draw)
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} lignes {msg}")?);

    let result = import_reader(conn, file, &pb)?;
    pb.finish_and_clear();
    Ok(result)
}

pub fn import_reader<R: Read>(conn: &Connection, source: R, pb: &ProgressBar) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let columns = Columns::from_headers(reader.headers().context("En-tête CSV illisible")?)?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        pb.inc(1);
        match record_result {
            Ok(record) => {
                match parse_record(&record, &columns) {
                    Ok(draw) => {
                        match insert_draw(&tx, &draw) {
                            Ok(true) => result.inserted += 1,
                            Ok(false) => result.skipped += 1,
                            Err(e) => {
                                log::warn!("Erreur insertion tirage {}: {}", draw.issue, e);
                                result.errors += 1;
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Erreur parsing ligne {}: {:#}", result.total_records, e);
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}
