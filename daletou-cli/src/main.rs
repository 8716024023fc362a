mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::de::DeserializeOwned;

use daletou_db::db::{count_draws, db_path, fetch_draws_between, fetch_last_draws, insert_draw, migrate, open_db};
use daletou_db::models::{Draw, Region, validate_draw};
use daletou_db::rusqlite::Connection;
use daletou_gen::analysis::{HotColdMode, HotColdRule, compute_stats};
use daletou_gen::constraints::{ConsecutiveRule, OddEven, RunMode, SumRange};
use daletou_gen::pool::numbers_in_blocks;
use daletou_gen::{ConstraintSpec, Generator, GeneratorConfig, PoolOverrides};
use crate::display::{
    display_draws, display_generation, display_import_summary, display_stats, display_sum_chart,
};

const EMPTY_DB: &str = "Base vide. Lancez d'abord : daletou import";

#[derive(Parser)]
#[command(name = "daletou", about = "Générateur de combinaisons et statistiques du Super Lotto")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV (issue,date,f1..f5,b1,b2,sales,pool)
        #[arg(short, long, default_value = "data/dlt_history.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher les statistiques (fréquences, retards, chauds et froids)
    Stats {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "100")]
        window: u32,

        /// Premier numéro de tirage inclus (remplace --window)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Dernier numéro de tirage inclus
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Nombre de numéros chauds/froids par zone
        #[arg(short, long, default_value = "5")]
        top: usize,

        /// Afficher l'évolution de la somme de la zone avant
        #[arg(long)]
        chart: bool,
    },

    /// Générer des combinaisons sous contraintes
    Generate(GenerateArgs),

    /// Ajouter un tirage manuellement
    Add,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Nombre de combinaisons
    #[arg(short, long, default_value = "5")]
    count: usize,

    /// Seed pour la reproductibilité
    #[arg(long)]
    seed: Option<u64>,

    /// Fichier JSON de règles (ConstraintSpec)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Fichier JSON de configuration du générateur
    #[arg(long)]
    config: Option<PathBuf>,

    /// Somme minimale de la zone avant
    #[arg(long)]
    sum_min: Option<u32>,

    /// Somme maximale de la zone avant
    #[arg(long)]
    sum_max: Option<u32>,

    /// Nombre d'impairs dans la zone avant
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    odd: Option<u8>,

    #[arg(long, value_delimiter = ',')]
    front_include: Vec<u8>,

    #[arg(long, value_delimiter = ',')]
    front_exclude: Vec<u8>,

    #[arg(long, value_delimiter = ',')]
    back_include: Vec<u8>,

    #[arg(long, value_delimiter = ',')]
    back_exclude: Vec<u8>,

    /// Nombre de paires consécutives dans la zone avant
    #[arg(long)]
    consecutive: Option<usize>,

    #[arg(long, default_value = "exact")]
    consecutive_mode: RunMode,

    /// Pool restreint de la zone avant
    #[arg(long, value_delimiter = ',')]
    front_pool: Option<Vec<u8>>,

    /// Pool restreint de la zone arrière
    #[arg(long, value_delimiter = ',')]
    back_pool: Option<Vec<u8>>,

    /// Pool de la zone avant limité aux blocs nommés (ex: A,C)
    #[arg(long, value_delimiter = ',')]
    front_zones: Option<Vec<String>>,

    /// Pool de la zone arrière limité aux blocs nommés
    #[arg(long, value_delimiter = ',')]
    back_zones: Option<Vec<String>>,

    /// Poids des blocs de la zone avant (ex: A=2,B=1)
    #[arg(long, value_delimiter = ',', value_parser = parse_block_weight)]
    front_blocks: Vec<(String, f64)>,

    /// Poids des blocs de la zone arrière
    #[arg(long, value_delimiter = ',', value_parser = parse_block_weight)]
    back_blocks: Vec<(String, f64)>,

    /// Numéros chauds des derniers tirages : exclus ou favorisés
    #[arg(long)]
    hot_cold: Option<HotColdMode>,

    /// Nombre de tirages récents pour les numéros chauds
    #[arg(long, default_value = "20")]
    recent: usize,

    #[arg(long, default_value = "2")]
    front_top: usize,

    #[arg(long, default_value = "1")]
    back_top: usize,

    /// Sortie JSON
    #[arg(long)]
    json: bool,
}

fn parse_block_weight(raw: &str) -> Result<(String, f64), String> {
    let (name, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("format attendu NOM=POIDS, reçu '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("nom de bloc vide dans '{raw}'"));
    }
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|_| format!("poids invalide dans '{raw}'"))?;
    Ok((name.to_string(), weight))
}

impl GenerateArgs {
    /// Les options de la ligne de commande priment sur le fichier de règles.
    fn apply_rules(&self, spec: &mut ConstraintSpec) {
        if self.sum_min.is_some() || self.sum_max.is_some() {
            let current = spec.sum_front.unwrap_or_default();
            spec.sum_front = Some(SumRange {
                min: self.sum_min.or(current.min),
                max: self.sum_max.or(current.max),
            });
        }
        if let Some(odd) = self.odd {
            spec.odd_even_front = Some(OddEven::with_odd(odd as usize));
        }
        if let Some(count) = self.consecutive {
            spec.consecutive = Some(ConsecutiveRule {
                count,
                mode: self.consecutive_mode,
            });
        }
        spec.front_include.extend(&self.front_include);
        spec.front_exclude.extend(&self.front_exclude);
        spec.back_include.extend(&self.back_include);
        spec.back_exclude.extend(&self.back_exclude);
        spec.front_blocks.extend(self.front_blocks.iter().cloned());
        spec.back_blocks.extend(self.back_blocks.iter().cloned());
    }

    fn overrides(&self, config: &GeneratorConfig) -> Result<PoolOverrides> {
        let region_pool = |region: Region, pool: &Option<Vec<u8>>, zones: &Option<Vec<String>>| -> Result<Option<Vec<u8>>> {
            match (pool, zones) {
                (Some(_), Some(_)) => bail!("Zone {region} : --{region}-pool et --{region}-zones sont exclusifs"),
                (Some(pool), None) => Ok(Some(pool.clone())),
                (None, Some(names)) => {
                    for name in names {
                        if config.find_block(region, name).is_none() {
                            bail!("Zone {region} : bloc inconnu '{name}'");
                        }
                    }
                    Ok(Some(numbers_in_blocks(config.blocks(region), names)))
                }
                (None, None) => Ok(None),
            }
        };
        Ok(PoolOverrides {
            front: region_pool(Region::Front, &self.front_pool, &self.front_zones)?,
            back: region_pool(Region::Back, &self.back_pool, &self.back_zones)?,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats {
            window,
            from,
            to,
            top,
            chart,
        } => cmd_stats(&conn, window, from.zip(to), top, chart),
        Command::Generate(args) => cmd_generate(&conn, &args),
        Command::Add => cmd_add(&conn),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("JSON invalide dans {}", path.display()))
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    log::info!(
        "Import {} : {} insérés, {} doublons, {} erreurs",
        file.display(),
        result.inserted,
        result.skipped,
        result.errors
    );
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("{EMPTY_DB}");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, window: u32, range: Option<(String, String)>, top: usize, chart: bool) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("{EMPTY_DB}");
        return Ok(());
    }

    let draws = match range {
        Some((from, to)) => fetch_draws_between(conn, &from, &to)?,
        None => fetch_last_draws(conn, window.min(n))?,
    };
    if draws.is_empty() {
        println!("Aucun tirage dans la plage demandée.");
        return Ok(());
    }

    let front_stats = compute_stats(&draws, Region::Front);
    let back_stats = compute_stats(&draws, Region::Back);

    let rule = HotColdRule {
        recent: draws.len(),
        front_top: top,
        back_top: top.min(Region::Back.size()),
        mode: HotColdMode::Weight,
    };
    let selection = rule.apply(&draws, &mut ConstraintSpec::default());

    display_stats(&front_stats, &back_stats, &selection, draws.len());
    if chart {
        display_sum_chart(&draws);
    }
    Ok(())
}

fn cmd_generate(conn: &Connection, args: &GenerateArgs) -> Result<()> {
    let config: GeneratorConfig = match &args.config {
        Some(path) => load_json(path)?,
        None => GeneratorConfig::default(),
    };
    let mut spec: ConstraintSpec = match &args.rules {
        Some(path) => load_json(path)?,
        None => ConstraintSpec::default(),
    };
    args.apply_rules(&mut spec);
    let overrides = args.overrides(&config)?;

    if let Some(mode) = args.hot_cold {
        if count_draws(conn)? == 0 {
            bail!("{EMPTY_DB}");
        }
        let rule = HotColdRule {
            recent: args.recent,
            front_top: args.front_top,
            back_top: args.back_top,
            mode,
        };
        let recent = u32::try_from(args.recent).unwrap_or(u32::MAX);
        let draws = fetch_last_draws(conn, recent)?;
        let selection = rule.apply(&draws, &mut spec);
        log::info!(
            "Chauds sur {} tirages : avant {:?}, arrière {:?} ; froids : avant {:?}, arrière {:?}",
            draws.len(),
            selection.hot_front,
            selection.hot_back,
            selection.cold_front,
            selection.cold_back
        );
    }

    let generator = Generator::new(config)?;
    let seed = args.seed.unwrap_or_else(|| rand::rng().random::<u64>());
    log::info!("Seed : {seed}");
    let mut rng = StdRng::seed_from_u64(seed);

    let generation = generator.generate(args.count, &spec, &overrides, &mut rng)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&generation)?);
    } else {
        println!("Seed : {seed}");
        display_generation(&generation, args.count);
    }
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let issue = prompt("Numéro du tirage (ex: 25003) : ")?;
    if issue.is_empty() {
        bail!("Numéro de tirage vide");
    }
    let date = import::parse_date(&prompt("Date (AAAA-MM-JJ) : ")?)?;

    let front = prompt_numbers::<5>(Region::Front)?;
    let back = prompt_numbers::<2>(Region::Back)?;
    validate_draw(&front, &back)?;

    let draw = Draw::new(issue, date, front, back);

    println!("\nTirage à insérer :");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        let inserted = insert_draw(conn, &draw)?;
        if inserted {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

/// N numéros distincts de la zone, saisis jusqu'à obtenir une entrée valide.
fn prompt_numbers<const N: usize>(region: Region) -> Result<[u8; N]> {
    loop {
        let input = prompt(&format!(
            "{} : {} numéros (séparés par des espaces, 1-{}) : ",
            region.label(),
            N,
            region.size()
        ))?;
        match parse_numbers::<N>(&input, region) {
            Some(numbers) => return Ok(numbers),
            None => println!("Entrez exactement {N} numéros distincts entre 1 et {}. Réessayez.", region.size()),
        }
    }
}

fn parse_numbers<const N: usize>(input: &str, region: Region) -> Option<[u8; N]> {
    let values: Vec<u8> = input
        .split_whitespace()
        .map(|s| s.parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    let numbers: [u8; N] = values.try_into().ok()?;
    let distinct = numbers.iter().enumerate().all(|(i, n)| !numbers[..i].contains(n));
    (distinct && numbers.iter().all(|&n| region.contains(n))).then_some(numbers)
}
