//! `carlot` — manage cars from the command line.
//!
//! Every mutation goes through the hooked repository, so adding a car without
//! `--bio` asks the text service for one and adds/deletes record an inventory
//! snapshot.
//!
//! Usage:
//!   carlot add --model Civic --brand Honda --year 2020 --value 85000
//!   carlot update <id> --value 80000
//!   carlot delete <id>
//!   carlot list
//!   carlot snapshots [--latest]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use carlot_core::CarId;
use carlot_infra::{build_inventory, AppConfig};
use carlot_inventory::{CarChanges, NewCar};
use carlot_observability::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "carlot", about = "Car inventory with generated descriptions")]
struct Args {
    /// Human-readable logs instead of JSON.
    #[arg(long, global = true)]
    pretty_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a car. Without --bio a description is generated.
    Add {
        #[arg(long)]
        model: String,
        #[arg(long)]
        brand: String,
        #[arg(long = "year")]
        model_year: i32,
        #[arg(long)]
        value: Decimal,
        #[arg(long)]
        bio: Option<String>,
    },
    /// Change fields of an existing car. `--bio ""` regenerates the description.
    Update {
        id: CarId,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long = "year")]
        model_year: Option<i32>,
        #[arg(long)]
        value: Option<Decimal>,
        #[arg(long)]
        bio: Option<String>,
    },
    /// Delete a car.
    Delete { id: CarId },
    /// List all cars.
    List,
    /// Show inventory snapshots, oldest first.
    Snapshots {
        /// Only the most recent snapshot.
        #[arg(long)]
        latest: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    carlot_observability::init(if args.pretty_logs {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    });

    let config = AppConfig::from_env().context("invalid configuration")?;
    let repo = build_inventory(&config).context("failed to initialise inventory")?;

    match args.command {
        Command::Add {
            model,
            brand,
            model_year,
            value,
            bio,
        } => {
            let car = repo.create(NewCar {
                model,
                brand,
                model_year,
                value,
                bio,
            })?;
            info!(car_id = %car.id_typed(), "car added");
            print_json(&car)?;
        }
        Command::Update {
            id,
            model,
            brand,
            model_year,
            value,
            bio,
        } => {
            let changes = CarChanges {
                model,
                brand,
                model_year,
                value,
                bio,
            };
            if changes.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            let car = repo.update(id, changes)?;
            print_json(&car)?;
        }
        Command::Delete { id } => {
            let car = repo.delete(id)?;
            info!(car_id = %car.id_typed(), "car deleted");
            print_json(&car)?;
        }
        Command::List => print_json(&repo.list()?)?,
        Command::Snapshots { latest: true } => print_json(&repo.latest_snapshot()?)?,
        Command::Snapshots { latest: false } => print_json(&repo.list_snapshots()?)?,
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_parses_decimal_value_and_optional_bio() {
        let args = Args::try_parse_from([
            "carlot", "add", "--model", "Civic", "--brand", "Honda", "--year", "2020", "--value",
            "85000.50",
        ])
        .unwrap();

        match args.command {
            Command::Add { value, bio, .. } => {
                assert_eq!(value, Decimal::new(8_500_050, 2));
                assert_eq!(bio, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn delete_requires_a_valid_id() {
        assert!(Args::try_parse_from(["carlot", "delete", "nope"]).is_err());
        let id = CarId::new();
        let raw = id.to_string();
        let args = Args::try_parse_from(["carlot", "delete", raw.as_str()]).unwrap();
        assert!(matches!(args.command, Command::Delete { id: parsed } if parsed == id));
    }

    #[test]
    fn empty_bio_flag_is_kept_as_empty_string() {
        let id = CarId::new().to_string();
        let args = Args::try_parse_from(["carlot", "update", id.as_str(), "--bio", ""]).unwrap();
        match args.command {
            Command::Update { bio, .. } => assert_eq!(bio.as_deref(), Some("")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
