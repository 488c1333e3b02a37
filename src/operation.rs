use crate::{
    county::parse_decimal,
    error::{Error, OperationError},
    field::Field,
    store::{Comparison, CountyStore},
};
use log::{info, warn};
use rust_decimal::Decimal;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Display,
    FilterState(String),
    Filter {
        field: String,
        comparison: Comparison,
        value: Decimal,
    },
    PopulationTotal,
    Population(String),
    Percent(String),
}

impl Operation {
    /// Parses one non-empty line of an operations file. `line` is only used
    /// to label errors.
    pub fn parse(line: usize, text: &str) -> Result<Self, OperationError> {
        let syntax = || OperationError::Syntax {
            line,
            text: text.to_string(),
        };

        if text == "display" {
            Ok(Operation::Display)
        } else if text == "population-total" {
            Ok(Operation::PopulationTotal)
        } else if let Some(state) = text.strip_prefix("filter-state:") {
            let state = state.trim();
            if state.chars().count() != 2 {
                return Err(OperationError::InvalidStateCode(state.to_string()));
            }
            Ok(Operation::FilterState(state.to_string()))
        } else if let Some(filter) = text.strip_prefix("filter:") {
            let mut parts = filter.rsplitn(3, ':');
            let (value, comparison, field) = match (parts.next(), parts.next(), parts.next()) {
                (Some(value), Some(comparison), Some(field)) if !field.is_empty() => {
                    (value, comparison, field)
                }
                _ => return Err(syntax()),
            };
            let value = parse_decimal(value).ok_or_else(syntax)?;
            let comparison = comparison.parse::<Comparison>()?;

            Ok(Operation::Filter {
                field: field.to_string(),
                comparison,
                value,
            })
        } else if let Some(field) = text.strip_prefix("population:") {
            Ok(Operation::Population(field.to_string()))
        } else if let Some(field) = text.strip_prefix("percent:") {
            Ok(Operation::Percent(field.to_string()))
        } else {
            Err(OperationError::Unsupported {
                line,
                text: text.to_string(),
            })
        }
    }

    /// Applies the operation to `store`, printing its result.
    pub fn run(&self, store: &mut CountyStore) -> Result<(), OperationError> {
        use Operation::*;

        info!("running {self:?} against {} counties", store.len());

        match self {
            Display => display(store),
            FilterState(state) => {
                let remaining = store.filter_state(state);
                println!("filter: state == {state} ({remaining} entries)");
            }
            Filter {
                field,
                comparison,
                value,
            } => {
                let field = match field.parse::<Field>() {
                    Ok(field) => field,
                    Err(err) => {
                        warn!("filter on unknown field '{field}' removes every county");
                        store.clear();
                        println!(
                            "Filter: {field} {comparison} {:.2} (0 entries)",
                            value.round_dp(2)
                        );
                        return Err(err);
                    }
                };
                let remaining = store.filter_field(field, *comparison, *value);
                println!(
                    "Filter: {field} {comparison} {:.2} ({remaining} entries)",
                    value.round_dp(2)
                );
            }
            PopulationTotal => println!("2014 Population: {}", store.total_population()?),
            Population(name) => {
                let total = match aggregate_field(name) {
                    Some(field) => store.sub_population(field)?,
                    None => Decimal::ZERO,
                };
                println!("2014 {name} population: {:.0}", total.round_dp(0));
            }
            Percent(name) => {
                let percent = match aggregate_field(name) {
                    Some(field) => store.percentage(field)?,
                    None => Decimal::ZERO,
                };
                println!("2014 {name} percentage: {:.2}%", percent.round_dp(2));
            }
        }

        Ok(())
    }
}

/// Resolves a field name for aggregation. Unknown names aggregate to zero.
fn aggregate_field(name: &str) -> Option<Field> {
    match name.parse::<Field>() {
        Ok(field) if field.is_sub_population() => Some(field),
        Ok(field) => {
            warn!("'{field}' has no sub-population, reporting zero");
            None
        }
        Err(err) => {
            warn!("{err}, reporting zero");
            None
        }
    }
}

fn display(store: &CountyStore) {
    if store.is_empty() {
        println!("No counties to display.");
        return;
    }

    for county in store.counties() {
        println!("{county}");
    }
}

/// Runs every line of the operations file at `path` against `store`, in
/// order. Line-level failures are reported on stderr and skipped.
pub fn process_operations<P>(path: P, store: &mut CountyStore) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;

    for (line, bytes) in (1..).zip(BufReader::new(file).split(b'\n')) {
        let result = String::from_utf8(bytes?)
            .map_err(|_| OperationError::InvalidText(line))
            .and_then(|text| {
                let text = text.trim_end();
                if text.trim().is_empty() {
                    return Ok(());
                }
                Operation::parse(line, text).and_then(|op| op.run(store))
            });

        if let Err(err) = result {
            eprintln!("{err}");
        }
    }

    Ok(())
}
