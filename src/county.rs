use crate::{
    error::{Error, RowParseError},
    field::{Field, ETHNICITIES},
};
use log::{debug, info};
use rust_decimal::Decimal;
use std::{fmt, fs::File, io::Read, path::Path, str::FromStr};

pub const MAX_NAME_LEN: usize = 99;
pub const STATE_CODE_LEN: usize = 2;
const INITIAL_CAPACITY: usize = 3200;

/// Column index of each record field in the demographics CSV.
mod column {
    pub const NAME: usize = 0;
    pub const STATE: usize = 1;
    pub const EDUCATION: [usize; 2] = [5, 6];
    pub const ETHNICITY: [usize; 8] = [11, 12, 13, 14, 15, 16, 17, 18];
    pub const INCOME_MEDIAN_HOUSEHOLD: usize = 25;
    pub const INCOME_PER_CAPITA: usize = 26;
    pub const INCOME_BELOW_POVERTY: usize = 27;
    pub const POPULATION: usize = 38;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct County {
    pub name: String,
    pub state: String,
    /// Bachelor's or higher, high school or higher.
    pub education: [Decimal; 2],
    /// Ordered as `field::ETHNICITIES`.
    pub ethnicity: [Decimal; 8],
    pub income_median_household: i64,
    pub income_per_capita: i64,
    pub income_below_poverty: i64,
    pub population: i64,
}

impl County {
    pub fn value(&self, field: Field) -> Decimal {
        use Field::*;

        match field {
            BachelorsOrHigher => self.education[0],
            HighSchoolOrHigher => self.education[1],
            Ethnicity(i) => self.ethnicity[i],
            MedianHouseholdIncome => Decimal::from(self.income_median_household),
            PerCapitaIncome => Decimal::from(self.income_per_capita),
            BelowPoverty => Decimal::from(self.income_below_poverty),
            Population => Decimal::from(self.population),
        }
    }
}

impl TryFrom<&csv::StringRecord> for County {
    type Error = RowParseError;

    fn try_from(record: &csv::StringRecord) -> Result<Self, Self::Error> {
        let cell = |column: usize| {
            record
                .get(column)
                .map(strip_quotes)
                .ok_or(RowParseError::MissingColumn(column))
        };
        let integer = |column: usize| {
            let value = cell(column)?;
            parse_integer(&value).ok_or(RowParseError::InvalidNumber { column, value })
        };
        let percentage = |column: usize| {
            let value = cell(column)?;
            parse_percentage(&value).ok_or(RowParseError::InvalidNumber { column, value })
        };

        let name = cell(column::NAME)?;
        if name.chars().count() > MAX_NAME_LEN {
            return Err(RowParseError::NameTooLong(MAX_NAME_LEN));
        }

        let state = cell(column::STATE)?;
        if state.chars().count() != STATE_CODE_LEN {
            return Err(RowParseError::InvalidStateCode(state));
        }

        let mut education = [Decimal::ZERO; 2];
        for (value, column) in education.iter_mut().zip(column::EDUCATION) {
            *value = percentage(column)?;
        }

        let mut ethnicity = [Decimal::ZERO; 8];
        for (value, column) in ethnicity.iter_mut().zip(column::ETHNICITY) {
            *value = percentage(column)?;
        }

        Ok(County {
            name,
            state,
            education,
            ethnicity,
            income_median_household: integer(column::INCOME_MEDIAN_HOUSEHOLD)?,
            income_per_capita: integer(column::INCOME_PER_CAPITA)?,
            income_below_poverty: integer(column::INCOME_BELOW_POVERTY)?,
            population: integer(column::POPULATION)?,
        })
    }
}

impl fmt::Display for County {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "County: {}, State: {}", self.name, self.state)?;
        writeln!(f, "Population: {}", self.population)?;
        writeln!(f, "Education")?;
        writeln!(
            f,
            "    Bachelor's Degree or Higher: {:.2}",
            self.education[0].round_dp(2)
        )?;
        writeln!(
            f,
            "    High School or Higher: {:.2}",
            self.education[1].round_dp(2)
        )?;
        writeln!(f, "Ethnicity")?;
        for (name, value) in ETHNICITIES.iter().zip(self.ethnicity) {
            writeln!(f, "    {}: {:.2}%", name, value.round_dp(2))?;
        }
        writeln!(f, "Income")?;
        writeln!(
            f,
            "    Income Median Household: {}",
            self.income_median_household
        )?;
        writeln!(f, "    Income Per Capita: {}", self.income_per_capita)?;
        writeln!(f, "    Income Below Poverty: {}", self.income_below_poverty)
    }
}

/// Reads the demographics CSV at `path`, skipping the header row and dropping
/// every row that fails to convert.
pub fn load<P>(path: P) -> Result<Vec<County>, Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let counties = load_from_reader(file)?;

    info!("loaded {} counties from {}", counties.len(), path.display());
    println!("{} entries loaded", counties.len());

    Ok(counties)
}

pub fn load_from_reader<R>(rdr: R) -> Result<Vec<County>, Error>
where
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);

    let mut counties = Vec::new();
    counties.try_reserve_exact(INITIAL_CAPACITY)?;
    let mut rejected = 0;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                debug!("skipping unreadable row: {err}");
                rejected += 1;
                continue;
            }
        };

        match County::try_from(&record) {
            Ok(county) => {
                if counties.len() == counties.capacity() {
                    counties.try_reserve_exact(counties.capacity().max(1))?;
                }
                counties.push(county);
            }
            Err(err) => {
                let line = record.position().map_or(0, |p| p.line());
                debug!("skipping row at line {line}: {err}");
                rejected += 1;
            }
        }
    }

    debug!("{rejected} rows rejected");

    Ok(counties)
}

fn strip_quotes(cell: &str) -> String {
    cell.chars().filter(|&c| c != '"').collect()
}

/// Longest prefix of `s` that looks like a number: an optional sign and
/// digits, then, when `real` is set, an optional `.` fraction and exponent.
fn numeric_prefix(s: &str, real: bool) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };
    let sign_at = |i: usize| usize::from(matches!(bytes.get(i), Some(b'+' | b'-')));

    let mut end = digits_from(sign_at(0));
    if real {
        if bytes.get(end) == Some(&b'.') {
            end = digits_from(end + 1);
        }
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let exponent = end + 1 + sign_at(end + 1);
            let exponent_end = digits_from(exponent);
            if exponent_end > exponent {
                end = exponent_end;
            }
        }
    }

    &s[..end]
}

/// A zero conversion only counts when the cell literally reads `0`.
fn accept<T>(literal: &str, value: T, is_zero: bool) -> Option<T> {
    if is_zero && literal != "0" {
        None
    } else {
        Some(value)
    }
}

fn parse_integer(cell: &str) -> Option<i64> {
    let literal = cell.trim();
    let value = numeric_prefix(literal, false).parse::<i64>().unwrap_or(0);
    accept(literal, value, value == 0)
}

fn parse_percentage(cell: &str) -> Option<Decimal> {
    let literal = cell.trim();
    let value = parse_decimal(literal).unwrap_or(Decimal::ZERO);
    accept(literal, value, value.is_zero())
}

/// Converts the numeric prefix of `text`, ignoring whatever follows it.
/// `None` when `text` does not start with a number or it does not fit.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let prefix = numeric_prefix(text.trim(), true);
    let (mantissa, exponent) = match prefix.split_once(|c: char| c == 'e' || c == 'E') {
        Some((mantissa, exponent)) => (mantissa, Some(exponent.trim_start_matches('+'))),
        None => (prefix, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let (sign, digits) = match whole.strip_prefix(|c: char| c == '+' || c == '-') {
        Some(digits) => (&whole[..1], digits),
        None => ("", whole),
    };
    if digits.is_empty() && fraction.is_empty() {
        return None;
    }

    let digits = if digits.is_empty() { "0" } else { digits };
    let fraction = if fraction.is_empty() { "0" } else { fraction };
    let mantissa = format!("{sign}{digits}.{fraction}");

    match exponent {
        Some(exponent) => Decimal::from_scientific(&format!("{mantissa}e{exponent}")).ok(),
        None => Decimal::from_str(&mantissa).ok(),
    }
}
