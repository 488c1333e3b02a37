use crate::{county::County, error::OperationError, field::Field};
use rust_decimal::Decimal;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Ge,
    Le,
}

impl Comparison {
    pub fn holds(&self, lhs: Decimal, rhs: Decimal) -> bool {
        match self {
            Comparison::Ge => lhs >= rhs,
            Comparison::Le => lhs <= rhs,
        }
    }
}

impl FromStr for Comparison {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ge" => Ok(Comparison::Ge),
            "le" => Ok(Comparison::Le),
            _ => Err(OperationError::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Ge => f.write_str("ge"),
            Comparison::Le => f.write_str("le"),
        }
    }
}

/// The counties still in play. Filters only ever narrow it.
#[derive(Debug, Default)]
pub struct CountyStore {
    counties: Vec<County>,
}

impl CountyStore {
    pub fn new(counties: Vec<County>) -> Self {
        Self { counties }
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }

    pub fn counties(&self) -> &[County] {
        &self.counties
    }

    /// Keeps the counties matching `predicate`, in their current order, and
    /// returns how many remain.
    pub fn retain<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&County) -> bool,
    {
        let counties = std::mem::take(&mut self.counties);
        self.counties = counties.into_iter().filter(|c| predicate(c)).collect();
        self.counties.len()
    }

    pub fn clear(&mut self) {
        self.counties.clear();
    }

    pub fn filter_state(&mut self, state: &str) -> usize {
        self.retain(|county| county.state == state)
    }

    pub fn filter_field(&mut self, field: Field, comparison: Comparison, value: Decimal) -> usize {
        self.retain(|county| comparison.holds(county.value(field), value))
    }

    pub fn total_population(&self) -> Result<i64, OperationError> {
        self.counties
            .iter()
            .try_fold(0i64, |total, county| total.checked_add(county.population))
            .ok_or_else(|| OperationError::Overflow("total population".to_string()))
    }

    /// Sum over all counties of `(field / 100) * population`. Fields outside
    /// the percentage subset contribute nothing.
    pub fn sub_population(&self, field: Field) -> Result<Decimal, OperationError> {
        if !field.is_sub_population() {
            return Ok(Decimal::ZERO);
        }

        self.counties
            .iter()
            .try_fold(Decimal::ZERO, |total, county| {
                let share = county
                    .value(field)
                    .checked_div(Decimal::ONE_HUNDRED)?
                    .checked_mul(Decimal::from(county.population))?;
                total.checked_add(share)
            })
            .ok_or_else(|| OperationError::Overflow(format!("{field} population")))
    }

    /// Share of the total population in `field`, as a percentage. Zero when
    /// there is no population at all.
    pub fn percentage(&self, field: Field) -> Result<Decimal, OperationError> {
        let total = self.total_population()?;
        if total == 0 {
            return Ok(Decimal::ZERO);
        }

        self.sub_population(field)?
            .checked_div(Decimal::from(total))
            .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| OperationError::Overflow(format!("{field} percentage")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn county(name: &str, state: &str, population: i64, bachelors: i64) -> County {
        County {
            name: name.to_string(),
            state: state.to_string(),
            education: [Decimal::from(bachelors), Decimal::from(80)],
            ethnicity: [Decimal::from(10); 8],
            income_median_household: 40000,
            income_per_capita: 20000,
            income_below_poverty: 15,
            population,
        }
    }

    fn store() -> CountyStore {
        CountyStore::new(vec![
            county("Alameda", "CA", 10, 50),
            county("Travis", "TX", 20, 25),
            county("Kern", "CA", 30, 10),
        ])
    }

    fn names(store: &CountyStore) -> Vec<&str> {
        store.counties().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn filter_state_keeps_order() {
        let mut store = store();

        assert_eq!(store.filter_state("CA"), 2);
        assert_eq!(names(&store), ["Alameda", "Kern"]);
    }

    #[test]
    fn filter_state_is_exact() {
        let mut store = store();

        assert_eq!(store.filter_state("ca"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn filter_field_ge() {
        let mut store = store();

        assert_eq!(
            store.filter_field(Field::Population, Comparison::Ge, Decimal::from(20)),
            2
        );
        assert_eq!(names(&store), ["Travis", "Kern"]);
    }

    #[test]
    fn filter_field_le() {
        let mut store = store();

        assert_eq!(
            store.filter_field(Field::BachelorsOrHigher, Comparison::Le, Decimal::from(25)),
            2
        );
        assert_eq!(names(&store), ["Travis", "Kern"]);
    }

    #[test]
    fn filter_field_is_idempotent() {
        let mut store = store();
        let threshold = Decimal::from(15);

        let first = store.filter_field(Field::Population, Comparison::Ge, threshold);
        let after_first = store.counties().to_vec();
        let second = store.filter_field(Field::Population, Comparison::Ge, threshold);

        assert_eq!(first, second);
        assert_eq!(store.counties(), after_first.as_slice());
    }

    #[test]
    fn filter_then_total_matches_manual_sum() {
        let mut store = store();
        let expected: i64 = store
            .counties()
            .iter()
            .filter(|c| c.education[0] >= Decimal::from(25))
            .map(|c| c.population)
            .sum();

        store.filter_field(Field::BachelorsOrHigher, Comparison::Ge, Decimal::from(25));

        assert_eq!(store.total_population(), Ok(expected));
    }

    #[test]
    fn total_population() {
        assert_eq!(store().total_population(), Ok(60));
        assert_eq!(CountyStore::default().total_population(), Ok(0));
    }

    #[test]
    fn total_population_beyond_32_bits() {
        let store = CountyStore::new(vec![
            county("A", "CA", i64::from(i32::MAX), 0),
            county("B", "CA", i64::from(i32::MAX), 0),
        ]);

        assert_eq!(store.total_population(), Ok(2 * i64::from(i32::MAX)));
    }

    #[test]
    fn sub_population_scales_percentages() {
        // 10 * 50% + 20 * 25% + 30 * 10%
        assert_eq!(store().sub_population(Field::BachelorsOrHigher), Ok(Decimal::from(13)));
        assert_eq!(store().sub_population(Field::Ethnicity(2)), Ok(Decimal::from(6)));
        assert_eq!(store().sub_population(Field::BelowPoverty), Ok(Decimal::from(9)));
    }

    #[test]
    fn sub_population_outside_subset_is_zero() {
        assert_eq!(store().sub_population(Field::Population), Ok(Decimal::ZERO));
        assert_eq!(store().sub_population(Field::PerCapitaIncome), Ok(Decimal::ZERO));
    }

    #[test]
    fn percentage() {
        let percent = store().percentage(Field::Ethnicity(0)).unwrap();
        assert_eq!(percent.round_dp(2), Decimal::from(10));
    }

    #[test]
    fn percentage_of_empty_store_is_zero() {
        assert_eq!(
            CountyStore::default().percentage(Field::BachelorsOrHigher),
            Ok(Decimal::ZERO)
        );
    }

    #[test]
    fn total_population_overflow_is_an_error() {
        let store = CountyStore::new(vec![
            county("A", "CA", i64::MAX, 0),
            county("B", "CA", 1, 0),
        ]);

        assert_eq!(
            store.total_population(),
            Err(OperationError::Overflow("total population".to_string()))
        );
        assert!(store.percentage(Field::BachelorsOrHigher).is_err());
    }

    #[test]
    fn sub_population_overflow_is_an_error() {
        let mut huge = county("A", "CA", 100_000_000, 0);
        huge.education[0] = Decimal::from_str("1000000000000000000000000").unwrap();
        let store = CountyStore::new(vec![huge, county("B", "CA", 10, 50)]);

        assert_eq!(
            store.sub_population(Field::BachelorsOrHigher),
            Err(OperationError::Overflow(
                "Education.Bachelor's Degree or Higher population".to_string()
            ))
        );
        assert!(store.percentage(Field::BachelorsOrHigher).is_err());
        assert_eq!(store.total_population(), Ok(100_000_010));
    }

    #[test]
    fn percentage_overflow_is_an_error() {
        // A negative population is stored as-is, so the share can exceed 100%.
        let mut huge = county("A", "CA", 2, 0);
        huge.education[0] = Decimal::MAX;
        let store = CountyStore::new(vec![huge, county("B", "CA", -1, 0)]);

        assert!(store.sub_population(Field::BachelorsOrHigher).is_ok());
        assert!(store.percentage(Field::BachelorsOrHigher).is_err());
    }

    #[test]
    fn comparison_parsing() {
        assert_eq!("ge".parse::<Comparison>(), Ok(Comparison::Ge));
        assert_eq!("le".parse::<Comparison>(), Ok(Comparison::Le));
        assert_eq!(
            "gt".parse::<Comparison>(),
            Err(OperationError::UnknownOperator("gt".to_string()))
        );
    }
}
