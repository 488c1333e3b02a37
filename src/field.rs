use crate::error::OperationError;
use std::{fmt, str::FromStr};

/// Ethnicity categories in column order.
pub const ETHNICITIES: [&str; 8] = [
    "American Indian and Alaska Native Alone",
    "Asian Alone",
    "Black Alone",
    "Hispanic or Latino",
    "Native Hawaiian and Other Pacific Islander Alone",
    "Two or More Races",
    "White Alone",
    "White Alone, not Hispanic or Latino",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    BachelorsOrHigher,
    HighSchoolOrHigher,
    /// Index into `ETHNICITIES`.
    Ethnicity(usize),
    MedianHouseholdIncome,
    PerCapitaIncome,
    BelowPoverty,
    Population,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::BachelorsOrHigher,
        Field::HighSchoolOrHigher,
        Field::Ethnicity(0),
        Field::Ethnicity(1),
        Field::Ethnicity(2),
        Field::Ethnicity(3),
        Field::Ethnicity(4),
        Field::Ethnicity(5),
        Field::Ethnicity(6),
        Field::Ethnicity(7),
        Field::MedianHouseholdIncome,
        Field::PerCapitaIncome,
        Field::BelowPoverty,
        Field::Population,
    ];

    /// Whether the field is a percentage that can be scaled into a
    /// sub-population.
    pub fn is_sub_population(&self) -> bool {
        use Field::*;

        matches!(
            self,
            BachelorsOrHigher | HighSchoolOrHigher | Ethnicity(_) | BelowPoverty
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Field::*;

        match *self {
            BachelorsOrHigher => f.write_str("Education.Bachelor's Degree or Higher"),
            HighSchoolOrHigher => f.write_str("Education.High School or Higher"),
            Ethnicity(i) => write!(f, "Ethnicities.{}", ETHNICITIES[i]),
            MedianHouseholdIncome => f.write_str("Income.Median Household Income"),
            PerCapitaIncome => f.write_str("Income.Per Capita Income"),
            BelowPoverty => f.write_str("Income.Persons Below Poverty Level"),
            Population => f.write_str("Population"),
        }
    }
}

impl FromStr for Field {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.to_string() == s)
            .ok_or_else(|| OperationError::UnknownField(s.to_string()))
    }
}
