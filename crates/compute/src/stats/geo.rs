//! Country and city attribution from number prefixes.
//!
//! Country attribution uses the raw number. City attribution only looks at
//! native telephony calls (app `"unknown"`): OTT app calls carry no
//! geographic signal and are left out entirely. Their numbers are reduced to
//! the national significant part by stripping `+7` or a trunk `8`.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use callscope_core::{CallRecord, PrefixTable};

/// Country tally key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CountryBucket {
    Country(String),
    /// No prefix matched, or the record has no number.
    Unknown,
}

impl CountryBucket {
    pub const UNKNOWN_LABEL: &'static str = "Unknown";

    pub fn label(&self) -> &str {
        match self {
            CountryBucket::Country(name) => name,
            CountryBucket::Unknown => Self::UNKNOWN_LABEL,
        }
    }
}

impl From<String> for CountryBucket {
    fn from(s: String) -> Self {
        if s == Self::UNKNOWN_LABEL {
            CountryBucket::Unknown
        } else {
            CountryBucket::Country(s)
        }
    }
}

impl From<CountryBucket> for String {
    fn from(b: CountryBucket) -> Self {
        match b {
            CountryBucket::Country(name) => name,
            CountryBucket::Unknown => CountryBucket::UNKNOWN_LABEL.to_string(),
        }
    }
}

impl fmt::Display for CountryBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// City tally key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CityBucket {
    City(String),
    /// A national number with no fixed-line city code.
    MobileCall,
}

impl CityBucket {
    pub const MOBILE_LABEL: &'static str = "mobile_call";

    pub fn label(&self) -> &str {
        match self {
            CityBucket::City(name) => name,
            CityBucket::MobileCall => Self::MOBILE_LABEL,
        }
    }
}

impl From<String> for CityBucket {
    fn from(s: String) -> Self {
        if s == Self::MOBILE_LABEL {
            CityBucket::MobileCall
        } else {
            CityBucket::City(s)
        }
    }
}

impl From<CityBucket> for String {
    fn from(b: CityBucket) -> Self {
        match b {
            CityBucket::City(name) => name,
            CityBucket::MobileCall => CityBucket::MOBILE_LABEL.to_string(),
        }
    }
}

impl fmt::Display for CityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Country bucket for one record.
pub fn country_of(table: &PrefixTable, rec: &CallRecord) -> CountryBucket {
    rec.number()
        .and_then(|number| table.label_for(number))
        .map(|label| CountryBucket::Country(label.to_string()))
        .unwrap_or(CountryBucket::Unknown)
}

/// Strip the country code or trunk prefix from a national number.
pub fn national_number(number: &str) -> Option<&str> {
    number
        .strip_prefix("+7")
        .or_else(|| number.strip_prefix('8'))
}

/// City bucket for one record, `None` when the record is out of scope.
pub fn city_of(table: &PrefixTable, rec: &CallRecord) -> Option<CityBucket> {
    if !rec.is_native() {
        return None;
    }
    let national = national_number(rec.number()?)?;
    Some(match table.label_for(national) {
        Some(city) => CityBucket::City(city.to_string()),
        None => CityBucket::MobileCall,
    })
}

/// Country counts in first-seen order.
#[derive(Debug, Clone)]
pub struct CountryTally<'t> {
    table: &'t PrefixTable,
    counts: IndexMap<CountryBucket, u64>,
}

impl<'t> CountryTally<'t> {
    pub fn new(table: &'t PrefixTable) -> Self {
        Self {
            table,
            counts: IndexMap::new(),
        }
    }

    pub fn observe(&mut self, rec: &CallRecord) {
        *self.counts.entry(country_of(self.table, rec)).or_insert(0) += 1;
    }

    pub fn finish(self) -> IndexMap<CountryBucket, u64> {
        self.counts
    }
}

/// City counts in first-seen order.
#[derive(Debug, Clone)]
pub struct CityTally<'t> {
    table: &'t PrefixTable,
    counts: IndexMap<CityBucket, u64>,
}

impl<'t> CityTally<'t> {
    pub fn new(table: &'t PrefixTable) -> Self {
        Self {
            table,
            counts: IndexMap::new(),
        }
    }

    pub fn observe(&mut self, rec: &CallRecord) {
        if let Some(bucket) = city_of(self.table, rec) {
            *self.counts.entry(bucket).or_insert(0) += 1;
        }
    }

    pub fn finish(self) -> IndexMap<CityBucket, u64> {
        self.counts
    }
}
