use crate::error::ValidationError;
use crate::model::{Amount, MAX_AMOUNT, MAX_SIGNIFICANT_DIGITS};
use chrono::NaiveDate;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// Dates are stored and entered as `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Months are keyed as `YYYY-MM`.
pub const MONTH_FORMAT: &str = "%Y-%m";

/// The bucket used for expenses that have no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The category shown for income, which never has one.
pub const NOT_APPLICABLE: &str = "N/A";

/// Whether a transaction is money coming in or going out.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(Kind);
serde_plain::derive_fromstr_from_deserialize!(Kind);

impl Kind {
    /// The capitalized label used in tables.
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Income => "Income",
            Kind::Expense => "Expense",
        }
    }
}

/// The durable key of a transaction. It is assigned when the transaction is created and never
/// changes. An empty id only exists transiently, for records read from documents that predate ids.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single income or expense record, exactly as it is persisted.
///
/// Every field has a default so that incomplete records from older documents still load. Such
/// records are kept verbatim; read operations treat an unparsable `date` as "no date".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "lenient_id")]
    pub(crate) id: TransactionId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) amount: Amount,
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) date: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) category: Option<String>,
}

/// Reads a text field of a stored record without failing the whole document. Numbers and
/// booleans keep their text, `null` becomes `None` and nested values are dropped.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    deserializer.deserialize_any(TextVisitor)
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TransactionId, D::Error> {
    Ok(TransactionId(lenient_string(deserializer)?))
}

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        lenient_text(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        warn!("Ignoring a list where a stored transaction has text");
        Ok(None)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        warn!("Ignoring an object where a stored transaction has text");
        Ok(None)
    }
}

impl Transaction {
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The date exactly as stored.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the date if it is a valid `YYYY-MM-DD` calendar date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    /// Returns the `YYYY-MM` month of the transaction, if its date is valid.
    pub fn month(&self) -> Option<String> {
        self.parsed_date()
            .map(|d| d.format(MONTH_FORMAT).to_string())
    }

    /// The category used when grouping expenses, `Uncategorized` when there is none.
    pub fn category_or_uncategorized(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }
}

/// A transaction as entered by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: Kind,
    pub description: String,
    pub amount: String,
    pub date: String,
    pub category: Option<String>,
}

impl NewTransaction {
    pub fn income(
        description: impl Into<String>,
        amount: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            kind: Kind::Income,
            description: description.into(),
            amount: amount.into(),
            date: date.into(),
            category: None,
        }
    }

    pub fn expense(
        description: impl Into<String>,
        amount: impl Into<String>,
        date: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            kind: Kind::Expense,
            description: description.into(),
            amount: amount.into(),
            date: date.into(),
            category: Some(category.into()),
        }
    }

    /// Checks the input rules in order and builds the record with a fresh id. The first rule that
    /// fails is returned.
    pub fn validate(self) -> Result<Transaction, ValidationError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        let raw_amount = self.amount.trim();
        let amount = Amount::from_str(raw_amount)
            .map_err(|_| ValidationError::InvalidAmount(raw_amount.to_string()))?;
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(raw_amount.to_string()));
        }
        if amount > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge(raw_amount.to_string()));
        }
        if amount.significant_digits() > MAX_SIGNIFICANT_DIGITS {
            return Err(ValidationError::TooPrecise(raw_amount.to_string()));
        }

        let date = self.date.trim();
        if NaiveDate::parse_from_str(date, DATE_FORMAT).is_err() {
            return Err(ValidationError::InvalidDate(date.to_string()));
        }

        let category = match self.kind {
            Kind::Income => None,
            Kind::Expense => match self.category.as_deref().map(str::trim) {
                Some(crate::filter::ALL) => return Err(ValidationError::ReservedCategory),
                Some(c) if !c.is_empty() => Some(c.to_string()),
                _ => return Err(ValidationError::MissingCategory),
            },
        };

        Ok(Transaction {
            id: TransactionId::generate(),
            description: description.to_string(),
            amount,
            date: date.to_string(),
            category,
        })
    }
}
