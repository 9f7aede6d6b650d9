//! Business card field schema and extraction records.

use std::convert::Infallible;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder stored in a field that no token matched.
pub const NOT_FOUND: &str = "NA";

/// One of the ten fields every card is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldName {
    Name,
    Designation,
    CompanyName,
    Contact,
    Email,
    Website,
    Address,
    City,
    Pincode,
    State,
}

impl FieldName {
    /// All fields in schema order.
    pub const ALL: [FieldName; 10] = [
        FieldName::Name,
        FieldName::Designation,
        FieldName::CompanyName,
        FieldName::Contact,
        FieldName::Email,
        FieldName::Website,
        FieldName::Address,
        FieldName::City,
        FieldName::Pincode,
        FieldName::State,
    ];

    /// Schema key, e.g. `COMPANY_NAME`.
    pub fn label(self) -> &'static str {
        match self {
            FieldName::Name => "NAME",
            FieldName::Designation => "DESIGNATION",
            FieldName::CompanyName => "COMPANY_NAME",
            FieldName::Contact => "CONTACT",
            FieldName::Email => "EMAIL",
            FieldName::Website => "WEBSITE",
            FieldName::Address => "ADDRESS",
            FieldName::City => "CITY",
            FieldName::Pincode => "PINCODE",
            FieldName::State => "STATE",
        }
    }

    /// Column name in the `extracted_info` table.
    pub fn column(self) -> &'static str {
        match self {
            FieldName::Name => "name",
            FieldName::Designation => "designation",
            FieldName::CompanyName => "company_name",
            FieldName::Contact => "contact",
            FieldName::Email => "email",
            FieldName::Website => "website",
            FieldName::Address => "address",
            FieldName::City => "city",
            FieldName::Pincode => "pincode",
            FieldName::State => "state",
        }
    }

    /// Human-readable heading used in tables.
    pub fn title(self) -> &'static str {
        match self {
            FieldName::Name => "Name",
            FieldName::Designation => "Designation",
            FieldName::CompanyName => "Company Name",
            FieldName::Contact => "Contact",
            FieldName::Email => "Email",
            FieldName::Website => "Website",
            FieldName::Address => "Address",
            FieldName::City => "City",
            FieldName::Pincode => "Pincode",
            FieldName::State => "State",
        }
    }

    /// Position in schema order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured output of one classification run.
///
/// Every field always holds exactly one string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExtractionRecord {
    pub name: String,
    pub designation: String,
    pub company_name: String,
    pub contact: String,
    pub email: String,
    pub website: String,
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub state: String,
}

impl ExtractionRecord {
    /// Build a record by asking for each field's value in schema order.
    pub fn from_fn(mut value_of: impl FnMut(FieldName) -> String) -> Self {
        match Self::try_from_fn(|field| Ok::<_, Infallible>(value_of(field))) {
            Ok(record) => record,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`ExtractionRecord::from_fn`].
    pub fn try_from_fn<E>(
        mut value_of: impl FnMut(FieldName) -> Result<String, E>,
    ) -> Result<Self, E> {
        Ok(Self {
            name: value_of(FieldName::Name)?,
            designation: value_of(FieldName::Designation)?,
            company_name: value_of(FieldName::CompanyName)?,
            contact: value_of(FieldName::Contact)?,
            email: value_of(FieldName::Email)?,
            website: value_of(FieldName::Website)?,
            address: value_of(FieldName::Address)?,
            city: value_of(FieldName::City)?,
            pincode: value_of(FieldName::Pincode)?,
            state: value_of(FieldName::State)?,
        })
    }

    /// Value of a single field.
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Name => &self.name,
            FieldName::Designation => &self.designation,
            FieldName::CompanyName => &self.company_name,
            FieldName::Contact => &self.contact,
            FieldName::Email => &self.email,
            FieldName::Website => &self.website,
            FieldName::Address => &self.address,
            FieldName::City => &self.city,
            FieldName::Pincode => &self.pincode,
            FieldName::State => &self.state,
        }
    }

    /// Iterate `(field, value)` pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldName, &str)> + '_ {
        FieldName::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    /// Whether the field holds the "not found" placeholder.
    pub fn is_missing(&self, field: FieldName) -> bool {
        self.get(field) == NOT_FOUND
    }
}

/// A stored record with its system-generated id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRow {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(flatten)]
    pub record: ExtractionRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_order_matches_index() {
        for (i, field) in FieldName::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
    }

    #[test]
    fn test_serde_uses_schema_keys() {
        let record = ExtractionRecord::from_fn(|field| field.column().to_string());
        let json = serde_json::to_value(&record).unwrap();

        for field in FieldName::ALL {
            assert_eq!(json[field.label()], field.column());
        }
    }

    #[test]
    fn test_fields_iterates_in_schema_order() {
        let record = ExtractionRecord::from_fn(|field| field.label().to_lowercase());
        let keys: Vec<FieldName> = record.fields().map(|(f, _)| f).collect();
        assert_eq!(keys, FieldName::ALL.to_vec());
        assert_eq!(record.get(FieldName::CompanyName), "company_name");
    }

    #[test]
    fn test_persisted_row_flattens_record() {
        let row = PersistedRow {
            id: 7,
            record: ExtractionRecord::from_fn(|_| NOT_FOUND.to_string()),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["ID"], 7);
        assert_eq!(json["STATE"], "NA");
    }

    #[test]
    fn test_is_missing_only_for_placeholder() {
        let record = ExtractionRecord::from_fn(|field| match field {
            FieldName::Name => "Jane Doe".to_string(),
            FieldName::Contact => String::new(),
            _ => NOT_FOUND.to_string(),
        });
        assert!(!record.is_missing(FieldName::Name));
        assert!(!record.is_missing(FieldName::Contact));
        assert!(record.is_missing(FieldName::Email));
    }
}
