//! Validated header table for one stream.
//!
//! Field names are stored exactly as received and must already be lower
//! case; HTTP/2 forbids upper-case names on the wire rather than folding them.
//! Repeated names accumulate values in arrival order.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::hpack::Field;

/// Connection-specific field that HTTP/2 forbids (RFC 9113 Section 8.2.2).
pub const CONNECTION: &str = "connection";

/// Field whose value announces the trailer names that will follow the body.
pub const TRAILERS: &str = "trailers";

/// Pseudo-header fields this engine accepts in an initial header block.
const PSEUDO_HEADERS: &[&str] = &[
    ":method",
    ":scheme",
    ":authority",
    ":path",
    ":status",
    ":protocol",
];

/// Names a sender promised to deliver as trailers.
pub type TrailerNames = HashSet<String>;

/// Ordered multimap of header fields with HTTP/2 validation on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    pseudo: Vec<(String, String)>,
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular field.
    ///
    /// Fails for `connection`, for any `:`-prefixed name and for names with
    /// upper-case ASCII letters. Nothing is recorded on failure.
    pub fn add(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        validate_name(name)?;

        let value = value.into();
        match self.index.get(name) {
            Some(&slot) => self.entries[slot].1.push(value),
            None => {
                self.index.insert(name.to_owned(), self.entries.len());
                self.entries.push((name.to_owned(), vec![value]));
            }
        }
        Ok(())
    }

    /// Add a trailer field; `name` must have been announced via `trailers`.
    pub fn add_trailer(
        &mut self,
        declared: &TrailerNames,
        name: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        check_trailer(declared, name)?;
        self.add(name, value)
    }

    /// Add a whole trailer block. Every field is checked before any is
    /// recorded, so a rejected block leaves the table unchanged.
    pub fn add_trailers(
        &mut self,
        declared: &TrailerNames,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<()> {
        let fields: Vec<Field> = fields.into_iter().collect();
        for field in &fields {
            check_trailer(declared, &field.name)?;
        }
        for field in fields {
            self.add(&field.name, field.value)?;
        }
        Ok(())
    }

    /// Add a pseudo-header. Only valid while the initial block is being
    /// read: pseudo-headers must come before every regular field, must be
    /// known, and must not repeat.
    pub fn add_pseudo(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        if !PSEUDO_HEADERS.contains(&name) {
            return Err(Error::header(format!("Invalid pseudo-header {}!", name)));
        }
        if !self.entries.is_empty() {
            return Err(Error::header(format!(
                "Pseudo-header {} after regular header fields!",
                name
            )));
        }
        if self.pseudo(name).is_some() {
            return Err(Error::header(format!("Duplicate pseudo-header {}!", name)));
        }
        self.pseudo.push((name.to_owned(), value.into()));
        Ok(())
    }

    /// All values recorded for `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    /// First value recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn pseudo(&self, name: &str) -> Option<&str> {
        self.pseudo
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of distinct regular field names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Regular fields as `(name, value)` pairs: names in first-seen order,
    /// each name's values in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
    }

    /// Trailer names announced by the `trailers` field, lower-cased.
    /// `None` when no trailers were announced.
    pub fn trailer_names(&self) -> Option<TrailerNames> {
        let values = self.get_all(TRAILERS)?;
        let names: TrailerNames = values
            .iter()
            .flat_map(|value| value.split(|c: char| c == ',' || c.is_ascii_whitespace()))
            .filter(|name| !name.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }
}

fn check_trailer(declared: &TrailerNames, name: &str) -> Result<()> {
    if !declared.contains(name) {
        return Err(Error::header(format!(
            "Cannot add trailer {} as it was not specified in trailers!",
            name
        )));
    }
    validate_name(name)
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        Err(Error::header("Empty header name!"))
    } else if name == CONNECTION {
        Err(Error::header("Connection header is not allowed!"))
    } else if name.starts_with(':') {
        Err(Error::header(format!("Invalid pseudo-header {}!", name)))
    } else if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Err(Error::header(format!(
            "Invalid upper-case characters in header {}!",
            name
        )))
    } else {
        Ok(())
    }
}
