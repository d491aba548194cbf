//! Symbol classification: equities, crypto (sigil-prefixed), and OCC-encoded options.

use crate::error::{Error, Result};
use crate::types::Decimal;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The sigil that marks a ticker as a 24/7 crypto asset, e.g. `$BTC`.
pub const CRYPTO_SIGIL: char = '$';

/// An OCC root is left-justified and space-padded to exactly this width.
const OCC_ROOT_WIDTH: usize = 6;
const OCC_STRIKE_DIGITS: usize = 8;
const OCC_TOTAL_LEN: usize = OCC_ROOT_WIDTH + 6 + 1 + OCC_STRIKE_DIGITS;

/// Which market a symbol trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Stock,
    Crypto,
    Option,
}

/// Put or call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    fn as_char(&self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }

    fn from_char(c: char) -> Result<Self> {
        match c {
            'C' => Ok(OptionType::Call),
            'P' => Ok(OptionType::Put),
            other => Err(Error::InvalidOccSymbol(format!(
                "unknown option type char: {}",
                other
            ))),
        }
    }
}

/// The fields encoded in an OCC option symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccSymbol {
    pub root: String,
    pub expiration: NaiveDate,
    pub option_type: OptionType,
    pub strike: Decimal,
}

impl OccSymbol {
    /// Emits the bit-exact 21-character OCC encoding.
    pub fn emit(&self) -> Result<String> {
        if self.root.is_empty() || self.root.len() > OCC_ROOT_WIDTH {
            return Err(Error::InvalidOccSymbol(format!(
                "root must be 1-{} chars: {}",
                OCC_ROOT_WIDTH, self.root
            )));
        }
        let root = format!("{:<width$}", self.root.to_uppercase(), width = OCC_ROOT_WIDTH);
        let date = self.expiration.format("%y%m%d").to_string();
        let strike_thousandths = (self.strike * dec!(1000))
            .round()
            .to_string()
            .parse::<i64>()
            .map_err(|_| Error::InvalidOccSymbol(format!("strike out of range: {}", self.strike)))?;
        if strike_thousandths < 0 || strike_thousandths >= 10i64.pow(OCC_STRIKE_DIGITS as u32) {
            return Err(Error::InvalidOccSymbol(format!(
                "strike does not fit in {} digits: {}",
                OCC_STRIKE_DIGITS, self.strike
            )));
        }
        Ok(format!(
            "{root}{date}{type_char}{strike:0width$}",
            root = root,
            date = date,
            type_char = self.option_type.as_char(),
            strike = strike_thousandths,
            width = OCC_STRIKE_DIGITS
        ))
    }

    /// Parses a bit-exact 21-character OCC encoding.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != OCC_TOTAL_LEN {
            return Err(Error::InvalidOccSymbol(format!(
                "expected {} chars, got {}: {}",
                OCC_TOTAL_LEN,
                s.len(),
                s
            )));
        }
        let root = s[0..OCC_ROOT_WIDTH].trim_end().to_string();
        let date_str = &s[OCC_ROOT_WIDTH..OCC_ROOT_WIDTH + 6];
        let type_char = s[OCC_ROOT_WIDTH + 6..OCC_ROOT_WIDTH + 7]
            .chars()
            .next()
            .ok_or_else(|| Error::InvalidOccSymbol(s.to_string()))?;
        let strike_str = &s[OCC_ROOT_WIDTH + 7..];

        let expiration = NaiveDate::parse_from_str(date_str, "%y%m%d")
            .map_err(|e| Error::InvalidOccSymbol(format!("bad expiration {}: {}", date_str, e)))?;
        let option_type = OptionType::from_char(type_char)?;
        let strike_thousandths: i64 = strike_str
            .parse()
            .map_err(|_| Error::InvalidOccSymbol(format!("bad strike digits: {}", strike_str)))?;
        let strike = Decimal::from(strike_thousandths) / dec!(1000);

        Ok(OccSymbol {
            root,
            expiration,
            option_type,
            strike,
        })
    }
}

/// A trading symbol: an equity ticker, a `$`-prefixed crypto ticker, or a
/// 21-character OCC option encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Parses and classifies a raw symbol string.
    ///
    /// # Examples
    ///
    /// ```
    /// use kernel_core::symbol::{AssetClass, Symbol};
    ///
    /// let crypto = Symbol::new("$BTC").unwrap();
    /// assert_eq!(crypto.asset_class(), AssetClass::Crypto);
    ///
    /// let stock = Symbol::new("AAPL").unwrap();
    /// assert_eq!(stock.asset_class(), AssetClass::Stock);
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(Error::InvalidSymbol("symbol cannot be empty".to_string()));
        }
        // Validate eagerly so a malformed symbol never enters the system.
        let symbol = Self(s);
        if symbol.asset_class() == AssetClass::Option {
            OccSymbol::parse(symbol.occ_body())?;
        }
        Ok(symbol)
    }

    /// Builds a crypto symbol from a bare root, e.g. "BTC" -> "$BTC".
    pub fn crypto(root: impl AsRef<str>) -> Result<Self> {
        Self::new(format!("{CRYPTO_SIGIL}{}", root.as_ref().to_uppercase()))
    }

    /// Builds an OCC-encoded option symbol.
    pub fn option(occ: &OccSymbol) -> Result<Self> {
        Self::new(occ.emit()?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn occ_body(&self) -> &str {
        self.0.as_str()
    }

    pub fn asset_class(&self) -> AssetClass {
        if self.0.starts_with(CRYPTO_SIGIL) {
            AssetClass::Crypto
        } else if self.0.len() > OCC_ROOT_WIDTH {
            AssetClass::Option
        } else {
            AssetClass::Stock
        }
    }

    /// Decodes the OCC fields; fails if this symbol is not an option.
    pub fn occ(&self) -> Result<OccSymbol> {
        if self.asset_class() != AssetClass::Option {
            return Err(Error::InvalidOccSymbol(format!(
                "{} is not an option symbol",
                self.0
            )));
        }
        OccSymbol::parse(&self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
