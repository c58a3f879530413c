use std::fmt;
use tourney::prize::{Cents, PayoutPlace, parse_amount};

/// Errors that can occur while parsing command-line values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a decimal amount with at most two places.
    InvalidAmount(String),
    /// Not a percentage.
    InvalidPercentage(String),
    /// Stack not written as `NAME:CHIPS`.
    InvalidStack(String),
    /// List with no items.
    EmptyList,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAmount(value) => write!(
                f,
                "Invalid amount '{}'. Use a decimal with at most two places (e.g., '5937.50')",
                value
            ),
            Self::InvalidPercentage(value) => {
                write!(f, "Invalid percentage '{}' (e.g., '50' or '12.5')", value)
            }
            Self::InvalidStack(value) => {
                write!(f, "Invalid stack '{}'. Use NAME:CHIPS (e.g., 'alice:45000')", value)
            }
            Self::EmptyList => write!(f, "Expected a comma-separated list"),
        }
    }
}

impl std::error::Error for ParseError {}

fn items(raw: &str) -> Result<Vec<&str>, ParseError> {
    let items: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return Err(ParseError::EmptyList);
    }
    Ok(items)
}

/// Parse a money amount into cents.
pub fn money(raw: &str) -> Result<Cents, ParseError> {
    parse_amount(raw).ok_or_else(|| ParseError::InvalidAmount(raw.to_string()))
}

/// Parse a comma-separated list of amounts.
pub fn money_list(raw: &str) -> Result<Vec<Cents>, ParseError> {
    items(raw)?.into_iter().map(money).collect()
}

/// Parse `50,30,20` into a payout structure for places 1, 2 and 3.
pub fn structure(raw: &str) -> Result<Vec<PayoutPlace>, ParseError> {
    items(raw)?
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            item.parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .map(|p| PayoutPlace::new(idx as u32 + 1, p))
                .ok_or_else(|| ParseError::InvalidPercentage(item.to_string()))
        })
        .collect()
}

/// Parse `alice:45000,bob:30000` into named chip stacks.
pub fn stacks(raw: &str) -> Result<Vec<(String, i64)>, ParseError> {
    items(raw)?
        .into_iter()
        .map(|item| {
            let (name, chips) = item
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidStack(item.to_string()))?;
            let chips = chips
                .trim()
                .parse::<i64>()
                .map_err(|_| ParseError::InvalidStack(item.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ParseError::InvalidStack(item.to_string()));
            }
            Ok((name.to_string(), chips))
        })
        .collect()
}

/// Parse a comma-separated list of names.
pub fn names(raw: &str) -> Result<Vec<String>, ParseError> {
    Ok(items(raw)?.into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money() {
        assert_eq!(money("5937.50"), Ok(593_750));
        assert_eq!(money("100"), Ok(10_000));
        assert_eq!(money("1.234"), Err(ParseError::InvalidAmount("1.234".to_string())));
    }

    #[test]
    fn test_money_list() {
        assert_eq!(money_list("500, 300,200"), Ok(vec![50_000, 30_000, 20_000]));
        assert_eq!(money_list(" , "), Err(ParseError::EmptyList));
    }

    #[test]
    fn test_structure_numbers_places_in_order() {
        let parsed = structure("50,30,20").unwrap();
        assert_eq!(
            parsed,
            vec![
                PayoutPlace::new(1, 50.0),
                PayoutPlace::new(2, 30.0),
                PayoutPlace::new(3, 20.0)
            ]
        );
        assert_eq!(
            structure("50,abc"),
            Err(ParseError::InvalidPercentage("abc".to_string()))
        );
    }

    #[test]
    fn test_stacks() {
        assert_eq!(
            stacks("alice:45000, bob:30000").unwrap(),
            vec![("alice".to_string(), 45_000), ("bob".to_string(), 30_000)]
        );
        assert!(matches!(stacks("alice"), Err(ParseError::InvalidStack(_))));
        assert!(matches!(stacks(":100"), Err(ParseError::InvalidStack(_))));
        assert!(matches!(stacks("bob:lots"), Err(ParseError::InvalidStack(_))));
    }
}
