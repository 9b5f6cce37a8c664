//! Line protocol spoken between customers and the shop.
//!
//! Customer → shop: `ORDER`
//! Shop → customer: `SERVED <n>`, `SOLD_OUT`, `QUOTA_REACHED`, `ERROR <reason>`

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::allocation::Unit;

/// Identifier for one customer connection.
///
/// UUID v4 keeps ids unique across reconnects from the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Order,
}

impl FromStr for Request {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        if line.eq_ignore_ascii_case("order") {
            Ok(Self::Order)
        } else {
            Err(ProtocolError::UnknownCommand(line.to_string()))
        }
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Order => f.write_str("ORDER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Served(Unit),
    /// Terminal: the shop will never have another burger.
    SoldOut,
    /// Terminal: this connection has received its share.
    QuotaReached,
    /// The request was not understood; the session continues.
    Error(String),
}

impl FromStr for Response {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (word, rest) = match line.split_once(' ') {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "" => Err(ProtocolError::Empty),
            "SERVED" => rest
                .parse::<u64>()
                .map(|n| Self::Served(Unit::new(n)))
                .map_err(|_| ProtocolError::MalformedResponse(line.to_string())),
            "SOLD_OUT" if rest.is_empty() => Ok(Self::SoldOut),
            "QUOTA_REACHED" if rest.is_empty() => Ok(Self::QuotaReached),
            "ERROR" => Ok(Self::Error(rest.to_string())),
            _ => Err(ProtocolError::MalformedResponse(line.to_string())),
        }
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Served(unit) => write!(f, "SERVED {}", unit.number()),
            Self::SoldOut => f.write_str("SOLD_OUT"),
            Self::QuotaReached => f.write_str("QUOTA_REACHED"),
            Self::Error(reason) => write!(f, "ERROR {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_case_insensitive() {
        assert_eq!("ORDER".parse::<Request>(), Ok(Request::Order));
        assert_eq!("  Order\r".parse::<Request>(), Ok(Request::Order));
        assert_eq!(Request::Order.to_string(), "ORDER");
    }

    #[test]
    fn unknown_request_is_reported() {
        assert_eq!(
            "burger please".parse::<Request>(),
            Err(ProtocolError::UnknownCommand("burger please".to_string()))
        );
        assert_eq!("   ".parse::<Request>(), Err(ProtocolError::Empty));
    }

    #[test]
    fn responses_render_as_lines() {
        assert_eq!(Response::Served(Unit::new(12)).to_string(), "SERVED 12");
        assert_eq!(Response::SoldOut.to_string(), "SOLD_OUT");
        assert_eq!(Response::QuotaReached.to_string(), "QUOTA_REACHED");
        assert_eq!(
            Response::Error("unknown command: x".to_string()).to_string(),
            "ERROR unknown command: x"
        );
    }

    #[test]
    fn responses_parse_from_lines() {
        assert_eq!(
            "SERVED 3".parse::<Response>(),
            Ok(Response::Served(Unit::new(3)))
        );
        assert_eq!("SOLD_OUT".parse::<Response>(), Ok(Response::SoldOut));
        assert_eq!(
            "ERROR bad things".parse::<Response>(),
            Ok(Response::Error("bad things".to_string()))
        );
    }

    #[test]
    fn malformed_responses_are_rejected() {
        assert!(matches!(
            "SERVED many".parse::<Response>(),
            Err(ProtocolError::MalformedResponse(_))
        ));
        assert!(matches!(
            "SOLD_OUT now".parse::<Response>(),
            Err(ProtocolError::MalformedResponse(_))
        ));
        assert!(matches!(
            "HELLO".parse::<Response>(),
            Err(ProtocolError::MalformedResponse(_))
        ));
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }
}
