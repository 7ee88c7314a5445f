//! Counter Values
//!
//! Lets `increment`/`decrement` work on any payload type that can carry an
//! integer.

/// A cache payload that may hold an integer counter.
pub trait CounterValue: Sized {
    /// Returns the integer held by this value, if it is one.
    fn as_counter(&self) -> Option<i64>;

    /// Wraps an integer as a payload.
    fn from_counter(n: i64) -> Self;
}

impl CounterValue for i64 {
    fn as_counter(&self) -> Option<i64> {
        Some(*self)
    }

    fn from_counter(n: i64) -> Self {
        n
    }
}

impl CounterValue for serde_json::Value {
    fn as_counter(&self) -> Option<i64> {
        self.as_i64()
    }

    fn from_counter(n: i64) -> Self {
        serde_json::Value::from(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_counter() {
        assert_eq!(json!(41).as_counter(), Some(41));
        assert_eq!(json!("41").as_counter(), None);
        assert_eq!(json!(1.5).as_counter(), None);
        assert_eq!(serde_json::Value::from_counter(-3), json!(-3));
    }
}
