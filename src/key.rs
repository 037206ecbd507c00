//! Primary key contracts: parsing from a path segment and sequential allocation.

use crate::error::AppError;
use std::fmt::{Debug, Display};

/// Opaque comparable identifier of one resource.
pub trait PrimaryKey: Clone + Ord + Debug + Display + Send + Sync + 'static {
    /// Parse a key from an already percent-decoded path segment.
    fn parse_key(segment: &str) -> Result<Self, AppError>;
}

/// Keys a store can allocate itself, in increasing order.
pub trait Sequential: PrimaryKey {
    fn first() -> Self;
    /// `None` once the key space is exhausted.
    fn successor(&self) -> Option<Self>;
}

macro_rules! int_key {
    ($($t:ty),*) => {
        $(
            impl PrimaryKey for $t {
                fn parse_key(segment: &str) -> Result<Self, AppError> {
                    segment.parse::<$t>().map_err(|e| {
                        AppError::Decoding(format!("invalid key '{}': {}", segment, e))
                    })
                }
            }

            impl Sequential for $t {
                fn first() -> Self {
                    1
                }

                fn successor(&self) -> Option<Self> {
                    self.checked_add(1)
                }
            }
        )*
    };
}

int_key!(i32, i64, u32, u64, usize);

impl PrimaryKey for String {
    fn parse_key(segment: &str) -> Result<Self, AppError> {
        Ok(segment.to_string())
    }
}

impl Sequential for String {
    fn first() -> Self {
        "1".to_string()
    }

    /// Increments the decimal number written in `self`. Non-digit text
    /// restarts the sequence.
    fn successor(&self) -> Option<Self> {
        if self.is_empty() || !self.bytes().all(|b| b.is_ascii_digit()) {
            return Some(Self::first());
        }
        let mut digits = self.clone().into_bytes();
        for d in digits.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                return String::from_utf8(digits).ok();
            }
        }
        digits.insert(0, b'1');
        String::from_utf8(digits).ok()
    }
}
