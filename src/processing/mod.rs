//! Read-only analysis over cleaned datasets.
//!
//! - [`filter()`]: row filtering by predicate
//! - [`search()`]: case-insensitive substring search across every cell of a row
//! - [`aggregate()`]: whole-column or grouped count/distinct/sum/mean/min/max
//!
//! ## Example: search → aggregate
//!
//! ```rust
//! use rust_data_cleaning::processing::{aggregate, search, AggregateOp};
//! use rust_data_cleaning::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("city", DataType::Utf8),
//!     Field::new("units", DataType::Int64),
//! ]);
//! let ds = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Utf8("Oslo".to_string()), Value::Int64(2)],
//!         vec![Value::Utf8("Lima".to_string()), Value::Int64(5)],
//!         vec![Value::Utf8("Oslo".to_string()), Value::Int64(4)],
//!     ],
//! );
//!
//! let oslo = search(&ds, "oslo");
//! assert_eq!(oslo.row_count(), 2);
//!
//! let totals = aggregate(&ds, &["city"], Some("units"), AggregateOp::Sum).unwrap();
//! assert_eq!(totals.rows[0], vec![Value::Utf8("Oslo".to_string()), Value::Int64(6)]);
//! ```

pub mod aggregate;
pub mod filter;

pub use aggregate::{aggregate, AggregateOp};
pub use filter::{filter, search};
