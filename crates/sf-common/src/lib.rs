//! # sf-ops-common
//!
//! The job model shared by sf-ops adaptors.
//!
//! A job is a list of [`Operation`]s applied in order to a [`State`]. Each
//! operation takes the state by value and returns the next one, recording
//! remote results at the front of [`State::references`]. The state is generic
//! over its session handle `C`, which never leaves the process.
//!
//! Data inside the state is addressed with JSONPath expressions over
//! `{data, references, configuration}`:
//!
//! ```rust,ignore
//! use sf_ops_common::{each, steps, Attr, Attributes};
//!
//! let job = steps![
//!     each("$.data.contacts[*]", create("Contact", Attributes::new()
//!         .with("LastName", Attr::source_value("$.data.lastName")?)
//!         .with("AccountId", Attr::reference(0)))),
//! ];
//! ```

mod attributes;
mod combinators;
mod data_source;
mod error;
pub mod jsonpath;
mod operation;
mod state;

pub use attributes::{expand_references, field, fields, reference, Attr, Attributes, Field};
pub use combinators::{
    array_to_string, combine, data_path, data_value, each, join, last_reference_value, map,
    merge, reference_path, relationship, source, source_value, to_array, Combine, EachOperation,
    MapOperation,
};
pub use data_source::{DataSource, StateFn};
pub use error::{Error, ErrorKind, Result};
pub use jsonpath::JsonPath;
pub use operation::{alter_state, operation, AlterState, BoxedOperation, FnOperation, Operation};
pub use state::{Logger, References, State};
