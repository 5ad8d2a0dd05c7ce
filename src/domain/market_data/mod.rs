//! Market data aggregate: catalog, bars, the backend contract and row normalization.

pub mod catalog;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use catalog::*;
pub use entities::*;
pub use repositories::*;
pub use value_objects::*;
