//! Result data layer
//!
//! An executed `QueryResult` is immutable; profiles and derived views are
//! recomputed from it (and a `FilterSpec`) and never modify it.

pub mod cell_compare;
pub mod column_profile;
pub mod data_exporter;
pub mod filter_spec;
pub mod query_result;
pub mod result_view;

pub use column_profile::{profile, ColumnProfile, ProfileSettings, ResultProfiles};
pub use filter_spec::{FilterSpec, NumericFilter, NumericOperator, SortDirection, SortSpec};
pub use query_result::{CellValue, QueryResult, Row, EMPTY_LABEL};
pub use result_view::{compute_view, DerivedView, ResultView, ViewMemo};
