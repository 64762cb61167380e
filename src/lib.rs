// SearchDash - Cross-filtering analytics over a search-log table

pub mod charts;
pub mod config;
pub mod controller;
pub mod filter;
pub mod index;
pub mod jsonl;
pub mod pager;
pub mod range;
pub mod record;
pub mod render;
pub mod source;
pub mod store;
pub mod words;

// Re-export main types for convenience
pub use charts::{ChartBindings, ChartFrame, RenderSurface};
pub use config::Config;
pub use controller::{Controller, DashboardState, LoadStatus, WordCloud};
pub use filter::{DimensionKey, Filter};
pub use index::{CrossFilter, Dimension, Group};
pub use pager::YearPager;
pub use range::{DateRange, RangeError};
pub use record::{DayOfWeek, RawRow, Record, normalize};
pub use render::TextSurface;
pub use source::{DataSource, MemorySource};
pub use store::SearchLog;
pub use words::WeightedWord;
