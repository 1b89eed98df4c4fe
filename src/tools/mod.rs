//! Tool declarations offered to the model.

pub mod price;
pub mod types;

pub use price::{price_tool, PriceArea, PRICE_TOOL_NAME};
pub use types::ParameterBuilder;
