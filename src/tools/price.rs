//! The `get_el_price` tool offered to the model.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::provider::ToolDefinition;

use super::types::ParameterBuilder;

pub const PRICE_TOOL_NAME: &str = "get_el_price";

/// Swedish electricity bidding areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum PriceArea {
    SE1,
    SE2,
    SE3,
    SE4,
}

/// Declaration of the price lookup tool.
pub fn price_tool() -> ToolDefinition {
    ToolDefinition {
        name: PRICE_TOOL_NAME.to_string(),
        description: "Hämtar timpriser på el (SEK/kWh) för ett svenskt elområde och datum, \
                      med min, max, snitt och aktuellt pris."
            .to_string(),
        parameters: ParameterBuilder::object()
            .string(
                "date",
                "Datum i formatet YYYY-MM-DD. Utelämna för dagens datum.",
                false,
            )
            .string_enum(
                "area",
                "Elområde: SE1 (Luleå), SE2 (Sundsvall), SE3 (Stockholm) eller SE4 (Malmö).",
                PriceArea::iter().map(|area| area.to_string()),
                true,
            )
            .build(),
    }
}
