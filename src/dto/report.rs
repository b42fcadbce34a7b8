use serde::Deserialize;
use utoipa::IntoParams;

use crate::events::Side;

/// Side selector shared by the report and benchmark routes.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SideQuery {
    /// `HOME` when omitted.
    #[serde(default)]
    pub side: Option<Side>,
}

impl SideQuery {
    pub fn side(&self) -> Side {
        self.side.unwrap_or(Side::Home)
    }
}
