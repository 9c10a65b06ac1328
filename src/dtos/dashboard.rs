use serde::{Deserialize, Serialize};

use super::period::PeriodResponse;
use crate::billing::dashboard::{DashboardSummary, MonthlyVolume};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub period: PeriodResponse,
    #[serde(flatten)]
    pub summary: DashboardSummary,
}

#[derive(Debug, Deserialize)]
pub struct MonthlySoldMilkQuery {
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct MonthlySoldMilkResponse {
    pub year: i32,
    pub months: Vec<MonthlyVolume>,
}
