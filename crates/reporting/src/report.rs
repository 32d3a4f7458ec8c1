//! Report snapshot of one market's funnel: a gross-impressions row followed
//! by one row per stage, plus the headline FTD and efficiency figures.

use chrono::{DateTime, Utc};
use funnel_core::{FunnelParameters, FunnelResult, MarketId, StageKind};
use funnel_engine::FunnelProjection;
use serde::Serialize;
use std::fmt::Write as _;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportRow {
    /// 1-based position in the report.
    pub step: u8,
    pub label: String,
    pub volume: u64,
    /// Rate that produced this row, in percent.
    pub rate: f64,
}

impl ReportRow {
    pub fn rate_label(&self) -> String {
        format!("{}%", self.rate)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReport {
    pub report_id: Uuid,
    pub market: MarketId,
    pub market_name: String,
    pub params: FunnelParameters,
    pub rows: Vec<ReportRow>,
    pub ftds: u64,
    /// Four-decimal percentage, e.g. `"0.0015%"`.
    pub efficiency: String,
    pub generated_at: DateTime<Utc>,
}

impl FunnelReport {
    pub fn build(
        market: MarketId,
        market_name: &str,
        params: &FunnelParameters,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let projection = FunnelProjection::compute(params);

        let mut rows = Vec::with_capacity(6);
        rows.push(ReportRow {
            step: 1,
            label: "Gross Impressions".to_string(),
            volume: params.total_views,
            rate: 100.0,
        });
        for (i, stage) in projection.stages.iter().enumerate() {
            let label = match stage.kind {
                StageKind::Reach => format!("{market_name} Capture"),
                other => other.label().to_string(),
            };
            rows.push(ReportRow {
                step: (i + 2) as u8,
                label,
                volume: stage.output,
                rate: stage.rate,
            });
        }

        let report = Self {
            report_id: Uuid::new_v4(),
            market,
            market_name: market_name.to_string(),
            params: params.clone(),
            rows,
            ftds: projection.ftds,
            efficiency: projection.format_efficiency_percent(),
            generated_at,
        };
        debug!(report_id = %report.report_id, market = %market, "Report built");
        report
    }

    /// `{Market Name}_Optimization_Report_{YYYY-MM-DD}`.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_Optimization_Report_{}",
            self.market_name,
            self.generated_at.format("%Y-%m-%d")
        )
    }

    pub fn to_json_pretty(&self) -> FunnelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::from("step,label,volume,rate\n");
        for row in &self.rows {
            let _ = writeln!(
                csv,
                "{},\"{}\",{},{}",
                row.step,
                row.label.replace('"', "\"\""),
                row.volume,
                row.rate
            );
        }
        csv
    }

    /// Plain aligned table for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} Funnel Logistics", self.market_name);
        let _ = writeln!(out, "Generated {}", self.generated_at.format("%Y-%m-%d %H:%M UTC"));
        let _ = writeln!(out);
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:02}  {:<28} {:>14}  {:>7}",
                row.step,
                row.label,
                row.volume,
                row.rate_label()
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Projected FTDs: {}", self.ftds);
        let _ = writeln!(out, "Conversion efficiency: {}", self.efficiency);
        out
    }
}
