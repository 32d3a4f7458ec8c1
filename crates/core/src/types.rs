use crate::error::FunnelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Region with its own independently parameterized funnel.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketId {
    /// Switzerland.
    Ch,
    /// Germany.
    De,
    /// United Kingdom.
    Uk,
    /// Romania.
    Ro,
}

impl MarketId {
    pub const ALL: [MarketId; 4] = [MarketId::Ch, MarketId::De, MarketId::Uk, MarketId::Ro];

    pub fn code(self) -> &'static str {
        match self {
            MarketId::Ch => "CH",
            MarketId::De => "DE",
            MarketId::Uk => "UK",
            MarketId::Ro => "RO",
        }
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MarketId {
    type Err = FunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CH" => Ok(MarketId::Ch),
            "DE" => Ok(MarketId::De),
            "UK" => Ok(MarketId::Uk),
            "RO" => Ok(MarketId::Ro),
            _ => Err(FunnelError::UnknownMarket(s.to_string())),
        }
    }
}

/// Named scenario bundle.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Conservative,
    Realistic,
    Optimistic,
}

impl PresetName {
    /// Declaration order; also the tie-break order for active-preset detection.
    pub const ALL: [PresetName; 3] = [
        PresetName::Conservative,
        PresetName::Realistic,
        PresetName::Optimistic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PresetName::Conservative => "conservative",
            PresetName::Realistic => "realistic",
            PresetName::Optimistic => "optimistic",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetName {
    type Err = FunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(PresetName::Conservative),
            "realistic" => Ok(PresetName::Realistic),
            "optimistic" => Ok(PresetName::Optimistic),
            _ => Err(FunnelError::UnknownPreset(s.to_string())),
        }
    }
}

/// The five funnel stages, in chain order.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Segment share of total views.
    Reach,
    /// Profile visits.
    Intent,
    /// Link-in-bio clicks.
    Click,
    /// Registrations.
    Signup,
    /// First-time deposits.
    Ftd,
}

impl StageKind {
    pub const ALL: [StageKind; 5] = [
        StageKind::Reach,
        StageKind::Intent,
        StageKind::Click,
        StageKind::Signup,
        StageKind::Ftd,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Reach => "reach",
            StageKind::Intent => "intent",
            StageKind::Click => "click",
            StageKind::Signup => "signup",
            StageKind::Ftd => "ftd",
        }
    }

    /// Human label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Reach => "Segment Capture",
            StageKind::Intent => "Profile Visits",
            StageKind::Click => "Click Flow",
            StageKind::Signup => "Registrations",
            StageKind::Ftd => "FTD Event (Success)",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = FunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reach" => Ok(StageKind::Reach),
            "intent" => Ok(StageKind::Intent),
            "click" => Ok(StageKind::Click),
            "signup" => Ok(StageKind::Signup),
            "ftd" => Ok(StageKind::Ftd),
            _ => Err(FunnelError::UnknownStage(s.to_string())),
        }
    }
}

/// Funnel inputs for one market. Rates are percentages (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelParameters {
    pub total_views: u64,
    pub target_share: f64,
    pub profile_visit_rate: f64,
    pub link_click_rate: f64,
    pub registration_rate: f64,
    pub ftd_rate: f64,
    /// Carried for the presentation layer; not used by the funnel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revshare_rate: Option<f64>,
    /// Carried for the presentation layer; not used by the funnel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_spend: Option<f64>,
}

impl FunnelParameters {
    pub fn new(
        total_views: u64,
        target_share: f64,
        profile_visit_rate: f64,
        link_click_rate: f64,
        registration_rate: f64,
        ftd_rate: f64,
    ) -> Self {
        Self {
            total_views,
            target_share,
            profile_visit_rate,
            link_click_rate,
            registration_rate,
            ftd_rate,
            revshare_rate: None,
            avg_spend: None,
        }
    }

    /// Rate feeding the given stage.
    pub fn rate(&self, stage: StageKind) -> f64 {
        match stage {
            StageKind::Reach => self.target_share,
            StageKind::Intent => self.profile_visit_rate,
            StageKind::Click => self.link_click_rate,
            StageKind::Signup => self.registration_rate,
            StageKind::Ftd => self.ftd_rate,
        }
    }

    pub fn set_rate(&mut self, stage: StageKind, value: f64) {
        match stage {
            StageKind::Reach => self.target_share = value,
            StageKind::Intent => self.profile_visit_rate = value,
            StageKind::Click => self.link_click_rate = value,
            StageKind::Signup => self.registration_rate = value,
            StageKind::Ftd => self.ftd_rate = value,
        }
    }

    /// Shallow merge: fields present in `patch` replace ours, the rest stay.
    pub fn merge(&mut self, patch: &ParameterPatch) {
        if let Some(v) = patch.total_views {
            self.total_views = v;
        }
        if let Some(v) = patch.target_share {
            self.target_share = v;
        }
        if let Some(v) = patch.profile_visit_rate {
            self.profile_visit_rate = v;
        }
        if let Some(v) = patch.link_click_rate {
            self.link_click_rate = v;
        }
        if let Some(v) = patch.registration_rate {
            self.registration_rate = v;
        }
        if let Some(v) = patch.ftd_rate {
            self.ftd_rate = v;
        }
        if let Some(v) = patch.revshare_rate {
            self.revshare_rate = Some(v);
        }
        if let Some(v) = patch.avg_spend {
            self.avg_spend = Some(v);
        }
    }
}

/// Sparse set of field overrides for [`FunnelParameters`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_share: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_visit_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_click_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftd_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revshare_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_spend: Option<f64>,
}

impl ParameterPatch {
    pub fn views(total_views: u64) -> Self {
        Self {
            total_views: Some(total_views),
            ..Default::default()
        }
    }

    /// Patch touching a single stage rate.
    pub fn rate(stage: StageKind, value: f64) -> Self {
        let mut patch = Self::default();
        match stage {
            StageKind::Reach => patch.target_share = Some(value),
            StageKind::Intent => patch.profile_visit_rate = Some(value),
            StageKind::Click => patch.link_click_rate = Some(value),
            StageKind::Signup => patch.registration_rate = Some(value),
            StageKind::Ftd => patch.ftd_rate = Some(value),
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<FunnelParameters> for ParameterPatch {
    fn from(p: FunnelParameters) -> Self {
        Self {
            total_views: Some(p.total_views),
            target_share: Some(p.target_share),
            profile_visit_rate: Some(p.profile_visit_rate),
            link_click_rate: Some(p.link_click_rate),
            registration_rate: Some(p.registration_rate),
            ftd_rate: Some(p.ftd_rate),
            revshare_rate: p.revshare_rate,
            avg_spend: p.avg_spend,
        }
    }
}
