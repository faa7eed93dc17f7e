use serde::{Deserialize, Serialize};

/// Aggregate counters returned by `/dashboard/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(rename = "ogrenci_sayisi", default)]
    pub student_count: i64,
    #[serde(rename = "bu_ay_gorusme_sayisi", default)]
    pub meetings_this_month: i64,
    #[serde(rename = "bu_ay_etkinlik_sayisi", default)]
    pub activities_this_month: i64,
    /// Average progress across students, as a percentage.
    #[serde(rename = "ortalama_ilerleme", default)]
    pub average_progress: f64,
}
