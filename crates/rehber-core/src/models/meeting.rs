use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by the API for query parameters and record dates.
pub(crate) const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// A counseling meeting record from `/gorusmeler`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    #[serde(rename = "ogrenci_id", default)]
    pub student_id: Option<i64>,
    #[serde(rename = "tarih", default)]
    pub date: Option<String>,
    #[serde(rename = "baslangic_saati", default)]
    pub start_time: Option<String>,
    #[serde(rename = "bitis_saati", default)]
    pub end_time: Option<String>,
    /// Person the counselor met with
    #[serde(rename = "gorusulen_kisi")]
    pub attendee: String,
    #[serde(rename = "kisi_rolu", default)]
    pub attendee_role: Option<String>,
    #[serde(rename = "yakinlik_derecesi", default)]
    pub relationship: Option<String>,
    #[serde(rename = "gorusme_konusu")]
    pub topic: String,
    #[serde(rename = "calisma_alani", default)]
    pub work_area: Option<String>,
    #[serde(rename = "ozet", default)]
    pub summary: Option<String>,
}

impl Meeting {
    /// Parsed meeting date, if present and well-formed.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, API_DATE_FORMAT).ok())
    }

    /// "HH:MM-HH:MM" when both times are known.
    pub fn time_range(&self) -> Option<String> {
        match (&self.start_time, &self.end_time) {
            (Some(start), Some(end)) => Some(format!("{}-{}", start, end)),
            _ => None,
        }
    }
}

/// Body of a create or update request for `/gorusmeler`.
///
/// On create the server requires attendee, topic and both times. On update
/// every field is optional and omitted ones keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeetingInput {
    #[serde(rename = "ogrenci_id", skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(rename = "tarih", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "baslangic_saati", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "bitis_saati", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(rename = "gorusulen_kisi", skip_serializing_if = "Option::is_none")]
    pub attendee: Option<String>,
    #[serde(rename = "kisi_rolu", skip_serializing_if = "Option::is_none")]
    pub attendee_role: Option<String>,
    #[serde(rename = "yakinlik_derecesi", skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(rename = "gorusme_konusu", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(rename = "calisma_alani", skip_serializing_if = "Option::is_none")]
    pub work_area: Option<String>,
    #[serde(rename = "calisma_kategorisi", skip_serializing_if = "Option::is_none")]
    pub work_category: Option<String>,
    #[serde(rename = "hizmet_turu", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    /// Partner institution, if any
    #[serde(rename = "kurum_isbirligi", skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(rename = "gorusme_yeri", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "disiplin_gorusmesi", skip_serializing_if = "Option::is_none")]
    pub disciplinary: Option<bool>,
    #[serde(rename = "adli_sevk", skip_serializing_if = "Option::is_none")]
    pub legal_referral: Option<bool>,
    #[serde(rename = "calisma_yontemi", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(rename = "ozet", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Query filter for listing meetings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub student_id: Option<i64>,
}

impl MeetingFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(from) = self.from {
            params.push(("baslangic", from.format(API_DATE_FORMAT).to_string()));
        }
        if let Some(to) = self.to {
            params.push(("bitis", to.format(API_DATE_FORMAT).to_string()));
        }
        if let Some(id) = self.student_id {
            params.push(("ogrenci_id", id.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meeting_parses_api_record() {
        let json = r#"{
            "id": 3,
            "ogrenci_id": 7,
            "tarih": "2024-03-11",
            "baslangic_saati": "10:00",
            "bitis_saati": "10:40",
            "gorusulen_kisi": "Veli",
            "gorusme_konusu": "Devamsizlik",
            "gorusme_sayisi": 1,
            "adli_sevk": false
        }"#;
        let meeting: Meeting = serde_json::from_str(json).unwrap();
        assert_eq!(meeting.student_id, Some(7));
        assert_eq!(meeting.parsed_date(), NaiveDate::from_ymd_opt(2024, 3, 11));
        assert_eq!(meeting.time_range().as_deref(), Some("10:00-10:40"));
        assert!(meeting.summary.is_none());
    }

    #[test]
    fn test_meeting_filter_query() {
        assert!(MeetingFilter::default().query().is_empty());

        let filter = MeetingFilter {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
            student_id: Some(42),
        };
        assert_eq!(
            filter.query(),
            vec![
                ("baslangic", "2024-01-01".to_string()),
                ("bitis", "2024-01-31".to_string()),
                ("ogrenci_id", "42".to_string()),
            ]
        );
    }

    #[test]
    fn test_meeting_input_serializes_only_set_fields() {
        let input = MeetingInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 11),
            start_time: Some("10:00".to_string()),
            end_time: Some("10:40".to_string()),
            attendee: Some("Veli".to_string()),
            topic: Some("Devamsizlik".to_string()),
            legal_referral: Some(false),
            ..MeetingInput::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            serde_json::json!({
                "tarih": "2024-03-11",
                "baslangic_saati": "10:00",
                "bitis_saati": "10:40",
                "gorusulen_kisi": "Veli",
                "gorusme_konusu": "Devamsizlik",
                "adli_sevk": false
            })
        );
    }
}
