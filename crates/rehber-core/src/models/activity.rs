use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::meeting::API_DATE_FORMAT;

/// A guidance activity record from `/etkinlikler`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    #[serde(rename = "etkinlik_tarihi")]
    pub date: String,
    #[serde(rename = "calisma_yontemi")]
    pub method: String,
    #[serde(rename = "aciklama")]
    pub description: String,
    #[serde(rename = "hedef_turu")]
    pub target_type: String,
    #[serde(rename = "faaliyet_turu")]
    pub activity_type: String,
    #[serde(rename = "ogretmen_sayisi", default)]
    pub teacher_count: i64,
    #[serde(rename = "veli_sayisi", default)]
    pub parent_count: i64,
    #[serde(rename = "erkek_ogrenci_sayisi", default)]
    pub male_student_count: i64,
    #[serde(rename = "kiz_ogrenci_sayisi", default)]
    pub female_student_count: i64,
}

impl Activity {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, API_DATE_FORMAT).ok()
    }

    /// Total attendance across teachers, parents and students.
    pub fn participant_count(&self) -> i64 {
        self.teacher_count
            .saturating_add(self.parent_count)
            .saturating_add(self.male_student_count)
            .saturating_add(self.female_student_count)
    }
}

/// Body of a create or update request for `/etkinlikler`.
///
/// Date, method, description, target type and activity type are required;
/// unset counts are sent as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityInput {
    #[serde(rename = "etkinlik_tarihi")]
    pub date: NaiveDate,
    #[serde(rename = "calisma_yontemi")]
    pub method: String,
    #[serde(rename = "aciklama")]
    pub description: String,
    #[serde(rename = "hedef_turu")]
    pub target_type: String,
    #[serde(rename = "faaliyet_turu")]
    pub activity_type: String,
    #[serde(rename = "ogretmen_sayisi")]
    pub teacher_count: i64,
    #[serde(rename = "veli_sayisi")]
    pub parent_count: i64,
    #[serde(rename = "diger_katilimci_sayisi")]
    pub other_count: i64,
    #[serde(rename = "erkek_ogrenci_sayisi")]
    pub male_student_count: i64,
    #[serde(rename = "kiz_ogrenci_sayisi")]
    pub female_student_count: i64,
    /// Classes involved, free text
    #[serde(rename = "sinif_bilgisi")]
    pub class_info: String,
    /// Reference number of the official letter, free text
    #[serde(rename = "resmi_yazi_sayisi")]
    pub letter_reference: String,
}

impl ActivityInput {
    pub fn new(
        date: NaiveDate,
        method: impl Into<String>,
        description: impl Into<String>,
        target_type: impl Into<String>,
        activity_type: impl Into<String>,
    ) -> Self {
        Self {
            date,
            method: method.into(),
            description: description.into(),
            target_type: target_type.into(),
            activity_type: activity_type.into(),
            teacher_count: 0,
            parent_count: 0,
            other_count: 0,
            male_student_count: 0,
            female_student_count: 0,
            class_info: String::new(),
            letter_reference: String::new(),
        }
    }
}

/// Query filter for listing activities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ActivityFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(from) = self.from {
            params.push(("baslangic", from.format(API_DATE_FORMAT).to_string()));
        }
        if let Some(to) = self.to {
            params.push(("bitis", to.format(API_DATE_FORMAT).to_string()));
        }
        params
    }
}
